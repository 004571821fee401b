//! Content-addressed resource diffing.
//!
//! The service stores file content by `(fingerprint, size)` regardless of
//! which application uploaded it. Only local files whose pair is unknown to
//! the service need to travel; the rest are referenced by fingerprint.

use std::collections::{BTreeSet, HashSet};

use launchpad_core::{BundleEntry, ResourceDescriptor};

/// Files that must be transferred, plus the ones the service already has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub uploads: Vec<BundleEntry>,
    pub reused: Vec<BundleEntry>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    pub fn upload_bytes(&self) -> u64 {
        self.uploads.iter().map(|e| e.size).sum()
    }

    pub fn reused_bytes(&self) -> u64 {
        self.reused.iter().map(|e| e.size).sum()
    }
}

/// Distinct descriptors for the regular files among `entries`, in a stable order.
///
/// This is the payload of the single known-resource query.
pub fn descriptors<'a>(entries: impl IntoIterator<Item = &'a BundleEntry>) -> Vec<ResourceDescriptor> {
    entries
        .into_iter()
        .filter(|e| !e.is_link())
        .map(BundleEntry::descriptor)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Split `local` into files to upload and files already stored remotely.
///
/// Symbolic links are neither: they are shipped as links by the packager.
pub fn diff<'a>(
    local: impl IntoIterator<Item = &'a BundleEntry>,
    known_remote: &HashSet<ResourceDescriptor>,
) -> UpdatePlan {
    let mut plan = UpdatePlan::default();
    for entry in local.into_iter().filter(|e| !e.is_link()) {
        if known_remote.contains(&entry.descriptor()) {
            plan.reused.push(entry.clone());
        } else {
            plan.uploads.push(entry.clone());
        }
    }
    tracing::debug!(
        "resource diff: {} to upload, {} reused",
        plan.uploads.len(),
        plan.reused.len()
    );
    plan
}

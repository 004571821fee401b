//! Upload package builder.
//!
//! Layout of the gzip-compressed tar archive:
//!
//! ```text
//! resources.json     every regular file as { path, fingerprint, size }
//! app/<path>         content of each file in the update plan
//! app/<path>         each symbolic link, stored as a link
//! ```
//!
//! Files the service already stores appear only in `resources.json`; the
//! service reassembles them from its own content store.

use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use launchpad_core::LocalBundle;

use crate::error::{io_err, SyncError};
use crate::resource_diff::UpdatePlan;

/// Archive path of the fingerprint manifest.
pub const MANIFEST_NAME: &str = "resources.json";

/// Archive directory holding bundle content.
pub const CONTENT_PREFIX: &str = "app";

/// One line of the fingerprint manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub path: PathBuf,
    pub fingerprint: String,
    pub size: u64,
}

/// A ready-to-send upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPackage {
    pub manifest: Vec<ResourceRef>,
    /// `.tar.gz` bytes.
    pub archive: Vec<u8>,
    pub files_included: usize,
    pub links_included: usize,
}

impl UploadPackage {
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

/// Package `plan` from `bundle`.
///
/// An empty plan still yields an archive carrying the manifest.
pub fn build(bundle: &LocalBundle, plan: &UpdatePlan) -> Result<UploadPackage, SyncError> {
    let manifest: Vec<ResourceRef> = bundle
        .files()
        .map(|e| ResourceRef {
            path: e.path.clone(),
            fingerprint: e.fingerprint.clone(),
            size: e.size,
        })
        .collect();

    let archive_err = |e: std::io::Error| io_err("<upload archive>", e);

    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    builder.follow_symlinks(false);

    let manifest_json = serde_json::to_vec_pretty(&manifest)?;
    let mut header = tar::Header::new_gnu();
    header.set_size(manifest_json.len() as u64);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, MANIFEST_NAME, manifest_json.as_slice())
        .map_err(archive_err)?;

    for entry in &plan.uploads {
        let source = bundle.root().join(&entry.path);
        builder
            .append_path_with_name(&source, content_path(&entry.path))
            .map_err(|e| io_err(&source, e))?;
    }

    let mut links_included = 0;
    for link in bundle.links() {
        let Some(target) = &link.link_target else {
            continue;
        };
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_mode(0o777);
        builder
            .append_link(&mut header, content_path(&link.path), target)
            .map_err(|e| io_err(&link.path, e))?;
        links_included += 1;
    }

    let encoder = builder.into_inner().map_err(archive_err)?;
    let archive = encoder.finish().map_err(archive_err)?;

    tracing::debug!(
        "packaged {} files, {} links, {} manifest entries ({} bytes)",
        plan.uploads.len(),
        links_included,
        manifest.len(),
        archive.len()
    );

    Ok(UploadPackage {
        manifest,
        archive,
        files_included: plan.uploads.len(),
        links_included,
    })
}

fn content_path(relative: &Path) -> PathBuf {
    Path::new(CONTENT_PREFIX).join(relative)
}

//! Environment-variable propagation and editing.
//!
//! ## `clone_environment` — refresh-then-write loop
//!
//! 1. Read the source. An empty environment stops here.
//! 2. Read the target once as a baseline.
//! 3. For each source key, in order: merge that one key into the latest
//!    target snapshot, write the snapshot back, then re-read the target.
//! 4. Return the last read.
//!
//! Target reads therefore equal target writes plus one. Each write starts
//! from the state committed by the previous write of the same loop; writers
//! outside the loop can still interleave between a read and the next write.

use launchpad_core::{AppManifest, AppName};

use crate::client::HostingClient;
use crate::error::SyncError;

/// Copy every environment entry of `source` onto `target`.
///
/// Target-only keys are left untouched. Returns the target manifest as read
/// after the final write.
pub fn clone_environment<C: HostingClient + ?Sized>(
    client: &C,
    source: &AppName,
    target: &AppName,
) -> Result<AppManifest, SyncError> {
    let origin = client.get_app(source)?;
    if origin.env.is_empty() {
        return Err(SyncError::NoEnvironmentVariablesToClone {
            app: source.to_string(),
        });
    }

    let mut current = client.get_app(target)?;
    for (key, value) in origin.env.iter() {
        current.env.set(key, value);
        client.replace_app(target, &current)?;
        tracing::debug!("cloned {key} from '{source}' to '{target}'");
        current = client.get_app(target)?;
    }

    tracing::info!(
        "cloned {} environment variables from '{}' to '{}'",
        origin.env.len(),
        source,
        target
    );
    Ok(current)
}

/// Set a single variable on `app` with one read and one write.
pub fn set_var<C: HostingClient + ?Sized>(
    client: &C,
    app: &AppName,
    key: &str,
    value: &str,
) -> Result<AppManifest, SyncError> {
    let mut manifest = client.get_app(app)?;
    manifest.env.set(key, value);
    let updated = client.replace_app(app, &manifest)?;
    tracing::info!("set {key} on '{app}'");
    Ok(updated)
}

/// Remove a single variable from `app`. Unknown keys are an error and cause no write.
pub fn unset_var<C: HostingClient + ?Sized>(
    client: &C,
    app: &AppName,
    key: &str,
) -> Result<AppManifest, SyncError> {
    let mut manifest = client.get_app(app)?;
    if manifest.env.remove(key).is_none() {
        return Err(SyncError::UnknownEnvironmentVariable {
            app: app.to_string(),
            key: key.to_string(),
        });
    }
    let updated = client.replace_app(app, &manifest)?;
    tracing::info!("unset {key} on '{app}'");
    Ok(updated)
}

/// Split `KEY=value` as typed on the command line.
pub fn parse_assignment(raw: &str) -> Option<(&str, &str)> {
    let (key, value) = raw.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

//! Bundle containment check.
//!
//! Every entry must resolve to a location inside the bundle root. A link is
//! resolved the way the OS resolves it, one path component at a time,
//! starting from the canonical bundle root:
//!
//! - `.` is skipped and `..` pops the part resolved so far, which is always
//!   a real directory, never a link.
//! - A component naming a link is replaced by the link's target, relative
//!   targets against the directory holding that link, absolute ones from `/`.
//!   Every link followed, the entry itself included, costs one hop.
//! - Once a component does not exist the rest of the target is applied
//!   lexically, so a dangling link is judged by where it would point.
//!
//! More than [`MAX_LINK_DEPTH`] hops is [`SyncError::LinkCycleDetected`].
//! The check reads the filesystem but never writes to it.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use launchpad_core::BundleEntry;

use crate::error::{io_err, SyncError};

/// Maximum number of link hops followed for a single entry.
pub const MAX_LINK_DEPTH: usize = 40;

/// Fail on the first entry, in slice order, that escapes `root`.
pub fn validate(root: &Path, entries: &[BundleEntry]) -> Result<(), SyncError> {
    let canonical_root = std::fs::canonicalize(root).map_err(|e| io_err(root, e))?;

    for entry in entries {
        let escapes = match &entry.link_target {
            None => escapes_lexically(&entry.path),
            Some(target) => {
                let resolved = resolve_link(&canonical_root, &entry.path, target)?;
                tracing::debug!("resolved {} -> {}", entry.path.display(), resolved.display());
                !resolved.starts_with(&canonical_root)
            }
        };
        if escapes {
            tracing::warn!("containment violation: {}", entry.path.display());
            return Err(SyncError::ContainmentViolation {
                path: entry.path.clone(),
            });
        }
    }
    Ok(())
}

/// Absolute location reached by the link at `root/relative`, whose target is `target`.
fn resolve_link(root: &Path, relative: &Path, target: &Path) -> Result<PathBuf, SyncError> {
    let cycle = || SyncError::LinkCycleDetected {
        path: relative.to_path_buf(),
    };

    let mut resolved = root.to_path_buf();
    let mut rest = relative
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(target);
    let mut hops = 1;
    let mut missing = false;

    loop {
        let mut components = rest.components();
        let Some(component) = components.next() else {
            return Ok(resolved);
        };
        let remaining = components.as_path().to_path_buf();
        let mut redirect = None;

        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::RootDir | Component::Prefix(_) => resolved.push(component.as_os_str()),
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                if missing {
                    resolved = candidate;
                } else {
                    match std::fs::symlink_metadata(&candidate) {
                        Ok(meta) if meta.file_type().is_symlink() => {
                            hops += 1;
                            if hops > MAX_LINK_DEPTH {
                                return Err(cycle());
                            }
                            let next = std::fs::read_link(&candidate)
                                .map_err(|e| io_err(&candidate, e))?;
                            redirect = Some(next);
                        }
                        Ok(_) => resolved = candidate,
                        Err(e) if is_dangling(&e) => {
                            missing = true;
                            resolved = candidate;
                        }
                        Err(e) if is_loop_error(&e) => return Err(cycle()),
                        Err(e) => return Err(io_err(&candidate, e)),
                    }
                }
            }
        }

        rest = match redirect {
            Some(next) => next.join(remaining),
            None => remaining,
        };
    }
}

/// A non-link entry escapes only if its relative path does.
fn escapes_lexically(relative: &Path) -> bool {
    relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// The component does not exist, or something before it is not a directory.
fn is_dangling(e: &std::io::Error) -> bool {
    e.kind() == ErrorKind::NotFound || is_not_dir_error(e)
}

#[cfg(unix)]
fn is_loop_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(unix)]
fn is_not_dir_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(libc::ENOTDIR)
}

#[cfg(not(unix))]
fn is_loop_error(_e: &std::io::Error) -> bool {
    false
}

#[cfg(not(unix))]
fn is_not_dir_error(_e: &std::io::Error) -> bool {
    false
}

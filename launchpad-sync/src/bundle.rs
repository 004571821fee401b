//! Local bundle scanning and content fingerprinting.
//!
//! The walk never follows symbolic links: a link is recorded with its raw
//! target and its destination is not read. Regular files get a SHA-256 hex
//! fingerprint computed by streaming the content.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use launchpad_core::{BundleEntry, LocalBundle};

use crate::error::{io_err, SyncError};

/// Directory names never shipped with a bundle.
const IGNORED_DIRS: &[&str] = &[".git", ".svn", ".hg"];

/// Scan `root` into a [`LocalBundle`] sorted by relative path.
pub fn scan(root: &Path) -> Result<LocalBundle, SyncError> {
    let meta = std::fs::metadata(root).map_err(|e| io_err(root, e))?;
    if !meta.is_dir() {
        return Err(SyncError::InvalidBundle {
            path: root.to_path_buf(),
            reason: "not a directory".into(),
        });
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && IGNORED_DIRS.iter().any(|d| e.file_name() == *d))
        });

    let mut entries = Vec::new();
    for item in walker {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            io_err(path, e.into())
        })?;
        let path = item.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let file_type = item.file_type();

        if file_type.is_symlink() {
            let target = std::fs::read_link(path).map_err(|e| io_err(path, e))?;
            tracing::debug!("link: {} -> {}", relative.display(), target.display());
            entries.push(BundleEntry::link(relative, target));
        } else if file_type.is_file() {
            let size = item.metadata().map_err(|e| io_err(path, e.into()))?.len();
            let fingerprint = fingerprint_file(path)?;
            entries.push(BundleEntry::file(relative, size, fingerprint));
        } else if !file_type.is_dir() {
            tracing::debug!("skipping special file: {}", relative.display());
        }
    }

    Ok(LocalBundle::new(root, entries))
}

/// SHA-256 of a file's content, hex encoded.
pub fn fingerprint_file(path: &Path) -> Result<String, SyncError> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buffer = [0u8; 8192];
    loop {
        let read = reader.read(&mut buffer).map_err(|e| io_err(path, e))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of an in-memory buffer, hex encoded.
pub fn fingerprint_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

//! Library mutation: deleting images and keeping the persisted artifacts
//! consistent.
//!
//! Deletion is best-effort rather than transactional: every file removal is
//! attempted before any artifact is rewritten, and the three artifacts are
//! then pruned together so no stale reference remains, whether or not some
//! removal failed. The first removal error is reported to the caller after
//! the prune.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;

use log::{error, info};

use crate::error::{Error, Result};
use crate::persistence::ArtifactStore;
use crate::types::DeletePair;

/// Delete the selected image/thumbnail pairs and prune every reference to
/// them from the index, classification map, and duplicate report.
///
/// A file that is already gone is not an error, so the operation is
/// idempotent. Returns the number of pairs processed.
pub fn delete_images(store: &ArtifactStore, selected: &[DeletePair]) -> Result<usize> {
    let mut first_error: Option<Error> = None;

    for pair in selected {
        for path in [&pair.original, &pair.thumbnail] {
            match fs::remove_file(path) {
                Ok(()) => info!("Removed {}", path),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    error!("Failed to remove {}: {}", path, err);
                    if first_error.is_none() {
                        first_error = Some(err.into());
                    }
                }
            }
        }
    }

    let originals: HashSet<String> = selected.iter().map(|p| p.original.clone()).collect();
    let thumbnails: HashSet<String> = selected.iter().map(|p| p.thumbnail.clone()).collect();
    store.prune(&originals, &thumbnails)?;

    match first_error {
        Some(err) => Err(err),
        None => Ok(selected.len()),
    }
}

// -- Tests --

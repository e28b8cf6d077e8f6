//! Library index construction.
//!
//! A rebuild walks the whole photo tree and regenerates the index from
//! scratch; there is no incremental update. The tree is expected to be laid
//! out as `photos_root/year/month/...`, and capture timestamps are derived
//! from the `YYYY_MM_DD_HH_MM_SS`-prefixed filename convention where
//! present.

use std::path::Path;

use log::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::persistence::ArtifactStore;
use crate::progress::{notify, CancelToken, ProgressEvent, ProgressSender};
use crate::types::IndexRecord;

/// Extensions (case-insensitive) that qualify a file for the index
const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Result of an index rebuild
#[derive(Debug, Clone, PartialEq)]
pub enum IndexOutcome {
    /// The full tree was walked and the index persisted
    Complete(Vec<IndexRecord>),

    /// The run was cancelled; nothing was persisted and any prior index is
    /// untouched
    Cancelled,
}

/// Returns whether the given path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Rebuild the library index from the photo tree.
///
/// Walks `photos_root`, derives temporal keys for every supported image, and
/// persists the sorted result wholesale. Cancellation is all-or-nothing: a
/// cancelled run discards everything collected so far and leaves the
/// previously persisted index byte-for-byte unchanged.
pub fn build_index(
    config: &Config,
    store: &ArtifactStore,
    progress: Option<&ProgressSender>,
    cancel: &CancelToken,
) -> Result<IndexOutcome> {
    let root = config.photos_root.as_path();
    if !root.is_dir() {
        return Err(Error::RootNotFound(root.to_path_buf()));
    }

    let total = count_supported_images(root, config.max_depth);
    info!("Indexing {} images under {}", total, root.display());

    let mut records = Vec::with_capacity(total);
    let mut processed = 0usize;

    for entry in walk_images(root, config.max_depth) {
        if cancel.is_cancelled() {
            info!("Index rebuild cancelled after {} files; discarding", processed);
            return Ok(IndexOutcome::Cancelled);
        }

        let path = entry.path();
        processed += 1;
        notify(progress, ProgressEvent::Indexing { processed, total });

        // strip_prefix cannot fail for entries yielded by the walk
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };

        match derive_record(relative, &config.thumbnails_root, path) {
            Some(record) => records.push(record),
            None => {
                // Cannot derive year/month for files above two levels deep
                debug!("Skipping {} (path too shallow)", path.display());
            }
        }
    }

    // Fixed-width zero-padded timestamps sort chronologically as strings.
    // sort_by is stable, so ties keep discovery order.
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    store.save_index(&records)?;
    Ok(IndexOutcome::Complete(records))
}

/// Derive an index record from a path relative to the photo root, or `None`
/// when the path is too shallow to carry `year/month` segments
fn derive_record(
    relative: &Path,
    thumbnails_root: &Path,
    original: &Path,
) -> Option<IndexRecord> {
    let dir_segments: Vec<&str> = relative
        .parent()?
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    if dir_segments.len() < 2 {
        return None;
    }
    let year = dir_segments[0];
    let month = dir_segments[1];

    let file_name = relative.file_name()?.to_str()?;
    let stem = relative.file_stem()?.to_str()?;

    let (day, timestamp) = derive_timestamp(stem, year, month);
    let thumbnail = thumbnails_root
        .join(relative.parent()?)
        .join(file_name);

    Some(IndexRecord {
        thumbnail: thumbnail.to_string_lossy().into_owned(),
        original: original.to_string_lossy().into_owned(),
        year: year.to_string(),
        month: month.to_string(),
        day,
        timestamp,
    })
}

/// Derive `(day, timestamp)` from a filename stem.
///
/// A stem with at least six underscore-delimited components is taken as a
/// `YYYY_MM_DD_HH_MM_SS`-prefixed capture time; anything else falls back to
/// the first of the month at midnight.
fn derive_timestamp(stem: &str, year: &str, month: &str) -> (String, String) {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() >= 6 {
        (parts[2].to_string(), parts[..6].join("_"))
    } else {
        (
            "01".to_string(),
            format!("{}_{}_01_00_00_00", year, month),
        )
    }
}

/// Walk supported image files under a root in a deterministic order
fn walk_images(root: &Path, max_depth: Option<usize>) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .max_depth(max_depth.unwrap_or(usize::MAX))
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_image(e.path()))
}

/// Pre-count pass so progress can report a total
fn count_supported_images(root: &Path, max_depth: Option<usize>) -> usize {
    walk_images(root, max_depth).count()
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn create_image_file(dir: &Path, name: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        // Indexing never decodes, so dummy bytes are enough
        file.write_all(b"DUMMY IMAGE DATA").unwrap();
        path
    }

    fn test_config(photos: &Path, artifacts: &Path) -> Config {
        let mut config = Config::default();
        config.photos_root = photos.to_path_buf();
        config.thumbnails_root = PathBuf::from("/thumbs");
        config.artifact_dir = artifacts.to_path_buf();
        config
    }

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.JPEG")));
        assert!(is_supported_image(Path::new("a.Png")));
        assert!(!is_supported_image(Path::new("a.tiff")));
        assert!(!is_supported_image(Path::new("a.txt")));
        assert!(!is_supported_image(Path::new("noextension")));
    }

    #[test]
    fn test_timestamped_filename_yields_full_capture_key() {
        let dir = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        create_image_file(
            &dir.path().join("2023").join("05"),
            "2023_05_14_10_30_00_img.jpg",
        );

        let config = test_config(dir.path(), artifacts.path());
        let store = ArtifactStore::new(artifacts.path());
        let outcome = build_index(&config, &store, None, &CancelToken::new()).unwrap();

        let records = match outcome {
            IndexOutcome::Complete(records) => records,
            IndexOutcome::Cancelled => panic!("run was not cancelled"),
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, "2023");
        assert_eq!(records[0].month, "05");
        assert_eq!(records[0].day, "14");
        assert_eq!(records[0].timestamp, "2023_05_14_10_30_00");
        assert!(records[0]
            .thumbnail
            .ends_with("2023_05_14_10_30_00_img.jpg"));
    }

    #[test]
    fn test_plain_filename_falls_back_to_first_of_month() {
        let dir = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        create_image_file(&dir.path().join("2023").join("05"), "vacation.jpg");

        let config = test_config(dir.path(), artifacts.path());
        let store = ArtifactStore::new(artifacts.path());
        let outcome = build_index(&config, &store, None, &CancelToken::new()).unwrap();

        let records = match outcome {
            IndexOutcome::Complete(records) => records,
            IndexOutcome::Cancelled => panic!("run was not cancelled"),
        };
        assert_eq!(records[0].day, "01");
        assert_eq!(records[0].timestamp, "2023_05_01_00_00_00");
    }

    #[test]
    fn test_shallow_files_are_silently_skipped() {
        let dir = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        create_image_file(dir.path(), "onlyonelevel.jpg");
        create_image_file(&dir.path().join("2023"), "toohigh.jpg");
        create_image_file(&dir.path().join("2023").join("05"), "kept.jpg");

        let config = test_config(dir.path(), artifacts.path());
        let store = ArtifactStore::new(artifacts.path());
        let outcome = build_index(&config, &store, None, &CancelToken::new()).unwrap();

        let records = match outcome {
            IndexOutcome::Complete(records) => records,
            IndexOutcome::Cancelled => panic!("run was not cancelled"),
        };
        assert_eq!(records.len(), 1);
        assert!(records[0].original.ends_with("kept.jpg"));
    }

    #[test]
    fn test_output_is_sorted_with_unique_originals() {
        let dir = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        create_image_file(
            &dir.path().join("2024").join("01"),
            "2024_01_02_08_00_00_a.jpg",
        );
        create_image_file(&dir.path().join("2022").join("12"), "late.png");
        create_image_file(
            &dir.path().join("2023").join("06"),
            "2023_06_01_12_00_00_b.jpeg",
        );

        let config = test_config(dir.path(), artifacts.path());
        let store = ArtifactStore::new(artifacts.path());
        let outcome = build_index(&config, &store, None, &CancelToken::new()).unwrap();

        let records = match outcome {
            IndexOutcome::Complete(records) => records,
            IndexOutcome::Cancelled => panic!("run was not cancelled"),
        };
        assert_eq!(records.len(), 3);
        for pair in records.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
        let originals: std::collections::HashSet<_> =
            records.iter().map(|r| r.original.clone()).collect();
        assert_eq!(originals.len(), records.len());

        // The persisted artifact matches what was returned
        assert_eq!(store.load_index().unwrap(), records);
    }

    #[test]
    fn test_missing_root_is_a_configuration_error() {
        let artifacts = tempdir().unwrap();
        let config = test_config(Path::new("/path/that/does/not/exist"), artifacts.path());
        let store = ArtifactStore::new(artifacts.path());

        let result = build_index(&config, &store, None, &CancelToken::new());
        assert!(matches!(result, Err(Error::RootNotFound(_))));
        assert!(!store.index_path().exists());
    }

    #[test]
    fn test_cancelled_run_leaves_prior_index_untouched() {
        let dir = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        create_image_file(&dir.path().join("2023").join("05"), "new.jpg");

        let store = ArtifactStore::new(artifacts.path());
        let prior = vec![IndexRecord {
            thumbnail: "/thumbs/old.jpg".to_string(),
            original: "/photos/old.jpg".to_string(),
            year: "2020".to_string(),
            month: "01".to_string(),
            day: "01".to_string(),
            timestamp: "2020_01_01_00_00_00".to_string(),
        }];
        store.save_index(&prior).unwrap();
        let before = fs::read(store.index_path()).unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();

        let config = test_config(dir.path(), artifacts.path());
        let outcome = build_index(&config, &store, None, &cancel).unwrap();

        assert_eq!(outcome, IndexOutcome::Cancelled);
        assert_eq!(fs::read(store.index_path()).unwrap(), before);
    }

    #[test]
    fn test_progress_reports_every_supported_file() {
        let dir = tempdir().unwrap();
        let artifacts = tempdir().unwrap();
        // One indexable image, one too shallow; both count for progress
        create_image_file(&dir.path().join("2023").join("05"), "a.jpg");
        create_image_file(dir.path(), "b.jpg");
        create_image_file(&dir.path().join("2023").join("05"), "notes.txt");

        let (tx, rx) = crossbeam::channel::unbounded();
        let config = test_config(dir.path(), artifacts.path());
        let store = ArtifactStore::new(artifacts.path());
        build_index(&config, &store, Some(&tx), &CancelToken::new()).unwrap();
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                ProgressEvent::Indexing {
                    processed: 1,
                    total: 2
                },
                ProgressEvent::Indexing {
                    processed: 2,
                    total: 2
                },
            ]
        );
    }
}

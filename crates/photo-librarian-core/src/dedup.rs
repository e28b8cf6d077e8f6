//! Duplicate and near-duplicate detection.
//!
//! Detection is a pure function of the fingerprints of the images in the
//! index, processed in input order. Two independent comparison passes run
//! over the same stream: perceptual-hash distance and EXIF capture-date
//! correlation. Results are pairwise and directional only; the first-seen
//! image of a pair is always the `original`, and no transitive closure is
//! computed (A~B and B~C never implies a recorded A~C).
//!
//! Batching exists purely to interleave progress events and cancellation
//! checks; it has no bearing on the results.

use std::collections::HashSet;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;

use crate::config::Config;
use crate::fingerprint::{hash_from_file, read_exif, ExifRecord, PHash, DATE_TAGS};
use crate::persistence::ArtifactStore;
use crate::progress::{notify, CancelToken, ProgressEvent, ProgressSender};
use crate::types::{DuplicateGroup, DuplicateReport, IndexRecord, Method};

/// Detects duplicate images across a library index.
///
/// Each call to [`detect`](DuplicateDetector::detect) owns its own working
/// state, so concurrent runs over different libraries cannot interfere.
#[derive(Debug, Clone)]
pub struct DuplicateDetector {
    hash_threshold: u64,
    batch_size: usize,
}

impl DuplicateDetector {
    pub fn new(config: &Config) -> Self {
        Self {
            hash_threshold: config.hash_threshold,
            batch_size: config.batch_size.max(1),
        }
    }

    /// Compare every image in the index against all previously seen images
    /// and return the duplicate groups keyed by method.
    ///
    /// On completion the report is persisted to `duplicates.json`; a write
    /// failure is logged and swallowed, the computed report is returned
    /// regardless. Cancellation is checked once per batch and returns
    /// whatever has accumulated so far (unlike an index rebuild, partial
    /// detection results are kept).
    pub fn detect(
        &self,
        index: &[IndexRecord],
        store: &ArtifactStore,
        progress: Option<&ProgressSender>,
        cancel: &CancelToken,
    ) -> DuplicateReport {
        let total = index.len();
        let mut state = RunState::default();
        let mut cancelled = false;

        for (batch_number, batch) in index.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                info!("Duplicate detection cancelled; keeping partial results");
                cancelled = true;
                break;
            }
            notify(
                progress,
                ProgressEvent::Detecting {
                    processed: batch_number * self.batch_size,
                    total,
                },
            );

            // Fingerprinting is pure, so a batch can fan out across the
            // rayon pool; the merge below is serial in input order, which
            // keeps the results order-stable.
            let fingerprints: Vec<(String, Option<PHash>, ExifRecord)> = batch
                .par_iter()
                .map(|record| {
                    let path = Path::new(&record.original);
                    (record.original.clone(), hash_from_file(path), read_exif(path))
                })
                .collect();

            for (path, hash, exif) in fingerprints {
                if !state.processed.insert(path.clone()) {
                    continue;
                }
                if let Some(hash) = hash {
                    state.compare_hash(hash, &path, self.hash_threshold);
                }
                if !exif.is_empty() {
                    state.compare_exif(&path, exif);
                }
            }
        }

        let report = state.report;
        info!(
            "Duplicate detection found {} hash and {} exif groups",
            report.hash.len(),
            report.exif.len()
        );

        if !cancelled {
            if let Err(err) = store.save_duplicates(&report) {
                warn!("Failed to persist duplicate report: {}", err);
            }
        }

        report
    }
}

/// Comparison state accumulated across one detection run
#[derive(Debug, Default)]
struct RunState {
    /// Previously seen hashes in insertion order; a re-seen hash value keeps
    /// its slot and takes over the newer path
    seen_hashes: Vec<(PHash, String)>,

    /// EXIF records of previously seen images, in insertion order; images
    /// with empty records are never entered
    seen_exif: Vec<(String, ExifRecord)>,

    /// Originals already handled in this run
    processed: HashSet<String>,

    report: DuplicateReport,
}

impl RunState {
    /// Compare a new image's hash against every previously seen hash, then
    /// record it as a future comparison point regardless of matches
    fn compare_hash(&mut self, hash: PHash, path: &str, threshold: u64) {
        for (seen_hash, seen_path) in &self.seen_hashes {
            if seen_path == path {
                continue;
            }
            let diff = hash.int_distance(seen_hash);
            if diff <= threshold {
                self.report.hash.push(DuplicateGroup {
                    original: seen_path.clone(),
                    duplicate: path.to_string(),
                    similarity: 1.0 - diff as f64 / 64.0,
                    method: Method::Hash,
                });
            }
        }

        match self.seen_hashes.iter_mut().find(|(seen, _)| *seen == hash) {
            Some(entry) => entry.1 = path.to_string(),
            None => self.seen_hashes.push((hash, path.to_string())),
        }
    }

    /// Compare a new image's EXIF dates against every previously seen
    /// record. The date tags are checked in priority order and at most one
    /// group is recorded per pair, however many tags agree.
    fn compare_exif(&mut self, path: &str, record: ExifRecord) {
        for (seen_path, seen_record) in &self.seen_exif {
            if seen_path == path {
                continue;
            }
            for tag in DATE_TAGS {
                match (record.get(tag), seen_record.get(tag)) {
                    (Some(a), Some(b)) if a == b => {
                        self.report.exif.push(DuplicateGroup {
                            original: seen_path.clone(),
                            duplicate: path.to_string(),
                            similarity: 1.0,
                            method: Method::Exif,
                        });
                        break;
                    }
                    _ => {}
                }
            }
        }

        self.seen_exif.push((path.to_string(), record));
    }
}

// -- Tests --

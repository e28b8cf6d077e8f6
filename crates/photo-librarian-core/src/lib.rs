//! Core functionality for indexing a photo library and detecting duplicate
//! images.
//!
//! This library provides the foundational components for library curation:
//! - File discovery and temporal index construction
//! - Perceptual-hash and EXIF fingerprint extraction
//! - Duplicate detection across both fingerprints
//! - Consistent deletion across the persisted artifacts

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::Config;
pub use error::{Error, Result};
pub use indexing::IndexOutcome;
pub use progress::{CancelToken, ProgressEvent, ProgressSender};
pub use types::*;

// -- Public Modules --
pub mod classify;
pub mod config;
pub mod dedup;
pub mod deletion;
pub mod fingerprint;
pub mod indexing;
pub mod logging;
pub mod persistence;
pub mod progress;
pub mod thumbnail;
pub mod types;

use std::sync::Mutex;

use classify::SceneClassifier;
use dedup::DuplicateDetector;
use persistence::ArtifactStore;

/// Main entry point: one photo library with its configuration and persisted
/// artifacts.
///
/// Index rebuilds, duplicate detection, and deletion all take the same run
/// lock, so the directory tree is never mutated underneath an in-flight
/// walk.
pub struct PhotoLibrary {
    config: Config,
    store: ArtifactStore,
    run_lock: Mutex<()>,
}

impl PhotoLibrary {
    /// Create a new PhotoLibrary with the provided configuration
    pub fn new(config: Config) -> Self {
        let store = ArtifactStore::new(config.artifact_dir.clone());
        Self {
            config,
            store,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Rebuild the index from the photo tree and persist it
    pub fn build_index(
        &self,
        progress: Option<&ProgressSender>,
        cancel: &CancelToken,
    ) -> Result<IndexOutcome> {
        let _run = self.run_lock.lock().unwrap();
        indexing::build_index(&self.config, &self.store, progress, cancel)
    }

    /// Generate thumbnails for every image under the photo root
    pub fn generate_thumbnails(
        &self,
        progress: Option<&ProgressSender>,
        cancel: &CancelToken,
    ) -> Result<usize> {
        let _run = self.run_lock.lock().unwrap();
        thumbnail::generate_thumbnails(&self.config, progress, cancel)
    }

    /// Detect duplicates across the persisted index
    pub fn detect_duplicates(
        &self,
        progress: Option<&ProgressSender>,
        cancel: &CancelToken,
    ) -> Result<DuplicateReport> {
        let _run = self.run_lock.lock().unwrap();
        let index = self.store.load_index()?;
        let detector = DuplicateDetector::new(&self.config);
        Ok(detector.detect(&index, &self.store, progress, cancel))
    }

    /// Run a scene classifier over the indexed images and persist the map
    pub fn classify<C: SceneClassifier>(
        &self,
        classifier: &C,
        progress: Option<&ProgressSender>,
    ) -> Result<ClassificationMap> {
        let index = self.store.load_index()?;
        classify::classify_library(classifier, &index, &self.store, progress)
    }

    /// Delete the selected images and prune every reference to them
    pub fn delete_images(&self, selected: &[DeletePair]) -> Result<usize> {
        let _run = self.run_lock.lock().unwrap();
        deletion::delete_images(&self.store, selected)
    }

    /// Load the persisted index
    pub fn load_index(&self) -> Result<Vec<IndexRecord>> {
        self.store.load_index()
    }

    /// Load the persisted classification map
    pub fn load_classifications(&self) -> Result<ClassificationMap> {
        self.store.load_classifications()
    }

    /// Load the persisted duplicate report
    pub fn load_duplicates(&self) -> Result<DuplicateReport> {
        self.store.load_duplicates()
    }
}

// -- Tests --

//! Persisted JSON artifacts.
//!
//! Three artifacts describe the library state: `index.json` (the ordered
//! image catalog), `classification_results.json` (scene labels keyed by
//! thumbnail path, owned by the classification collaborator), and
//! `duplicates.json` (duplicate groups keyed by detection method). All are
//! pretty-printed UTF-8 JSON.
//!
//! Writes go through a temp-file-and-rename cycle so a crashed or cancelled
//! write never leaves a truncated artifact, and read-modify-write cycles are
//! serialized behind a store-level mutex.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::types::{ClassificationMap, DuplicateReport, IndexRecord};

pub const INDEX_FILE: &str = "index.json";
pub const CLASSIFICATION_FILE: &str = "classification_results.json";
pub const DUPLICATES_FILE: &str = "duplicates.json";

/// Owns the paths of the three persisted artifacts and guards their
/// read-modify-write cycles.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn classification_path(&self) -> PathBuf {
        self.dir.join(CLASSIFICATION_FILE)
    }

    pub fn duplicates_path(&self) -> PathBuf {
        self.dir.join(DUPLICATES_FILE)
    }

    /// Load the persisted index; missing file yields an empty index
    pub fn load_index(&self) -> Result<Vec<IndexRecord>> {
        read_json(&self.index_path())
    }

    /// Replace the persisted index wholesale
    pub fn save_index(&self, records: &[IndexRecord]) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        write_json(&self.index_path(), &records)?;
        info!("Persisted index with {} records", records.len());
        Ok(())
    }

    /// Load the classification map; missing file yields an empty map
    pub fn load_classifications(&self) -> Result<ClassificationMap> {
        read_json(&self.classification_path())
    }

    /// Replace the persisted classification map wholesale
    pub fn save_classifications(&self, map: &ClassificationMap) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        write_json(&self.classification_path(), map)
    }

    /// Load the duplicate report; missing file yields an empty report
    pub fn load_duplicates(&self) -> Result<DuplicateReport> {
        read_json(&self.duplicates_path())
    }

    /// Replace the persisted duplicate report wholesale
    pub fn save_duplicates(&self, report: &DuplicateReport) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();
        write_json(&self.duplicates_path(), report)
    }

    /// Remove every reference to the given paths from all three artifacts.
    ///
    /// The index and duplicate report are filtered on original paths (a
    /// group is dropped when either endpoint was deleted); the
    /// classification map is filtered on thumbnail keys. Artifacts that do
    /// not exist yet are left alone rather than created empty.
    pub fn prune(
        &self,
        originals: &HashSet<String>,
        thumbnails: &HashSet<String>,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap();

        let index_path = self.index_path();
        if index_path.exists() {
            let mut records: Vec<IndexRecord> = read_json(&index_path)?;
            records.retain(|record| !originals.contains(&record.original));
            write_json(&index_path, &records)?;
        }

        let classification_path = self.classification_path();
        if classification_path.exists() {
            let mut map: ClassificationMap = read_json(&classification_path)?;
            map.retain(|thumbnail, _| !thumbnails.contains(thumbnail));
            write_json(&classification_path, &map)?;
        }

        let duplicates_path = self.duplicates_path();
        if duplicates_path.exists() {
            let mut report: DuplicateReport = read_json(&duplicates_path)?;
            for groups in [&mut report.hash, &mut report.exif] {
                groups.retain(|group| {
                    !originals.contains(&group.original) && !originals.contains(&group.duplicate)
                });
            }
            write_json(&duplicates_path, &report)?;
        }

        Ok(())
    }
}

/// Read a JSON artifact, defaulting to an empty value when the file does not
/// exist yet
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)?;
    Ok(value)
}

/// Write a JSON artifact via a sibling temp file and an atomic rename
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

// -- Tests --

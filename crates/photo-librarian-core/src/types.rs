use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry in the library index, one per discovered image.
///
/// `original` is the identity key: no two records in a persisted index share
/// it. `timestamp` is a fixed-width `YYYY_MM_DD_HH_MM_SS` string, so its
/// lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Path to the thumbnail derived for this image
    pub thumbnail: String,

    /// Path to the original image file
    pub original: String,

    /// Year segment of the directory the image lives in
    pub year: String,

    /// Month segment of the directory the image lives in
    pub month: String,

    /// Day, from the filename when it carries one, else "01"
    pub day: String,

    /// Sortable capture key derived from the filename or synthesized
    pub timestamp: String,
}

/// How a duplicate relationship was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Perceptual hash comparison
    Hash,
    /// Matching EXIF capture dates
    Exif,
}

/// A directional pairwise relationship between two images flagged as likely
/// duplicates. The first-seen image is `original`; no transitive clustering
/// is performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Path of the first-seen image
    pub original: String,

    /// Path of the later image flagged against it
    pub duplicate: String,

    /// Similarity in [0, 1]; 1.0 for EXIF date matches
    pub similarity: f64,

    /// Detection method that produced this group
    pub method: Method,
}

/// Duplicate groups keyed by detection method, as persisted in
/// `duplicates.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateReport {
    #[serde(default)]
    pub hash: Vec<DuplicateGroup>,

    #[serde(default)]
    pub exif: Vec<DuplicateGroup>,
}

impl DuplicateReport {
    /// Total number of groups across both methods
    pub fn len(&self) -> usize {
        self.hash.len() + self.exif.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty() && self.exif.is_empty()
    }
}

/// Scene label and confidence for one thumbnail, owned by the external
/// classification collaborator. The engine reads and prunes these, nothing
/// more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub label: String,
    pub confidence: f64,
}

/// Mapping from thumbnail path to its classification, as persisted in
/// `classification_results.json`.
pub type ClassificationMap = BTreeMap<String, ClassificationEntry>;

/// A pair of paths selected for deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletePair {
    pub original: String,
    pub thumbnail: String,
}

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for the photo library engine.
///
/// Serializes to JSON; fields omitted from a config file fall back to their
/// defaults, so a partial file is always valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the photo tree, laid out as `year/month/...`
    pub photos_root: PathBuf,

    /// Root under which thumbnails mirror the photo tree
    pub thumbnails_root: PathBuf,

    /// Directory holding the persisted JSON artifacts
    pub artifact_dir: PathBuf,

    /// Maximum absolute difference between two perceptual hash values
    /// (interpreted as integers) for them to count as duplicates
    pub hash_threshold: u64,

    /// Number of images per detection batch; affects only how often progress
    /// and cancellation are checked, never the results
    pub batch_size: usize,

    /// Minimum confidence below which non-photo classifications fall back to
    /// "photo"
    pub confidence_threshold: f64,

    /// Maximum directory depth for scanning
    pub max_depth: Option<usize>,

    /// Bounding edge of generated thumbnails, in pixels
    pub thumbnail_edge: u32,

    /// JPEG quality for generated thumbnails (1-100)
    pub thumbnail_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            photos_root: PathBuf::new(),
            thumbnails_root: PathBuf::new(),
            artifact_dir: PathBuf::from("."),
            hash_threshold: 5,
            batch_size: 50,
            confidence_threshold: 90.0,
            max_depth: None,
            thumbnail_edge: 300,
            thumbnail_quality: 85,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Check that both library roots are configured
    pub fn validate(&self) -> Result<()> {
        if self.photos_root.as_os_str().is_empty() {
            return Err(Error::Configuration("photos_root is not set".to_string()));
        }
        if self.thumbnails_root.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "thumbnails_root is not set".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// -- Tests --

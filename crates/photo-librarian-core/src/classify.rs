//! Interface to the external scene-classification collaborator.
//!
//! The model itself lives outside this crate; anything that can label an
//! image implements [`SceneClassifier`]. The engine's own involvement is
//! narrow: drive a classifier over the index with per-item progress, persist
//! the resulting map, and prune it on deletion.

use std::path::Path;

use crate::error::Result;
use crate::persistence::ArtifactStore;
use crate::progress::{notify, ProgressEvent, ProgressSender};
use crate::types::{ClassificationEntry, ClassificationMap, IndexRecord};

/// Scene labels produced by the reference collaborator
pub const LABELS: [&str; 4] = ["photo", "screenshot", "document", "meme"];

/// Label reported when an image cannot be classified at all
pub const LABEL_ERROR: &str = "error";

/// A scene classifier over single images.
///
/// `classify` must always produce a label; implementations report
/// [`LABEL_ERROR`] with zero confidence instead of failing.
pub trait SceneClassifier {
    fn classify(&self, image: &Path) -> (String, f64);
}

/// Run a classifier over every indexed image and persist the resulting map,
/// keyed by thumbnail path as the presentation layer expects.
pub fn classify_library<C: SceneClassifier>(
    classifier: &C,
    index: &[IndexRecord],
    store: &ArtifactStore,
    progress: Option<&ProgressSender>,
) -> Result<ClassificationMap> {
    let mut results = ClassificationMap::new();

    for record in index {
        let (label, confidence) = classifier.classify(Path::new(&record.original));
        notify(
            progress,
            ProgressEvent::Classified {
                thumbnail: record.thumbnail.clone(),
                label: label.clone(),
                confidence,
            },
        );
        results.insert(
            record.thumbnail.clone(),
            ClassificationEntry { label, confidence },
        );
    }

    store.save_classifications(&results)?;
    Ok(results)
}

// -- Tests --

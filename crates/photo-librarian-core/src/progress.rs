use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress notifications emitted by long-running engine operations.
///
/// The engine only pushes events into a channel; rendering them (progress
/// bars, UI updates) is entirely the consumer's concern.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Files counted so far while rebuilding the index
    Indexing { processed: usize, total: usize },

    /// Thumbnails written so far
    Thumbnails { processed: usize, total: usize },

    /// Images handed to the duplicate detector so far, reported per batch
    Detecting { processed: usize, total: usize },

    /// One image classified by the scene-classification collaborator
    Classified {
        thumbnail: String,
        label: String,
        confidence: f64,
    },
}

pub type ProgressSender = crossbeam::channel::Sender<ProgressEvent>;

/// Send an event if a sink is attached. A disconnected receiver never fails
/// the run.
pub(crate) fn notify(sink: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(event);
    }
}

/// Cooperative cancellation flag shared between the caller and a running
/// operation. Each operation documents its own discard-vs-keep policy.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the operation stop at its next check point
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

// -- Tests --

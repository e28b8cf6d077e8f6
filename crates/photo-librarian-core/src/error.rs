use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the photo-librarian library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A configured root directory does not exist
    #[error("Root directory not found: {0}")]
    RootNotFound(PathBuf),

    /// Reading or writing a persisted JSON artifact failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] serde_json::Error),
}

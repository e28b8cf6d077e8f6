//! Content fingerprints for duplicate detection.
//!
//! Both extractors are pure functions over file bytes with no shared state,
//! so they are safe to call concurrently across files. Failures are data,
//! not errors: an undecodable image yields `None` for its hash and an empty
//! EXIF record, and the file simply cannot participate in the corresponding
//! comparison.

pub mod exif;
pub mod perceptual;

pub use exif::{read_exif, ExifRecord, DATE_TAGS};
pub use perceptual::{average_hash, hash_from_file, PHash};

//! Average-hash perceptual fingerprinting.
//!
//! The hash is a 64-bit fingerprint of the image's downsampled luminance
//! pattern: the image is reduced to an 8x8 RGB grid, converted to grayscale,
//! and each pixel contributes one bit depending on whether it is brighter
//! than the grid mean. Minor recompression or resizing leaves the hash
//! nearly unchanged, unlike a cryptographic hash.
//!
//! Hashes are compared by the absolute difference of their values
//! interpreted as integers, and persisted as 16-digit hex strings.

use image::DynamicImage;
use std::path::Path;

/// A 64-bit average hash of an image's luminance pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PHash(pub u64);

impl PHash {
    /// Absolute difference between the two hash values interpreted as
    /// integers. Hashes within a small threshold of each other belong to
    /// visually similar images.
    pub fn int_distance(&self, other: &PHash) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// Check whether two hashes fall within a distance threshold
    pub fn is_similar(&self, other: &PHash, threshold: u64) -> bool {
        self.int_distance(other) <= threshold
    }

    /// Fixed-width hex representation used in persisted artifacts
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Parse a hash from its hex representation
    pub fn from_hex(hex: &str) -> Option<PHash> {
        u64::from_str_radix(hex, 16).ok().map(PHash)
    }
}

/// Calculate the 64-bit average hash of an image
pub fn average_hash(img: &DynamicImage) -> PHash {
    // Downsample to the 8x8 comparison grid in normalized RGB
    let grid = img
        .resize_exact(8, 8, image::imageops::FilterType::Nearest)
        .to_rgb8();

    // Grayscale formula: 0.299*R + 0.587*G + 0.114*B
    let mut luma = [0.0f32; 64];
    let mut sum = 0.0f32;
    for (i, pixel) in grid.pixels().enumerate() {
        let gray =
            0.299 * pixel[0] as f32 + 0.587 * pixel[1] as f32 + 0.114 * pixel[2] as f32;
        luma[i] = gray;
        sum += gray;
    }
    let mean = sum / 64.0;

    // One bit per pixel: set when brighter than the grid mean
    let mut hash: u64 = 0;
    for (bit, &gray) in luma.iter().enumerate() {
        if gray > mean {
            hash |= 1u64 << bit;
        }
    }

    PHash(hash)
}

/// Calculate the average hash of an image file.
///
/// Returns `None` when the file cannot be opened or decoded; such a file
/// cannot take part in hash-based comparison but is not an error.
pub fn hash_from_file<P: AsRef<Path>>(path: P) -> Option<PHash> {
    let img = image::open(path).ok()?;
    Some(average_hash(&img))
}

// -- Tests --

//! Thumbnail generation collaborator.
//!
//! Thumbnails mirror the photo tree: the thumbnail for
//! `photos_root/year/month/file.jpg` lands at
//! `thumbnails_root/year/month/file.jpg`, always JPEG-encoded regardless of
//! the source format. Each image is center-cropped square, bounded to the
//! configured edge, and reoriented per its EXIF orientation tag. A file that
//! cannot be decoded is skipped, never fatal.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView};
use log::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fingerprint::read_exif;
use crate::indexing::is_supported_image;
use crate::progress::{notify, CancelToken, ProgressEvent, ProgressSender};

/// Generate thumbnails for every supported image under the photo root.
///
/// Returns the number of thumbnails written. Cancellation stops the walk and
/// keeps whatever was already written; thumbnails are independent files, so
/// there is no partial state to discard.
pub fn generate_thumbnails(
    config: &Config,
    progress: Option<&ProgressSender>,
    cancel: &CancelToken,
) -> Result<usize> {
    let root = config.photos_root.as_path();
    if !root.is_dir() {
        return Err(Error::RootNotFound(root.to_path_buf()));
    }

    let entries: Vec<_> = walkdir::WalkDir::new(root)
        .max_depth(config.max_depth.unwrap_or(usize::MAX))
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_supported_image(e.path()))
        .collect();
    let total = entries.len();

    let mut generated = 0usize;
    for entry in entries {
        if cancel.is_cancelled() {
            info!("Thumbnail generation cancelled after {} files", generated);
            break;
        }

        let path = entry.path();
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let destination = config.thumbnails_root.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        match write_thumbnail(path, &destination, config.thumbnail_edge, config.thumbnail_quality)
        {
            Ok(()) => {
                generated += 1;
                notify(
                    progress,
                    ProgressEvent::Thumbnails {
                        processed: generated,
                        total,
                    },
                );
            }
            Err(err) => {
                debug!("Skipping thumbnail for {}: {}", path.display(), err);
            }
        }
    }

    Ok(generated)
}

/// Produce a single thumbnail: center square crop, bound to `edge`, EXIF
/// reorientation, JPEG encode
fn write_thumbnail(source: &Path, destination: &Path, edge: u32, quality: u8) -> Result<()> {
    let img = image::open(source)?;

    let side = img.width().min(img.height());
    let x = (img.width() - side) / 2;
    let y = (img.height() - side) / 2;
    let thumb = img.crop_imm(x, y, side, side).thumbnail(edge, edge);

    let orientation = read_exif(source)
        .get("Orientation")
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(1);
    let thumb = apply_orientation(thumb, orientation);

    let file = File::create(destination)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    encoder.encode_image(&thumb.to_rgb8())?;
    Ok(())
}

/// Map an EXIF orientation value onto the transform it encodes
fn apply_orientation(img: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_config(photos: &Path, thumbnails: &Path) -> Config {
        let mut config = Config::default();
        config.photos_root = photos.to_path_buf();
        config.thumbnails_root = thumbnails.to_path_buf();
        config
    }

    fn save_image(path: &PathBuf, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, Rgb([120, 80, 40]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_thumbnails_mirror_the_photo_tree() {
        let photos = tempdir().unwrap();
        let thumbs = tempdir().unwrap();
        save_image(&photos.path().join("2023/05/wide.png"), 640, 480);

        let config = test_config(photos.path(), thumbs.path());
        let generated = generate_thumbnails(&config, None, &CancelToken::new()).unwrap();

        assert_eq!(generated, 1);
        let destination = thumbs.path().join("2023/05/wide.png");
        assert!(destination.exists());

        // Square center crop bounded by the configured edge, JPEG-encoded
        // regardless of the source extension
        let thumb = image::open(&destination).unwrap();
        assert_eq!(thumb.width(), 300);
        assert_eq!(thumb.height(), 300);
    }

    #[test]
    fn test_small_images_are_not_upscaled() {
        let photos = tempdir().unwrap();
        let thumbs = tempdir().unwrap();
        save_image(&photos.path().join("2023/05/tiny.jpg"), 40, 20);

        let config = test_config(photos.path(), thumbs.path());
        generate_thumbnails(&config, None, &CancelToken::new()).unwrap();

        let thumb = image::open(thumbs.path().join("2023/05/tiny.jpg")).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (20, 20));
    }

    #[test]
    fn test_undecodable_files_are_skipped() {
        let photos = tempdir().unwrap();
        let thumbs = tempdir().unwrap();
        let broken = photos.path().join("2023/05/broken.jpg");
        fs::create_dir_all(broken.parent().unwrap()).unwrap();
        fs::write(&broken, b"NOT AN IMAGE").unwrap();
        save_image(&photos.path().join("2023/05/good.png"), 64, 64);

        let config = test_config(photos.path(), thumbs.path());
        let generated = generate_thumbnails(&config, None, &CancelToken::new()).unwrap();

        assert_eq!(generated, 1);
        assert!(!thumbs.path().join("2023/05/broken.jpg").exists());
    }

    #[test]
    fn test_missing_root_is_a_configuration_error() {
        let thumbs = tempdir().unwrap();
        let config = test_config(Path::new("/path/that/does/not/exist"), thumbs.path());

        let result = generate_thumbnails(&config, None, &CancelToken::new());
        assert!(matches!(result, Err(Error::RootNotFound(_))));
    }

    #[test]
    fn test_orientation_transforms_swap_dimensions() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
        assert_eq!(apply_orientation(img.clone(), 1).dimensions(), (4, 2));
        assert_eq!(apply_orientation(img.clone(), 3).dimensions(), (4, 2));
        assert_eq!(apply_orientation(img.clone(), 6).dimensions(), (2, 4));
        assert_eq!(apply_orientation(img, 8).dimensions(), (2, 4));
    }
}

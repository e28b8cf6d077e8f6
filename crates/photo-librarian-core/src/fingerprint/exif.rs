//! EXIF metadata extraction over a fixed tag allow-list.
//!
//! Only the tags useful for duplicate correlation are kept: the three
//! capture-date tags plus camera make, model, and orientation. Date values
//! in the standard EXIF format are normalized to ISO-8601 so records from
//! different cameras compare equal; anything unparseable is kept raw.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};

/// Date tags compared during EXIF duplicate detection, in priority order
pub const DATE_TAGS: [&str; 3] = ["DateTime", "DateTimeOriginal", "CreateDate"];

/// The allow-list of extracted tags. "CreateDate" is the common name for the
/// EXIF DateTimeDigitized tag.
const RELEVANT_TAGS: [(Tag, &str, bool); 6] = [
    (Tag::DateTime, "DateTime", true),
    (Tag::DateTimeOriginal, "DateTimeOriginal", true),
    (Tag::DateTimeDigitized, "CreateDate", true),
    (Tag::Make, "Make", false),
    (Tag::Model, "Model", false),
    (Tag::Orientation, "Orientation", false),
];

/// Normalized EXIF metadata for one image. Always present; empty when the
/// file has no EXIF block or cannot be opened at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifRecord {
    tags: BTreeMap<String, String>,
}

impl ExifRecord {
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl FromIterator<(String, String)> for ExifRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            tags: iter.into_iter().collect(),
        }
    }
}

/// Read the allow-listed EXIF tags from an image file.
///
/// Never fails: an unreadable file or a file without an EXIF block yields an
/// empty record, which excludes the image from EXIF-based comparison.
pub fn read_exif(path: &Path) -> ExifRecord {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return ExifRecord::default(),
    };
    let mut reader = BufReader::new(file);

    let exif = match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(_) => return ExifRecord::default(),
    };

    let mut tags = BTreeMap::new();
    for (tag, name, date_like) in RELEVANT_TAGS {
        if let Some(field) = exif.get_field(tag, In::PRIMARY) {
            if let Some(raw) = field_to_string(&field.value, tag) {
                let value = if date_like {
                    normalize_datetime(&raw)
                } else {
                    raw
                };
                tags.insert(name.to_string(), value);
            }
        }
    }

    ExifRecord { tags }
}

/// Normalize an EXIF "YYYY:MM:DD HH:MM:SS" date to ISO-8601. Unparseable
/// values are returned unchanged.
pub fn normalize_datetime(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S") {
        Ok(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Convert an EXIF field value to a string
fn field_to_string(value: &Value, tag: Tag) -> Option<String> {
    match value {
        Value::Ascii(vec) => vec.first().map(|bytes| {
            String::from_utf8_lossy(bytes)
                .trim_end_matches('\0')
                .trim()
                .to_string()
        }),
        Value::Short(vec) => vec.first().map(|v| v.to_string()),
        _ => Some(value.display_as(tag).to_string()),
    }
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_datetime_standard_format() {
        assert_eq!(
            normalize_datetime("2023:05:14 10:30:00"),
            "2023-05-14T10:30:00"
        );
    }

    #[test]
    fn test_normalize_datetime_keeps_unparseable_values_raw() {
        assert_eq!(normalize_datetime("not a date"), "not a date");
        assert_eq!(normalize_datetime("2023-05-14"), "2023-05-14");
    }

    #[test]
    fn test_read_exif_missing_file_is_empty() {
        let record = read_exif(Path::new("/path/that/does/not/exist.jpg"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_read_exif_undecodable_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.jpg");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"NOT AN IMAGE").unwrap();

        assert!(read_exif(&path).is_empty());
    }

    #[test]
    fn test_read_exif_plain_png_has_no_exif_block() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.png");
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        img.save(&path).unwrap();

        assert!(read_exif(&path).is_empty());
    }

    #[test]
    fn test_record_lookup() {
        let record: ExifRecord = [
            ("DateTimeOriginal".to_string(), "2023-05-14T10:30:00".to_string()),
            ("Make".to_string(), "ACME".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(record.get("DateTimeOriginal"), Some("2023-05-14T10:30:00"));
        assert_eq!(record.get("CreateDate"), None);
        assert_eq!(record.len(), 2);
        assert!(!record.is_empty());
    }
}

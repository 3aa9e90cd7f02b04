use crate::image_probe;
use crate::object_store::FetchedObject;
use chrono::{FixedOffset, Utc};
use serde::Serialize;
use tracing::{error, info};

/// Timestamps are rendered at a fixed UTC-5 offset. Not DST-aware:
/// existing rows were written with this exact rendering, so it is kept
/// as-is for compatibility.
const EASTERN_OFFSET_SECS: i32 = 5 * 3600;

/// One extraction-complete metadata record, the unit of work and the
/// unit of persistence. Constructed once per notification, immutable
/// after construction, consumed exactly once by the writer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Full object key, unmodified; the natural key of the table
    pub image_id: String,
    /// Last path segment of the object key
    pub file_name: String,
    /// Size in bytes, verbatim from the store's Content-Length
    pub file_size: i64,
    /// MIME type, verbatim from the store's Content-Type
    pub file_type: String,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Extraction time at fixed UTC-5, `YYYY-MM-DDTHH:MM:SS.ffffff`
    pub timestamp: String,
}

impl ImageMetadata {
    /// Derive a metadata record from a fetched object and its key.
    ///
    /// Validation happens here, once: if the store reported no
    /// content-length or content-type, or the payload is not a
    /// decodable raster image, the record is discarded and `None` is
    /// returned. No partial record is ever produced.
    pub fn extract(object: &FetchedObject, key: &str) -> Option<Self> {
        info!(key = %key, "extracting metadata");

        let dimensions = image_probe::inspect(&object.bytes);

        let (Some(file_size), Some(file_type), Some((width, height))) = (
            object.content_length,
            object.content_type.clone(),
            dimensions,
        ) else {
            error!(key = %key, "metadata extraction incomplete, discarding record");
            return None;
        };

        if file_size < 0 {
            error!(key = %key, file_size, "store reported a negative content length");
            return None;
        }

        Some(Self {
            image_id: key.to_string(),
            file_name: file_name_of(key).to_string(),
            file_size,
            file_type,
            width,
            height,
            timestamp: extraction_timestamp(),
        })
    }
}

/// Substring after the final `/` in the object key; the whole key when
/// there is no `/`.
fn file_name_of(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}

/// Current wall-clock time at the fixed UTC-5 offset, formatted with
/// microsecond precision.
fn extraction_timestamp() -> String {
    let eastern = FixedOffset::west_opt(EASTERN_OFFSET_SECS).expect("UTC-5 is a valid offset");
    Utc::now()
        .with_timezone(&eastern)
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 0, 0])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png)
            .expect("encoding a PNG into memory");
        buf.into_inner()
    }

    fn fetched(bytes: Vec<u8>, length: Option<i64>, mime: Option<&str>) -> FetchedObject {
        FetchedObject {
            bytes,
            content_length: length,
            content_type: mime.map(String::from),
        }
    }

    #[test]
    fn test_extract_passes_headers_through_verbatim() {
        let object = fetched(png_bytes(10, 10), Some(18), Some("image/png"));

        let metadata = ImageMetadata::extract(&object, "images/a.png").expect("complete record");

        assert_eq!(metadata.image_id, "images/a.png");
        assert_eq!(metadata.file_name, "a.png");
        assert_eq!(metadata.file_size, 18);
        assert_eq!(metadata.file_type, "image/png");
        assert_eq!(metadata.width, 10);
        assert_eq!(metadata.height, 10);
    }

    #[test]
    fn test_extract_reads_true_pixel_dimensions() {
        let object = fetched(png_bytes(100, 200), Some(1234), Some("image/png"));

        let metadata = ImageMetadata::extract(&object, "sample.png").expect("complete record");

        assert_eq!(metadata.width, 100);
        assert_eq!(metadata.height, 200);
    }

    #[test]
    fn test_file_name_is_last_path_segment() {
        assert_eq!(file_name_of("images/sample.jpg"), "sample.jpg");
        assert_eq!(file_name_of("a/b/c/deep.png"), "deep.png");
    }

    #[test]
    fn test_file_name_without_separator_is_whole_key() {
        assert_eq!(file_name_of("flat.png"), "flat.png");
    }

    #[test]
    fn test_extract_fails_fast_on_missing_content_length() {
        let object = fetched(png_bytes(10, 10), None, Some("image/png"));
        assert_eq!(ImageMetadata::extract(&object, "images/a.png"), None);
    }

    #[test]
    fn test_extract_fails_fast_on_missing_content_type() {
        let object = fetched(png_bytes(10, 10), Some(18), None);
        assert_eq!(ImageMetadata::extract(&object, "images/a.png"), None);
    }

    #[test]
    fn test_extract_fails_fast_on_undecodable_payload() {
        let object = fetched(b"fake_image_data".to_vec(), Some(15), Some("image/jpeg"));
        assert_eq!(ImageMetadata::extract(&object, "images/sample.jpg"), None);
    }

    #[test]
    fn test_extract_rejects_negative_content_length() {
        let object = fetched(png_bytes(10, 10), Some(-1), Some("image/png"));
        assert_eq!(ImageMetadata::extract(&object, "images/a.png"), None);
    }

    #[test]
    fn test_timestamp_shape() {
        let ts = extraction_timestamp();

        // YYYY-MM-DDTHH:MM:SS.ffffff
        assert_eq!(ts.len(), 26);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
        assert!(ts[20..].chars().all(|c| c.is_ascii_digit()));
    }
}

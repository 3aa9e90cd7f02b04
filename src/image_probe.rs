use image::GenericImageView;
use tracing::{debug, warn};

/// Attempt to decode an untrusted byte buffer as a raster image and
/// report its pixel dimensions.
///
/// Any decode failure (corrupt data, unsupported format, non-image
/// payload) collapses to `None`; the caller treats that as "dimensions
/// unavailable" rather than an error to propagate.
pub fn inspect(bytes: &[u8]) -> Option<(u32, u32)> {
    match image::load_from_memory(bytes) {
        Ok(decoded) => {
            let (width, height) = decoded.dimensions();
            debug!(width, height, "decoded image dimensions");
            Some((width, height))
        }
        Err(err) => {
            warn!(error = %err, "could not decode payload as an image");
            None
        }
    }
}

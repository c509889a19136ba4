use crate::{Error, Result};
use image::RgbImage;

/// Reject rasters with a zero dimension; nothing downstream can sample them.
pub fn validate_raster(image: &RgbImage) -> Result<()> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    Ok(())
}

use crate::{Error, Result};
use image::RgbImage;

/// Canvas holding both images side by side: `(w1 + w2, max(h1, h2))`.
pub fn canvas_size(w1: u32, h1: u32, w2: u32, h2: u32) -> (u32, u32) {
    (w1 + w2, h1.max(h2))
}

/// Overwrite the top-left `reference`-sized rectangle of the warped canvas.
///
/// The reference always wins in the overlap; no blending.
pub fn compose(mut warped: RgbImage, reference: &RgbImage) -> Result<RgbImage> {
    let (rw, rh) = reference.dimensions();
    if rw > warped.width() || rh > warped.height() {
        return Err(Error::InvalidInput(format!(
            "reference {}x{} does not fit canvas {}x{}",
            rw,
            rh,
            warped.width(),
            warped.height()
        )));
    }
    if rw == 0 || rh == 0 {
        return Ok(warped);
    }

    let canvas_stride = warped.width() as usize * 3;
    let ref_stride = rw as usize * 3;
    let canvas: &mut [u8] = &mut warped;
    for (dst, src) in canvas
        .chunks_exact_mut(canvas_stride)
        .zip(reference.as_raw().chunks_exact(ref_stride))
    {
        dst[..ref_stride].copy_from_slice(src);
    }

    Ok(warped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn canvas_is_side_by_side() {
        assert_eq!(canvas_size(100, 80, 120, 90), (220, 90));
        assert_eq!(canvas_size(10, 50, 10, 20), (20, 50));
    }

    #[test]
    fn reference_overwrites_overlap() {
        let warped = RgbImage::from_pixel(6, 4, Rgb([1, 1, 1]));
        let reference = RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8, y as u8, 200]));
        let out = compose(warped, &reference).unwrap();

        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(out.get_pixel(x, y), reference.get_pixel(x, y));
            }
        }
        assert_eq!(out.get_pixel(3, 0).0, [1, 1, 1]);
        assert_eq!(out.get_pixel(0, 2).0, [1, 1, 1]);
    }

    #[test]
    fn oversized_reference_rejected() {
        let warped = RgbImage::new(4, 4);
        let reference = RgbImage::new(5, 2);
        assert!(matches!(compose(warped, &reference), Err(Error::InvalidInput(_))));
    }
}

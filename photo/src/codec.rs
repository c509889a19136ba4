use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};

/// Decode and encode between compressed bytes and RGB rasters.
///
/// Decoding accepts any format the `image` crate recognises; channel
/// order is RGB on both sides.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<RgbImage> {
        decode_rgb(bytes)
    }

    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>>;

    fn mime_type(&self) -> &'static str;
}

pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(|e| Error::DecodeFailed(e.to_string()))
}

#[derive(Debug, Clone, Copy)]
pub struct JpegCodec {
    pub quality: u8,
}

impl JpegCodec {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self { quality: 95 }
    }
}

impl ImageCodec for JpegCodec {
    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| Error::EncodeFailed(e.to_string()))?;
        Ok(out)
    }

    fn mime_type(&self) -> &'static str {
        "image/jpeg"
    }
}

/// Lossless output, mostly useful for inspecting results bit-exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl ImageCodec for PngCodec {
    fn encode(&self, image: &RgbImage) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::Rgb8)
            .map_err(|e| Error::EncodeFailed(e.to_string()))?;
        Ok(out)
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn sample() -> RgbImage {
        RgbImage::from_fn(12, 9, |x, y| Rgb([(x * 20) as u8, (y * 25) as u8, 77]))
    }

    #[test]
    fn png_is_lossless() {
        let img = sample();
        let bytes = PngCodec.encode(&img).unwrap();
        assert_eq!(PngCodec.decode(&bytes).unwrap(), img);
    }

    #[test]
    fn jpeg_keeps_dimensions() {
        let img = sample();
        let codec = JpegCodec::default();
        let bytes = codec.encode(&img).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(codec.decode(&bytes).unwrap().dimensions(), (12, 9));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = JpegCodec::default().decode(b"not an image").unwrap_err();
        assert!(matches!(err, Error::DecodeFailed(_)));
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(JpegCodec::new(0).quality, 1);
        assert_eq!(JpegCodec::new(200).quality, 100);
    }
}

use image::{Rgb, RgbImage};
use pano::photo::{ImageCodec, PngCodec};
use pano::{Error, Pipeline, StitcherConfig};

#[test]
fn test_facade_reports_decode_failure() {
    let good = PngCodec.encode(&RgbImage::from_pixel(16, 16, Rgb([1, 2, 3]))).unwrap();
    let err = Pipeline::new(StitcherConfig::default()).run(b"\x00\x01", &good).unwrap_err();
    assert!(matches!(err, Error::DecodeFailed(_)));
    assert!(err.is_client_error());
}

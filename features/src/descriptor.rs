use pano_core::{Descriptor, Descriptors, Point2D};
use image::{GrayImage, RgbImage};

/// Detects keypoints and describes them in one pass.
///
/// Descriptors of two images produced by the same extractor must be
/// comparable with the matcher's distance.
pub trait FeatureExtractor: Send + Sync {
    fn detect_and_compute(&self, image: &GrayImage) -> Descriptors;
}

/// Run an extractor on a colour raster, returning each keypoint location with its descriptor.
pub fn extract_features(extractor: &dyn FeatureExtractor, image: &RgbImage) -> Vec<(Point2D, Descriptor)> {
    let gray = image::imageops::grayscale(image);
    extractor
        .detect_and_compute(&gray)
        .descriptors
        .into_iter()
        .map(|d| (d.keypoint.pt(), d))
        .collect()
}

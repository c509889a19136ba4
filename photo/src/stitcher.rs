use crate::compositor::{canvas_size, compose};
use crate::{Error, Result};
use image::RgbImage;
use pano_core::{validate_raster, CorrespondenceSet, Homography};
use pano_features::{
    find_homography, DescriptorMatcher, FeatureExtractor, Matcher, Orb, RansacConfig, MIN_CORRESPONDENCES,
};
use pano_imgproc::{convert_rgb_to_gray, equalize_luma, warp_perspective, Interpolation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub struct StitcherConfig {
    pub ransac: RansacConfig,
    pub interpolation: Interpolation,
    /// Equalize luma of both inputs before feature extraction and compositing.
    pub equalize: bool,
    /// Fixed seed for the RANSAC sampler; fresh entropy per call when `None`.
    pub seed: Option<u64>,
    pub min_matches: usize,
}

impl Default for StitcherConfig {
    fn default() -> Self {
        Self {
            ransac: RansacConfig::default(),
            interpolation: Interpolation::Linear,
            equalize: false,
            seed: None,
            min_matches: MIN_CORRESPONDENCES,
        }
    }
}

impl StitcherConfig {
    pub fn with_ransac(mut self, ransac: RansacConfig) -> Self {
        self.ransac = ransac;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_equalize(mut self, equalize: bool) -> Self {
        self.equalize = equalize;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_min_matches(mut self, min_matches: usize) -> Self {
        self.min_matches = min_matches.max(MIN_CORRESPONDENCES);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Result of one stitch.
#[derive(Debug, Clone)]
pub struct StitchOutput {
    pub panorama: RgbImage,
    /// Maps the first image into the second image's frame.
    pub homography: Homography,
    pub num_matches: usize,
    pub num_inliers: usize,
}

/// Aligns the first image onto the second and composites both on one canvas.
pub struct Stitcher {
    config: StitcherConfig,
    extractor: Box<dyn FeatureExtractor>,
    matcher: Box<dyn DescriptorMatcher>,
}

impl Stitcher {
    /// ORB features with a cross-checked Hamming matcher.
    pub fn new(config: StitcherConfig) -> Self {
        Self {
            config,
            extractor: Box::new(Orb::new()),
            matcher: Box::new(Matcher::new().with_cross_check()),
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn FeatureExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn DescriptorMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &StitcherConfig {
        &self.config
    }

    pub fn stitch(&self, img1: &RgbImage, img2: &RgbImage) -> Result<StitchOutput> {
        validate_raster(img1)?;
        validate_raster(img2)?;

        let (img1, img2) = if self.config.equalize {
            (Cow::Owned(equalize_luma(img1)), Cow::Owned(equalize_luma(img2)))
        } else {
            (Cow::Borrowed(img1), Cow::Borrowed(img2))
        };

        let desc1 = self.extractor.detect_and_compute(&convert_rgb_to_gray(&img1));
        let desc2 = self.extractor.detect_and_compute(&convert_rgb_to_gray(&img2));

        let mut matches = self.matcher.match_descriptors(&desc1, &desc2);
        matches.sort_by_distance();
        tracing::debug!(
            keypoints1 = desc1.len(),
            keypoints2 = desc2.len(),
            matches = matches.len(),
            "matched descriptors"
        );

        if matches.len() < self.config.min_matches {
            return Err(Error::InsufficientMatches {
                found: matches.len(),
                required: self.config.min_matches,
            });
        }

        let correspondences = CorrespondenceSet::from_matches(&matches, &desc1.keypoints(), &desc2.keypoints());
        let mut rng = self.config.rng();
        let mut output = stitch_correspondences(&img1, &img2, &correspondences, &self.config, &mut rng)
            .map_err(Error::into_match_error)?;
        output.num_matches = matches.len();
        Ok(output)
    }
}

impl Default for Stitcher {
    fn default() -> Self {
        Self::new(StitcherConfig::default())
    }
}

/// Estimate, warp and composite from already-known correspondences
/// (sources in `img1`, destinations in `img2`).
pub fn stitch_correspondences<R: Rng + ?Sized>(
    img1: &RgbImage,
    img2: &RgbImage,
    correspondences: &CorrespondenceSet,
    config: &StitcherConfig,
    rng: &mut R,
) -> Result<StitchOutput> {
    let estimate = find_homography(correspondences, &config.ransac, rng)?;

    let (width, height) = canvas_size(img1.width(), img1.height(), img2.width(), img2.height());
    let warped = warp_perspective(img1, &estimate.homography, width, height, config.interpolation)?;
    let panorama = compose(warped, img2)?;

    tracing::debug!(
        width,
        height,
        inliers = estimate.num_inliers,
        mean_error = estimate.mean_error,
        "composited panorama"
    );

    Ok(StitchOutput {
        panorama,
        homography: estimate.homography,
        num_matches: correspondences.len(),
        num_inliers: estimate.num_inliers,
    })
}

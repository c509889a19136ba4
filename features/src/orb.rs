//! ORB (Oriented FAST and Rotated BRIEF) implementation
//!
//! FAST keypoints over an image pyramid, oriented by intensity centroid and
//! described by a steered 256-bit BRIEF test pattern.

use crate::descriptor::FeatureExtractor;
use crate::fast::fast_detect;
use pano_core::{Descriptor, Descriptors, KeyPoint, KeyPoints};
use image::GrayImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// Seed for the BRIEF test pattern. Every `Orb` shares it so descriptors
/// from different images and instances stay comparable.
const PATTERN_SEED: u64 = 0x0b5e_55ed;

const DESCRIPTOR_BYTES: usize = 32;

/// ORB feature detector and descriptor
#[derive(Debug, Clone)]
pub struct Orb {
    n_features: usize,
    scale_factor: f32,
    n_levels: usize,
    patch_size: i32,
    fast_threshold: u8,
    pattern: Vec<(f32, f32, f32, f32)>,
}

impl Default for Orb {
    fn default() -> Self {
        Self {
            n_features: 500,
            scale_factor: 1.2,
            n_levels: 8,
            patch_size: 31,
            fast_threshold: 20,
            pattern: generate_brief_pattern(31),
        }
    }
}

impl Orb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_features(mut self, n: usize) -> Self {
        self.n_features = n;
        self
    }

    pub fn with_n_levels(mut self, n: usize) -> Self {
        self.n_levels = n.max(1);
        self
    }

    pub fn with_scale_factor(mut self, factor: f32) -> Self {
        self.scale_factor = factor.max(1.01);
        self
    }

    pub fn with_fast_threshold(mut self, threshold: u8) -> Self {
        self.fast_threshold = threshold;
        self
    }

    pub fn with_patch_size(mut self, patch_size: i32) -> Self {
        self.patch_size = patch_size.max(5);
        self.pattern = generate_brief_pattern(self.patch_size);
        self
    }

    /// Keypoints closer than this to a border cannot be described.
    fn border(&self) -> i32 {
        // rotated pattern reaches half_patch * sqrt(2)
        ((self.patch_size / 2) as f32 * std::f32::consts::SQRT_2).ceil() as i32 + 1
    }

    fn pyramid(&self, image: &GrayImage) -> Vec<(f32, GrayImage)> {
        let mut levels = Vec::with_capacity(self.n_levels);
        let mut scale = 1.0f32;
        for level in 0..self.n_levels {
            let img = if level == 0 {
                image.clone()
            } else {
                let w = (image.width() as f32 / scale).round() as u32;
                let h = (image.height() as f32 / scale).round() as u32;
                if w <= 2 * self.border() as u32 || h <= 2 * self.border() as u32 {
                    break;
                }
                image::imageops::resize(image, w, h, image::imageops::FilterType::Triangle)
            };
            levels.push((scale, img));
            scale *= self.scale_factor;
        }
        levels
    }

    fn detect_level(&self, img: &GrayImage) -> KeyPoints {
        let border = self.border() as f64;
        let (w, h) = (img.width() as f64, img.height() as f64);
        let mut kps = fast_detect(img, self.fast_threshold, usize::MAX);
        kps.keypoints
            .retain(|k| k.x >= border && k.y >= border && k.x < w - border && k.y < h - border);
        kps.retain_best(self.n_features);
        kps
    }

    fn describe_level(&self, img: &GrayImage, scale: f32, octave: i32, out: &mut Vec<Descriptor>) {
        let smoothed = image::imageops::blur(img, 2.0);
        for kp in self.detect_level(img).keypoints {
            let angle = intensity_centroid_angle(img, kp.x as i32, kp.y as i32, self.patch_size / 2);
            let data = steered_brief(&smoothed, kp.x as i32, kp.y as i32, angle, &self.pattern);
            let full = KeyPoint::new(kp.x * scale as f64, kp.y * scale as f64)
                .with_size(self.patch_size as f64 * scale as f64)
                .with_angle(angle.to_degrees() as f64)
                .with_response(kp.response)
                .with_octave(octave);
            out.push(Descriptor::new(data, full));
        }
    }
}

impl FeatureExtractor for Orb {
    fn detect_and_compute(&self, image: &GrayImage) -> Descriptors {
        let mut all = Vec::new();
        for (level, (scale, img)) in self.pyramid(image).iter().enumerate() {
            self.describe_level(img, *scale, level as i32, &mut all);
        }
        all.sort_by(|a, b| {
            b.keypoint
                .response
                .partial_cmp(&a.keypoint.response)
                .unwrap_or(Ordering::Equal)
        });
        all.truncate(self.n_features);
        Descriptors { descriptors: all }
    }
}

/// Orientation in radians from the first-order moments of a circular patch.
fn intensity_centroid_angle(image: &GrayImage, cx: i32, cy: i32, radius: i32) -> f32 {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let mut m01 = 0.0f64;
    let mut m10 = 0.0f64;
    let r2 = radius * radius;

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let (px, py) = (cx + dx, cy + dy);
            if px < 0 || py < 0 || px >= w || py >= h {
                continue;
            }
            let intensity = image.get_pixel(px as u32, py as u32)[0] as f64;
            m10 += intensity * dx as f64;
            m01 += intensity * dy as f64;
        }
    }

    m01.atan2(m10) as f32
}

fn steered_brief(image: &GrayImage, cx: i32, cy: i32, angle: f32, pattern: &[(f32, f32, f32, f32)]) -> Vec<u8> {
    let (w, h) = (image.width() as i32, image.height() as i32);
    let (sin_a, cos_a) = angle.sin_cos();
    let sample = |x: f32, y: f32| -> u8 {
        let px = (cx as f32 + cos_a * x - sin_a * y).round() as i32;
        let py = (cy as f32 + sin_a * x + cos_a * y).round() as i32;
        image.get_pixel(px.clamp(0, w - 1) as u32, py.clamp(0, h - 1) as u32)[0]
    };

    let mut data = vec![0u8; DESCRIPTOR_BYTES];
    for (i, &(x1, y1, x2, y2)) in pattern.iter().enumerate() {
        if sample(x1, y1) < sample(x2, y2) {
            data[i / 8] |= 1 << (7 - (i % 8));
        }
    }
    data
}

/// Deterministic BRIEF sampling pattern: 256 point pairs inside the patch.
fn generate_brief_pattern(patch_size: i32) -> Vec<(f32, f32, f32, f32)> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let half = (patch_size / 2) as f32;
    (0..DESCRIPTOR_BYTES * 8)
        .map(|_| {
            (
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Isolated bright squares on a dark background; every square has four FAST corners.
    fn blocks(size: u32, period: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if x % period < period / 2 && y % period < period / 2 {
                Luma([230])
            } else {
                Luma([25])
            }
        })
    }

    #[test]
    fn pattern_is_deterministic() {
        assert_eq!(generate_brief_pattern(31), generate_brief_pattern(31));
        assert_eq!(Orb::new().pattern.len(), 256);
    }

    #[test]
    fn detects_and_describes_blocks() {
        let img = blocks(128, 24);
        let descs = Orb::new().with_n_features(50).detect_and_compute(&img);
        assert!(!descs.is_empty());
        assert!(descs.len() <= 50);
        assert!(descs.iter().all(|d| d.size() == DESCRIPTOR_BYTES));
    }

    #[test]
    fn identical_images_give_identical_descriptors() {
        let img = blocks(96, 20);
        let orb = Orb::new().with_n_features(30);
        let a = orb.detect_and_compute(&img);
        let b = orb.detect_and_compute(&img);
        assert_eq!(a.len(), b.len());
        for (da, db) in a.iter().zip(b.iter()) {
            assert_eq!(da.hamming_distance(db), 0);
        }
    }

    #[test]
    fn blank_image_yields_nothing() {
        let img = GrayImage::from_pixel(64, 64, Luma([90]));
        assert!(Orb::new().detect_and_compute(&img).is_empty());
    }

    #[test]
    fn keypoints_keep_clear_of_borders_and_carry_degrees() {
        let img = blocks(80, 20);
        let orb = Orb::new().with_n_levels(1);
        let border = orb.border() as f64;
        let descs = orb.detect_and_compute(&img);
        assert!(!descs.is_empty());
        for d in descs.iter() {
            let kp = d.keypoint;
            assert!(kp.x >= border && kp.y >= border);
            assert!(kp.x < 80.0 - border && kp.y < 80.0 - border);
            assert!((-180.0..=180.0).contains(&kp.angle));
        }
    }
}

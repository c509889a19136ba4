//! FAST-9 corner detector on a 16-pixel Bresenham circle of radius 3.

use pano_core::{KeyPoint, KeyPoints};
use image::GrayImage;

const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required for a corner.
const ARC_LENGTH: usize = 9;

/// Detect corners, suppress non-maxima in a 3x3 window and keep the strongest `max_keypoints`.
pub fn fast_detect(image: &GrayImage, threshold: u8, max_keypoints: usize) -> KeyPoints {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let mut kps = KeyPoints::new();
    if width < 7 || height < 7 {
        return kps;
    }

    let mut scores = vec![0u32; (width * height) as usize];
    for y in 3..height - 3 {
        for x in 3..width - 3 {
            scores[(y * width + x) as usize] = fast_score(image, x, y, threshold);
        }
    }

    for y in 3..height - 3 {
        for x in 3..width - 3 {
            let s = scores[(y * width + x) as usize];
            if s == 0 {
                continue;
            }
            let mut is_max = true;
            'nms: for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let n = scores[((y + dy) * width + (x + dx)) as usize];
                    // ties resolve toward the earlier pixel in raster order
                    if n > s || (n == s && (dy < 0 || (dy == 0 && dx < 0))) {
                        is_max = false;
                        break 'nms;
                    }
                }
            }
            if is_max {
                kps.push(KeyPoint::new(x as f64, y as f64).with_response(s as f64));
            }
        }
    }

    kps.retain_best(max_keypoints);
    kps
}

/// Corner score at `(x, y)`: the sum of absolute differences beyond `threshold`
/// over the circle, or 0 when no arc of 9 brighter or darker pixels exists.
pub fn fast_score(image: &GrayImage, x: i32, y: i32, threshold: u8) -> u32 {
    if x < 3 || y < 3 || x + 3 >= image.width() as i32 || y + 3 >= image.height() as i32 {
        return 0;
    }

    let p = image.get_pixel(x as u32, y as u32)[0] as i32;
    let t = threshold as i32;
    let mut ring = [0i32; 16];
    for (v, &(dx, dy)) in ring.iter_mut().zip(CIRCLE.iter()) {
        *v = image.get_pixel((x + dx) as u32, (y + dy) as u32)[0] as i32;
    }

    let brighter = |v: i32| v > p + t;
    let darker = |v: i32| v < p - t;

    if !has_arc(&ring, brighter) && !has_arc(&ring, darker) {
        return 0;
    }

    let bright_sum: i32 = ring.iter().filter(|&&v| brighter(v)).map(|&v| v - p - t).sum();
    let dark_sum: i32 = ring.iter().filter(|&&v| darker(v)).map(|&v| p - t - v).sum();
    bright_sum.max(dark_sum).max(1) as u32
}

fn has_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> bool {
    let mut run = 0;
    // walk the ring twice so arcs crossing index 0 are seen
    for i in 0..32 {
        if pred(ring[i % 16]) {
            run += 1;
            if run >= ARC_LENGTH {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square(size: u32, lo: u32, hi: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            if x >= lo && x < hi && y >= lo && y < hi {
                Luma([220])
            } else {
                Luma([20])
            }
        })
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        assert!(fast_detect(&img, 20, 100).is_empty());
    }

    #[test]
    fn finds_square_corners() {
        let img = square(40, 10, 30);
        let kps = fast_detect(&img, 20, 100);
        assert!(!kps.is_empty());
        let near = |cx: f64, cy: f64| kps.iter().any(|k| (k.x - cx).abs() <= 2.0 && (k.y - cy).abs() <= 2.0);
        assert!(near(10.0, 10.0));
        assert!(near(29.0, 29.0));
    }

    #[test]
    fn max_keypoints_is_respected() {
        let img = GrayImage::from_fn(64, 64, |x, y| {
            if ((x / 8) + (y / 8)) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let kps = fast_detect(&img, 20, 5);
        assert!(kps.len() <= 5);
    }

    #[test]
    fn tiny_image_is_handled() {
        let img = GrayImage::new(5, 5);
        assert!(fast_detect(&img, 10, 10).is_empty());
        assert_eq!(fast_score(&img, 0, 0, 10), 0);
    }
}

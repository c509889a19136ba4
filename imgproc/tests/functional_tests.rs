use image::{GrayImage, Luma, Rgb, RgbImage};
use nalgebra::Matrix3;
use pano_core::Homography;
use pano_imgproc::*;
use rayon::ThreadPoolBuilder;

fn gradient(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| Luma([(2 * x + y) as u8]))
}

fn rigid(angle_deg: f64, tx: f64, ty: f64) -> Homography {
    let (s, c) = angle_deg.to_radians().sin_cos();
    Homography::from_matrix(Matrix3::new(c, -s, tx, s, c, ty, 0.0, 0.0, 1.0)).unwrap()
}

#[test]
fn test_warp_round_trip_recovers_interior() {
    let img = gradient(80, 60);
    let h = rigid(2.0, 3.0, 2.0);

    let forward = warp_perspective(&img, &h, 80, 60, Interpolation::Linear).unwrap();
    let back = warp_perspective(&forward, &h.inverse().unwrap(), 80, 60, Interpolation::Linear).unwrap();

    for y in 10..50 {
        for x in 10..70 {
            let a = img.get_pixel(x, y)[0] as i32;
            let b = back.get_pixel(x, y)[0] as i32;
            assert!((a - b).abs() <= 2, "({x},{y}): {a} vs {b}");
        }
    }
}

#[test]
fn test_warp_rgb_translation_leaves_black_margin() {
    let img = RgbImage::from_pixel(20, 10, Rgb([10, 200, 30]));
    let warped = warp_perspective(&img, &Homography::translation(5.0, 0.0), 30, 10, Interpolation::Nearest).unwrap();

    assert_eq!(warped.dimensions(), (30, 10));
    assert_eq!(warped.get_pixel(2, 5).0, [0, 0, 0]);
    assert_eq!(warped.get_pixel(5, 5).0, [10, 200, 30]);
    assert_eq!(warped.get_pixel(24, 5).0, [10, 200, 30]);
    assert_eq!(warped.get_pixel(25, 5).0, [0, 0, 0]);
}

#[test]
fn test_warp_singular_homography_rejected() {
    let singular = Matrix3::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0, 0.0, 0.0, 1.0);
    let h = Homography::from_matrix(singular).unwrap();
    assert!(warp_perspective(&gradient(4, 4), &h, 4, 4, Interpolation::Linear).is_err());
}

#[test]
fn test_equalize_luma_preserves_chroma_of_grey() {
    let img = RgbImage::from_fn(32, 8, |x, _| {
        let v = 90 + x as u8;
        Rgb([v, v, v])
    });
    let eq = equalize_luma(&img);
    for p in eq.pixels() {
        assert!((p[0] as i32 - p[1] as i32).abs() <= 1);
        assert!((p[1] as i32 - p[2] as i32).abs() <= 1);
    }
    assert!(eq.get_pixel(0, 0)[0] < 5);
    assert!(eq.get_pixel(31, 0)[0] > 250);
}

#[test]
fn test_gray_conversion_in_custom_pool() {
    let pool = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let rgb = RgbImage::from_pixel(100, 100, Rgb([100, 150, 200]));

    let gray = convert_rgb_to_gray_in_pool(&rgb, Some(&pool));
    assert_eq!(gray.width(), 100);
    assert_eq!(gray.get_pixel(0, 0)[0], 140);
    assert_eq!(gray, convert_rgb_to_gray(&rgb));
}

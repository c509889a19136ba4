//! Benchmarks for the stitching hot paths: RANSAC estimation and perspective warping.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgb, RgbImage};
use nalgebra::Matrix3;
use pano::core::{Correspondence, CorrespondenceSet, Homography, Point2D};
use pano::features::{find_homography, RansacConfig};
use pano::imgproc::{warp_perspective, Interpolation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

fn ground_truth() -> Homography {
    Homography::from_matrix(Matrix3::new(1.05, 0.02, 30.0, -0.01, 0.98, 5.0, 1e-4, -5e-5, 1.0))
        .unwrap_or_else(|_| Homography::identity())
}

/// Noisy correspondences under `ground_truth` with a given outlier share.
fn noisy_correspondences(n: usize, outlier_ratio: f64, seed: u64) -> CorrespondenceSet {
    let h = ground_truth();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let src = Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0));
            let dst = if rng.gen_bool(outlier_ratio) {
                Point2D::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0))
            } else {
                let p = h.apply(&src).unwrap_or(src);
                Point2D::new(p.x + rng.gen_range(-0.5..0.5), p.y + rng.gen_range(-0.5..0.5))
            };
            Correspondence::exact(src, dst)
        })
        .collect()
}

fn benchmark_find_homography(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_homography");
    group.measurement_time(Duration::from_secs(5));

    for outliers in [0.1, 0.3, 0.5] {
        let set = noisy_correspondences(300, outliers, 1);
        let config = RansacConfig::default();
        group.bench_with_input(
            BenchmarkId::new("outliers", format!("{:.0}%", outliers * 100.0)),
            &set,
            |b, set| {
                let mut rng = StdRng::seed_from_u64(7);
                b.iter(|| find_homography(black_box(set), &config, &mut rng));
            },
        );
    }

    group.finish();
}

fn benchmark_warp(c: &mut Criterion) {
    let mut group = c.benchmark_group("warp_perspective");
    group.sample_size(20);
    let h = ground_truth();

    for size in [256u32, 512, 1024] {
        let img = RgbImage::from_fn(size, size, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        for interpolation in [Interpolation::Nearest, Interpolation::Linear] {
            group.bench_with_input(
                BenchmarkId::new(format!("{interpolation:?}"), format!("{size}x{size}")),
                &img,
                |b, img| {
                    b.iter(|| warp_perspective(black_box(img), &h, size * 2, size, interpolation));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_find_homography, benchmark_warp);
criterion_main!(benches);

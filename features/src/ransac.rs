//! RANSAC homography estimation for geometric verification
//!
//! Minimal samples of four correspondences are solved with a normalized DLT;
//! the best consensus set is refit by least squares over all of its members.

use pano_core::{
    Correspondence, CorrespondenceSet, Error, Homography, Point2D, Ransac, Result, RobustConfig,
    RobustModel,
};
use nalgebra::{DMatrix, Matrix3};
use rand::Rng;

/// Pairs needed to determine a homography.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Sine of the smallest angle at which three sample points still count as non-collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone)]
pub struct RansacConfig {
    /// Reprojection error in pixels below which a pair is an inlier.
    pub threshold: f64,
    pub max_iterations: usize,
    pub confidence: f64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            max_iterations: 2000,
            confidence: 0.995,
        }
    }
}

impl RansacConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    fn robust_config(&self) -> RobustConfig {
        RobustConfig {
            threshold: self.threshold,
            max_iterations: self.max_iterations,
            confidence: self.confidence,
            min_inliers: MIN_CORRESPONDENCES,
            min_valid_samples: MIN_CORRESPONDENCES,
        }
    }
}

/// Best-fit homography with its inlier mask, aligned to the input order.
#[derive(Debug, Clone)]
pub struct HomographyEstimate {
    pub homography: Homography,
    pub inliers: Vec<bool>,
    pub num_inliers: usize,
    pub mean_error: f64,
}

pub struct HomographyEstimator;

impl RobustModel<Correspondence> for HomographyEstimator {
    type Model = Homography;

    fn min_sample_size(&self) -> usize {
        MIN_CORRESPONDENCES
    }

    fn is_degenerate(&self, sample: &[&Correspondence]) -> bool {
        let src: Vec<Point2D> = sample.iter().map(|c| c.src).collect();
        let dst: Vec<Point2D> = sample.iter().map(|c| c.dst).collect();
        has_collinear_triple(&src) || has_collinear_triple(&dst)
    }

    fn estimate(&self, sample: &[&Correspondence]) -> Option<Homography> {
        solve_dlt_homography(sample)
    }

    fn refit(&self, inliers: &[&Correspondence]) -> Option<Homography> {
        solve_dlt_homography(inliers)
    }

    fn compute_error(&self, model: &Homography, datum: &Correspondence) -> f64 {
        model.reprojection_error(datum)
    }
}

/// Estimate the homography mapping source points onto destination points.
pub fn find_homography<R: Rng + ?Sized>(
    correspondences: &CorrespondenceSet,
    config: &RansacConfig,
    rng: &mut R,
) -> Result<HomographyEstimate> {
    let n = correspondences.len();
    if n < MIN_CORRESPONDENCES {
        return Err(Error::InsufficientCorrespondences {
            found: n,
            required: MIN_CORRESPONDENCES,
        });
    }

    if config.max_iterations == 0 {
        return Err(Error::InvalidInput("max_iterations must be at least 1".into()));
    }

    let robust = config.robust_config();
    let ransac = Ransac::new(robust.clone());
    let result = ransac.run(&HomographyEstimator, correspondences.as_slice(), rng);

    tracing::debug!(
        correspondences = n,
        attempts = result.attempts,
        valid_samples = result.valid_samples,
        inliers = result.num_inliers,
        "ransac finished"
    );

    if result.valid_samples == 0 {
        return Err(Error::DegenerateHomography(format!(
            "all {} sampled sets were collinear or singular",
            result.attempts
        )));
    }
    if result.valid_samples < robust.min_valid_samples {
        return Err(Error::HomographyEstimationFailed(format!(
            "only {} non-degenerate samples in {} attempts",
            result.valid_samples, result.attempts
        )));
    }

    match result.model {
        Some(homography) if result.num_inliers >= MIN_CORRESPONDENCES => Ok(HomographyEstimate {
            homography,
            inliers: result.inliers,
            num_inliers: result.num_inliers,
            mean_error: result.residual,
        }),
        _ => Err(Error::HomographyEstimationFailed(format!(
            "images do not overlap enough: best model has {} inliers",
            result.num_inliers
        ))),
    }
}

fn has_collinear_triple(pts: &[Point2D]) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let ab = pts[j] - pts[i];
                let ac = pts[k] - pts[i];
                let cross = ab.x * ac.y - ab.y * ac.x;
                if cross.abs() <= COLLINEAR_TOLERANCE * ab.norm() * ac.norm() {
                    return true;
                }
            }
        }
    }
    false
}

/// Hartley normalization: zero mean, average distance sqrt(2).
fn normalize_points(pts: &[Point2D]) -> Option<(Vec<Point2D>, Matrix3<f64>)> {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if mean_dist < 1e-12 {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| Point2D::new(s * (p.x - cx), s * (p.y - cy)))
        .collect();
    Some((normalized, t))
}

/// Solve DLT for homography using SVD
fn solve_dlt_homography(pairs: &[&Correspondence]) -> Option<Homography> {
    let n = pairs.len();
    if n < MIN_CORRESPONDENCES {
        return None;
    }

    let src: Vec<Point2D> = pairs.iter().map(|c| c.src).collect();
    let dst: Vec<Point2D> = pairs.iter().map(|c| c.dst).collect();
    let (src_n, t_src) = normalize_points(&src)?;
    let (dst_n, t_dst) = normalize_points(&dst)?;

    // Pad to at least 9 rows so the null vector is among the singular vectors.
    let mut a = DMatrix::<f64>::zeros((2 * n).max(9), 9);
    for (i, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        let (x1, y1, x2, y2) = (s.x, s.y, d.x, d.y);
        let r0 = 2 * i;
        let r1 = r0 + 1;

        a[(r0, 0)] = -x1;
        a[(r0, 1)] = -y1;
        a[(r0, 2)] = -1.0;
        a[(r0, 6)] = x2 * x1;
        a[(r0, 7)] = x2 * y1;
        a[(r0, 8)] = x2;

        a[(r1, 3)] = -x1;
        a[(r1, 4)] = -y1;
        a[(r1, 5)] = -1.0;
        a[(r1, 6)] = y2 * x1;
        a[(r1, 7)] = y2 * y1;
        a[(r1, 8)] = y2;
    }

    let svd = a.svd(false, true);
    let smallest = svd.singular_values.imin();
    let v_t = svd.v_t?;
    let h = v_t.row(smallest);

    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);
    let h_full = t_dst.try_inverse()? * h_norm * t_src;
    Homography::from_matrix(h_full).ok()
}

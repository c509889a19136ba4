use crate::{Correspondence, Error, Point2D, Result};
use nalgebra::{Matrix3, Vector3};

/// Threshold below which a homogeneous `w` is treated as zero.
pub const W_EPSILON: f64 = 1e-10;

/// Planar projective transform with `H[2][2] == 1`.
///
/// Instances are only built through [`Homography::from_matrix`], which
/// normalizes, so two homographies can be compared entry by entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(Error::DegenerateHomography("matrix has non-finite entries".into()));
        }
        let scale = m[(2, 2)];
        if scale.abs() < W_EPSILON {
            return Err(Error::DegenerateHomography(format!(
                "H[2][2] = {scale:e} cannot be normalized"
            )));
        }
        Ok(Self { matrix: m / scale })
    }

    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            matrix: Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0),
        }
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn inverse(&self) -> Result<Self> {
        let inv = self
            .matrix
            .try_inverse()
            .ok_or_else(|| Error::DegenerateHomography("matrix is singular".into()))?;
        Self::from_matrix(inv)
    }

    /// Map a point; `None` when it lands at infinity.
    pub fn apply(&self, p: &Point2D) -> Option<Point2D> {
        let v = self.matrix * Vector3::new(p.x, p.y, 1.0);
        if v[2].abs() < W_EPSILON {
            return None;
        }
        Some(Point2D::new(v[0] / v[2], v[1] / v[2]))
    }

    /// Euclidean distance between `H * src` and `dst`.
    pub fn reprojection_error(&self, c: &Correspondence) -> f64 {
        match self.apply(&c.src) {
            Some(p) => ((p.x - c.dst.x).powi(2) + (p.y - c.dst.y).powi(2)).sqrt(),
            None => f64::INFINITY,
        }
    }

    pub fn approx_eq(&self, other: &Homography, tol: f64) -> bool {
        self.matrix
            .iter()
            .zip(other.matrix.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

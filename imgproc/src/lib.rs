//! Raster operations used by the stitching pipeline: perspective
//! resampling, colour conversion and histogram equalization.

pub mod color;
pub mod geometry;
pub mod histogram;

pub use color::*;
pub use geometry::*;
pub use histogram::*;

pub use pano_core::{Error, Result};

/// Pixel sampling policy for resampling.
///
/// `Linear` is bilinear over the 2x2 neighbourhood and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
}

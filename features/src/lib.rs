//! Feature extraction, matching and homography estimation for two-view stitching.

pub mod descriptor;
pub mod fast;
pub mod matcher;
pub mod orb;
pub mod ransac;

pub use descriptor::*;
pub use fast::*;
pub use matcher::*;
pub use orb::*;
pub use ransac::*;

pub use pano_core::{Error, Result};

pub use pano_core as core;
pub use pano_features as features;
pub use pano_imgproc as imgproc;
pub use pano_photo as photo;
pub use pano_service as service;

pub use pano_core::{Error, Homography, Result};
pub use pano_photo::{Pipeline, StitchOutput, Stitcher, StitcherConfig};

pub mod correspondence;
pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod image;
pub mod keypoint;
pub mod robust;

pub use correspondence::*;
pub use descriptor::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use self::image::*;
pub use keypoint::*;
pub use robust::*;

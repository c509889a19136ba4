//! Panorama assembly: canvas compositing, the raster-level stitcher and the
//! byte-level pipeline with pluggable codec and storage.
//!
//! # Example
//!
//! ```no_run
//! # use pano_photo::{Pipeline, StitcherConfig};
//! # fn run(a: &[u8], b: &[u8]) -> pano_photo::Result<Vec<u8>> {
//! let pipeline = Pipeline::new(StitcherConfig::default().with_equalize(true));
//! let jpeg = pipeline.run(a, b)?;
//! # Ok(jpeg)
//! # }
//! ```

pub use pano_core::{Error, Result};

/// Image encode/decode capabilities
pub mod codec;
/// Output canvas sizing and reference overwrite
pub mod compositor;
/// Decode, stitch, encode
pub mod pipeline;
/// Byte storage backends
pub mod storage;
/// Two-image panoramic stitching
pub mod stitcher;

pub use codec::*;
pub use compositor::*;
pub use pipeline::*;
pub use storage::*;
pub use stitcher::*;

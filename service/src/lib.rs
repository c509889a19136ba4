//! Request handling for the stitching service and the `pano` command line.
//!
//! The handler is transport-agnostic: a front end turns its request into a
//! [`StitchRequest`] and writes back the [`StitchResponse`].

pub mod config;
pub mod handler;
pub mod timeout;

pub use config::*;
pub use handler::*;
pub use timeout::*;

pub use pano_core::{Error, Result};

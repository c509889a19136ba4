use crate::codec::{ImageCodec, JpegCodec};
use crate::stitcher::{Stitcher, StitcherConfig};
use crate::storage::ImageStorage;
use crate::{Error, Result};
use std::time::Instant;

/// Decode two encoded images, stitch them and encode the panorama.
pub struct Pipeline {
    stitcher: Stitcher,
    codec: Box<dyn ImageCodec>,
}

impl Pipeline {
    /// JPEG output at the default quality.
    pub fn new(config: StitcherConfig) -> Self {
        Self {
            stitcher: Stitcher::new(config),
            codec: Box::new(JpegCodec::default()),
        }
    }

    pub fn with_stitcher(mut self, stitcher: Stitcher) -> Self {
        self.stitcher = stitcher;
        self
    }

    pub fn with_codec(mut self, codec: Box<dyn ImageCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn stitcher(&self) -> &Stitcher {
        &self.stitcher
    }

    pub fn mime_type(&self) -> &'static str {
        self.codec.mime_type()
    }

    pub fn run(&self, image1: &[u8], image2: &[u8]) -> Result<Vec<u8>> {
        let started = Instant::now();
        let img1 = self.decode("image1", image1)?;
        let img2 = self.decode("image2", image2)?;

        let output = self.stitcher.stitch(&img1, &img2)?;
        let encoded = self.codec.encode(&output.panorama)?;

        tracing::info!(
            width = output.panorama.width(),
            height = output.panorama.height(),
            matches = output.num_matches,
            inliers = output.num_inliers,
            bytes = encoded.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stitched panorama"
        );
        Ok(encoded)
    }

    /// Same as [`Pipeline::run`], reading inputs from and writing the result to `storage`.
    pub fn run_stored(&self, storage: &dyn ImageStorage, key1: &str, key2: &str, out_key: &str) -> Result<()> {
        let image1 = storage.load(key1)?;
        let image2 = storage.load(key2)?;
        let encoded = self.run(&image1, &image2)?;
        storage.store(out_key, &encoded)
    }

    fn decode(&self, name: &str, bytes: &[u8]) -> Result<image::RgbImage> {
        if bytes.is_empty() {
            return Err(Error::DecodeFailed(format!("{name} is empty")));
        }
        self.codec.decode(bytes).map_err(|e| match e {
            Error::DecodeFailed(msg) => Error::DecodeFailed(format!("{name}: {msg}")),
            other => other,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(StitcherConfig::default())
    }
}

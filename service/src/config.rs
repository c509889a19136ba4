use pano_core::{Error, Result};
use pano_features::RansacConfig;
use pano_imgproc::Interpolation;
use pano_photo::{ImageCodec, JpegCodec, PngCodec, StitcherConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

/// Immutable settings shared by every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub allowed_origins: Vec<String>,
    pub ransac_threshold: f64,
    pub max_iterations: usize,
    pub confidence: f64,
    /// Equalize luma of both uploads before stitching.
    pub equalize: bool,
    /// Fixed RANSAC seed, for reproducible responses.
    pub seed: Option<u64>,
    pub timeout_ms: u64,
    pub jpeg_quality: u8,
    pub output_format: OutputFormat,
    /// Per-image upload limit.
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".into(),
                "http://localhost:5174".into(),
                "https://smart-pano.vercel.app/".into(),
            ],
            ransac_threshold: 5.0,
            max_iterations: 2000,
            confidence: 0.995,
            equalize: true,
            seed: None,
            timeout_ms: 30_000,
            jpeg_quality: 95,
            output_format: OutputFormat::Jpeg,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::Storage(format!("{}: {e}", path.display())))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| Error::InvalidInput(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.ransac_threshold.is_finite() && self.ransac_threshold > 0.0) {
            return Err(Error::InvalidInput(format!(
                "ransac_threshold must be positive, got {}",
                self.ransac_threshold
            )));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidInput("max_iterations must be at least 1".into()));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(Error::InvalidInput(format!(
                "confidence must lie in (0, 1), got {}",
                self.confidence
            )));
        }
        if self.timeout_ms == 0 {
            return Err(Error::InvalidInput("timeout_ms must be at least 1".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidInput(format!(
                "jpeg_quality must lie in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::InvalidInput("max_upload_bytes must be at least 1".into()));
        }
        Ok(())
    }

    pub fn stitcher_config(&self) -> StitcherConfig {
        StitcherConfig {
            ransac: RansacConfig::default()
                .with_threshold(self.ransac_threshold)
                .with_max_iterations(self.max_iterations)
                .with_confidence(self.confidence),
            interpolation: Interpolation::Linear,
            equalize: self.equalize,
            seed: self.seed,
            ..StitcherConfig::default()
        }
    }

    pub fn codec(&self) -> Box<dyn ImageCodec> {
        match self.output_format {
            OutputFormat::Jpeg => Box::new(JpegCodec::new(self.jpeg_quality)),
            OutputFormat::Png => Box::new(PngCodec),
        }
    }

    /// Exact match after dropping any trailing `/`.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed_origins
            .iter()
            .any(|allowed| allowed.trim_end_matches('/') == origin)
    }
}

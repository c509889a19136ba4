use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures a stitch request can end in.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not decode image: {0}")]
    DecodeFailed(String),

    #[error("Insufficient correspondences: found {found}, need at least {required}")]
    InsufficientCorrespondences { found: usize, required: usize },

    #[error("Insufficient matches: found {found}, need at least {required}")]
    InsufficientMatches { found: usize, required: usize },

    #[error("Degenerate homography: {0}")]
    DegenerateHomography(String),

    #[error("Homography estimation failed: {0}")]
    HomographyEstimationFailed(String),

    #[error("Failed to encode result image: {0}")]
    EncodeFailed(String),

    #[error("Pipeline timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code, used in structured error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Error::DecodeFailed(_) => "decode_failed",
            Error::InsufficientCorrespondences { .. } => "insufficient_correspondences",
            Error::InsufficientMatches { .. } => "insufficient_matches",
            Error::DegenerateHomography(_) => "degenerate_homography",
            Error::HomographyEstimationFailed(_) => "homography_estimation_failed",
            Error::EncodeFailed(_) => "encode_failed",
            Error::Timeout(_) => "timeout",
            Error::Storage(_) => "storage_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::MethodNotAllowed(_) => "method_not_allowed",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Whether the caller is at fault (bad or insufficiently overlapping input).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::DecodeFailed(_)
                | Error::InsufficientCorrespondences { .. }
                | Error::InsufficientMatches { .. }
                | Error::HomographyEstimationFailed(_)
                | Error::InvalidInput(_)
                | Error::MethodNotAllowed(_)
        )
    }

    /// Re-tag a correspondence shortage as a match shortage.
    ///
    /// The orchestrator reports the shortage in terms of matcher output.
    pub fn into_match_error(self) -> Self {
        match self {
            Error::InsufficientCorrespondences { found, required } => {
                Error::InsufficientMatches { found, required }
            }
            other => other,
        }
    }
}

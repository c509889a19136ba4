use crate::config::ServiceConfig;
use crate::handler::{failure, handle_stitch, StitchRequest, StitchResponse};
use pano_core::Error;
use std::sync::Arc;
use std::time::Duration;

/// Run [`handle_stitch`] on the blocking pool under the configured wall-clock limit.
///
/// On expiry the caller gets a 504 right away; the pipeline thread runs to
/// completion in the background and its result is dropped.
pub async fn handle_stitch_with_timeout(config: Arc<ServiceConfig>, request: StitchRequest) -> StitchResponse {
    let limit = Duration::from_millis(config.timeout_ms);
    let origin = request.origin.clone();

    let worker_config = Arc::clone(&config);
    let task = tokio::task::spawn_blocking(move || handle_stitch(&worker_config, request));

    match tokio::time::timeout(limit, task).await {
        Ok(Ok(response)) => response,
        Ok(Err(join_error)) => {
            tracing::error!(error = %join_error, "stitch worker panicked");
            failure(&config, origin.as_deref(), &Error::Internal(join_error.to_string()))
        }
        Err(_) => {
            tracing::warn!(timeout_ms = config.timeout_ms, "stitch request timed out");
            failure(&config, origin.as_deref(), &Error::Timeout(limit))
        }
    }
}

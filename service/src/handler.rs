use crate::config::ServiceConfig;
use pano_core::{Error, Result};
use pano_photo::Pipeline;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// One upload of two images, as seen by a front end.
#[derive(Debug, Clone, Default)]
pub struct StitchRequest {
    pub method: String,
    pub origin: Option<String>,
    pub image1: Option<Vec<u8>>,
    pub image2: Option<Vec<u8>>,
}

impl StitchRequest {
    pub fn post(image1: Vec<u8>, image2: Vec<u8>) -> Self {
        Self {
            method: "POST".into(),
            origin: None,
            image1: Some(image1),
            image2: Some(image2),
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchResponse {
    pub status: u16,
    pub content_type: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// JSON payload of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl StitchResponse {
    pub fn error(err: &Error) -> Self {
        let body = ErrorBody {
            code: err.code().to_string(),
            message: err.to_string(),
        };
        Self {
            status: status_for(err),
            content_type: "application/json".into(),
            headers: Vec::new(),
            body: serde_json::to_vec(&body).unwrap_or_default(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn with_cors(mut self, config: &ServiceConfig, origin: Option<&str>) -> Self {
        if let Some(origin) = origin.filter(|o| config.is_origin_allowed(o)) {
            self.headers
                .push(("Access-Control-Allow-Origin".into(), origin.to_string()));
            self.headers.push(("Vary".into(), "Origin".into()));
        }
        self
    }
}

pub fn status_for(err: &Error) -> u16 {
    match err {
        Error::MethodNotAllowed(_) => 405,
        Error::Timeout(_) => 504,
        e if e.is_client_error() => 400,
        _ => 500,
    }
}

/// Stitch the two uploaded images of `request` into one encoded panorama.
pub fn handle_stitch(config: &ServiceConfig, request: StitchRequest) -> StitchResponse {
    let started = Instant::now();
    let origin = request.origin.clone();
    let method = request.method.clone();

    let response = match run(config, request) {
        Ok((content_type, body)) => StitchResponse {
            status: 200,
            content_type: content_type.to_string(),
            headers: Vec::new(),
            body,
        },
        Err(err) => {
            tracing::warn!(code = err.code(), error = %err, "stitch request failed");
            StitchResponse::error(&err)
        }
    };

    tracing::info!(
        method = %method,
        status = response.status,
        bytes = response.body.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "handled stitch request"
    );
    response.with_cors(config, origin.as_deref())
}

/// Response for a request that never reached the pipeline.
pub(crate) fn failure(config: &ServiceConfig, origin: Option<&str>, err: &Error) -> StitchResponse {
    StitchResponse::error(err).with_cors(config, origin)
}

fn run(config: &ServiceConfig, request: StitchRequest) -> Result<(&'static str, Vec<u8>)> {
    if !request.method.eq_ignore_ascii_case("POST") {
        return Err(Error::MethodNotAllowed(format!("{} is not supported, use POST", request.method)));
    }
    let image1 = upload(config, "image1", request.image1)?;
    let image2 = upload(config, "image2", request.image2)?;

    let pipeline = Pipeline::new(config.stitcher_config()).with_codec(config.codec());
    let body = pipeline.run(&image1, &image2)?;
    Ok((pipeline.mime_type(), body))
}

fn upload(config: &ServiceConfig, name: &str, part: Option<Vec<u8>>) -> Result<Vec<u8>> {
    let bytes = part.ok_or_else(|| Error::InvalidInput(format!("missing part '{name}'")))?;
    if bytes.len() > config.max_upload_bytes {
        return Err(Error::InvalidInput(format!(
            "{name} is {} bytes, limit is {}",
            bytes.len(),
            config.max_upload_bytes
        )));
    }
    Ok(bytes)
}

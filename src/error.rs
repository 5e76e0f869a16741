//! Error types for the coloring-book generation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single call across the network boundary.
///
/// Every variant is transient from the pipeline's point of view: the
/// retrying caller logs it, waits, and tries again.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Service returned an empty response")]
    EmptyResponse,

    #[error("Failed to decode image: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ServiceError::Timeout(error.to_string())
        } else if let Some(status) = error.status() {
            ServiceError::Status {
                status: status.as_u16(),
                body: error.to_string(),
            }
        } else {
            ServiceError::Http(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::Parse(error.to_string())
    }
}

impl From<image::ImageError> for ServiceError {
    fn from(error: image::ImageError) -> Self {
        ServiceError::Decode(error.to_string())
    }
}

/// Upscaling failure. Recovered locally by writing the original image.
#[derive(Debug, Error)]
pub enum UpscaleError {
    #[error("Upscale factor must be at least 1, got {0}")]
    InvalidFactor(u32),

    #[error("Upscaled image {width}x{height} exceeds the {max_pixels} pixel ceiling")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    #[error("Upscaler failed: {0}")]
    Backend(String),
}

/// Errors surfaced from a run.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode image for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    #[error("Malformed prompt file {path}: {message}")]
    MalformedPrompts { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Service setup failed: {0}")]
    ServiceSetup(String),

    #[error("Worker task failed: {0}")]
    WorkerFailed(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl BookError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BookError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for BookError {
    fn from(err: config::ConfigError) -> Self {
        BookError::ConfigError(err.to_string())
    }
}

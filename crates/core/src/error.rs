//! Error types for the Konspekt core library.
//!
//! `KonspektError` classifies every failure mode so the boundary layer can
//! map each kind onto an HTTP status (see spec §7). The tail variants
//! (`IoError`/`JsonError`/`ApiError`/`MissingApiKey`) mirror the reference
//! `bratishka-core` error shape.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KonspektError {
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    #[error("captions are disabled for video {video_id}")]
    CaptionsDisabled { video_id: String },

    #[error("transcript not found for video {video_id}: {reason}")]
    TranscriptNotFound { video_id: String, reason: String },

    #[error("transcript fetch failed for video {video_id}: {reason}")]
    TranscriptFetchFailed { video_id: String, reason: String },

    #[error("model returned malformed output: {reason}")]
    MalformedOutput { reason: String },

    #[error("provider quota exceeded: {reason}")]
    ProviderQuota { reason: String },

    #[error("provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl KonspektError {
    /// Construct a `Validation` error from any string-like reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        KonspektError::Validation {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KonspektError>;

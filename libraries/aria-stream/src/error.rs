//! Error types for the streaming API client.

use aria_core::PlaybackError;
use thiserror::Error;

/// Errors that can occur when talking to the streaming service.
#[derive(Error, Debug)]
pub enum StreamError {
    /// Invalid service base URL
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service refused the track for rights reasons
    #[error("Track is not licensed for playback")]
    CopyrightRestricted,

    /// The service answered with an application-level error
    #[error("Service error (status {status}, code {err_code})")]
    Api {
        /// Application status field from the response body
        status: i64,
        /// Service error code, 0 when absent
        err_code: i64,
    },

    /// Failed to parse a service response
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl From<StreamError> for PlaybackError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::CopyrightRestricted => PlaybackError::CopyrightRestricted,
            StreamError::Request(e) => PlaybackError::network(e.to_string()),
            other => PlaybackError::unknown(other.to_string()),
        }
    }
}

/// Result type for streaming client operations.
pub type Result<T> = std::result::Result<T, StreamError>;

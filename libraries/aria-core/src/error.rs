/// Core error types for Aria Player
use thiserror::Error;

/// Result type alias using `PlaybackError`
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Unified error type for URL resolution and playback.
///
/// All variants are non-fatal to the session: they are captured into the
/// session state and surfaced to the UI rather than tearing anything down.
#[derive(Error, Debug, Clone)]
pub enum PlaybackError {
    /// Track carries no resolvable identity (empty content hash)
    #[error("track has no resolvable identity")]
    InvalidIdentity,

    /// The resolver exhausted every URL candidate and fallback tier
    #[error("no playable URL available")]
    UrlUnavailable,

    /// Transport-level failure talking to the streaming API
    #[error("network error: {0}")]
    Network(String),

    /// The service refused the track for rights reasons
    #[error("track is copyright restricted")]
    CopyrightRestricted,

    /// Anything the other variants do not cover
    #[error("{0}")]
    Unknown(String),
}

impl PlaybackError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an unknown error
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}

impl From<serde_json::Error> for PlaybackError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(err.to_string())
    }
}

/// Collaborator traits for Aria Player
///
/// The playback session only ever talks to the outside world through these
/// seams: URL resolution, the platform media pipeline, and the key-value
/// persistence substrate.
use crate::error::Result;
use crate::types::{ResolveRequest, ResolvedUrls};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Resolves a track identity to playable URL candidates.
///
/// Implemented by the streaming API client. Concurrent calls for different
/// requests may run in parallel; the trait performs no request coalescing.
#[async_trait]
pub trait UrlSource: Send + Sync {
    /// Ask the service for URL candidates for one track at one quality tier.
    async fn resolve(&self, request: &ResolveRequest) -> Result<ResolvedUrls>;
}

/// Controllable handle onto the platform's media pipeline.
///
/// The session issues commands through this trait; position, duration, and
/// terminal-state feedback flows back as [`crate::types::PlayerEvent`]s wired
/// up by the composition root.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Load a stream, replacing whatever was loaded before.
    async fn load(&self, url: &Url) -> Result<()>;

    /// Start or resume playback of the loaded stream.
    async fn play(&self) -> Result<()>;

    /// Pause playback, keeping the stream loaded.
    async fn pause(&self) -> Result<()>;

    /// Jump to a position within the loaded stream.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Set the output volume, `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Set the playback rate, `0.5..=2.0`.
    async fn set_rate(&self, rate: f32) -> Result<()>;
}

/// Key-value persistence substrate.
///
/// Values are JSON blobs; the session treats every write as best-effort.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a value under a key, replacing any previous value.
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Load the value stored under a key, if any.
    async fn load(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Remove a key and its value.
    async fn delete(&self, key: &str) -> Result<()>;
}

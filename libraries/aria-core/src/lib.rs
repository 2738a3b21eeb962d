//! Aria Player Core
//!
//! Platform-agnostic types, traits, and error handling shared by the
//! playback session and the streaming API client.
//!
//! The core crate defines:
//! - **Domain Types**: `TrackRef`, `AudioQuality`, `PlayMode`, `DeviceState`
//! - **Collaborator Traits**: `UrlSource`, `MediaPlayer`, `KeyValueStore`
//! - **Error Handling**: unified `PlaybackError` and `Result` types
//!
//! Everything platform-specific (audio output, HTTP transport, the
//! persistence substrate) lives behind the traits in [`traits`].

#![forbid(unsafe_code)]

pub mod error;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{PlaybackError, Result};
pub use store::MemoryStore;
pub use traits::{KeyValueStore, MediaPlayer, UrlSource};
pub use types::{
    AudioQuality, DeviceState, PlayMode, PlayerEvent, ResolveRequest, ResolvedUrls, TrackFlags,
    TrackRef,
};

//! Core types shared by the playback session and the streaming client

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Rights/encoding availability flags carried on a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFlags {
    /// Track requires a VIP account for full playback
    #[serde(default)]
    pub vip: bool,

    /// A high-bitrate encoding exists
    #[serde(default)]
    pub hq: bool,

    /// A lossless encoding exists
    #[serde(default)]
    pub sq: bool,
}

/// Identity and display metadata for a queued track.
///
/// Immutable once constructed. The `id` is the service's content hash and is
/// the stable identity used for dedupe and cache keys; when it is empty,
/// identity falls back to `(title, artist)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRef {
    /// Content hash (stable identity); may be empty for locally built refs
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    #[serde(default)]
    pub album: Option<String>,

    /// Cover art reference (asset name or URL)
    #[serde(default)]
    pub cover: Option<String>,

    /// Duration as reported by the catalog; corrected once the player
    /// reports the real duration after a load
    #[serde(default)]
    pub duration_hint: Duration,

    /// Album identifier, forwarded to the resolution endpoint when present
    #[serde(default)]
    pub album_id: Option<String>,

    /// Album audio identifier, forwarded to the resolution endpoint
    #[serde(default)]
    pub album_audio_id: Option<String>,

    /// Availability flags
    #[serde(default)]
    pub flags: TrackFlags,
}

impl TrackRef {
    /// Whether this ref carries a resolvable content hash.
    pub fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }

    /// Identity comparison: by content hash when present, else by
    /// `(title, artist)`.
    pub fn same_identity(&self, other: &TrackRef) -> bool {
        if self.has_identity() && other.has_identity() {
            self.id == other.id
        } else if !self.has_identity() && !other.has_identity() {
            self.title == other.title && self.artist == other.artist
        } else {
            false
        }
    }
}

impl PartialEq for TrackRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for TrackRef {}

impl Hash for TrackRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.has_identity() {
            self.id.hash(state);
        } else {
            self.title.hash(state);
            self.artist.hash(state);
        }
    }
}

/// Audio quality tier requested from the resolution service.
///
/// Tiers are ranked; `Standard` is the baseline every other tier falls back
/// to when the service has no URL for the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioQuality {
    /// 128 kbps baseline, always available
    Standard,

    /// 320 kbps high bitrate
    High,

    /// Lossless (FLAC)
    Lossless,

    /// Special-effect spatial rendition
    Atmos,
}

impl AudioQuality {
    /// The tier every other tier falls back to.
    pub fn baseline() -> Self {
        Self::Standard
    }

    /// Wire value used in resolution requests.
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Standard => "128",
            Self::High => "320",
            Self::Lossless => "flac",
            Self::Atmos => "viper_atmos",
        }
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self::Standard
    }
}

/// Playback ordering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Play the queue in insertion order, wrapping at the ends
    Sequence,

    /// Repeat the current track
    RepeatOne,

    /// A fresh random index on every advance
    Shuffle,
}

impl PlayMode {
    /// The next mode in the UI's single-button cycle.
    pub fn cycled(self) -> Self {
        match self {
            Self::Sequence => Self::RepeatOne,
            Self::RepeatOne => Self::Shuffle,
            Self::Shuffle => Self::Sequence,
        }
    }
}

impl Default for PlayMode {
    fn default() -> Self {
        Self::Sequence
    }
}

/// Snapshot of the audio output route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Whether the active output is a private, headphone-like device
    pub is_headphone_like: bool,
}

/// Events emitted by the platform media player back into the session.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// The loaded stream is ready; carries the authoritative duration
    Ready {
        /// Real duration of the loaded stream
        duration: Duration,
    },

    /// Periodic position update
    Position {
        /// Current playback position
        position: Duration,
    },

    /// The current track reached its natural end
    Ended,

    /// Mid-playback failure
    Failed {
        /// Human-readable failure description
        message: String,
    },
}

/// Parameters for one call to the resolution endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Content hash of the track
    pub track_id: String,

    /// Requested quality tier
    pub quality: AudioQuality,

    /// Album context, when known
    pub album_id: Option<String>,

    /// Album audio context, when known
    pub album_audio_id: Option<String>,

    /// Track is VIP-gated and eligible for the free preview segment; the
    /// client only asks for the preview when no account is authenticated
    pub free_preview: bool,

    /// Request a broadly compatible container at the cost of quality
    pub prefer_compatible: bool,
}

/// URL candidates returned by the resolution endpoint.
#[derive(Debug, Clone, Default)]
pub struct ResolvedUrls {
    /// Primary CDN candidates, best first
    pub primary: Vec<String>,

    /// Backup CDN candidates
    pub backup: Vec<String>,
}

//! Session state types

use aria_core::{AudioQuality, PlayMode, TrackRef};
use std::time::Duration;

/// Initial settings for a playback session.
///
/// Used only when nothing was persisted; a restored session overrides these
/// with whatever was saved.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial volume, `0.0..=1.0` (default 0.7)
    pub volume: f32,

    /// Initial playback rate, `0.5..=2.0` (default 1.0)
    pub rate: f32,

    /// Initial ordering mode (default Sequence)
    pub mode: PlayMode,

    /// Initial quality preference (default Standard)
    pub quality: AudioQuality,

    /// Prefer broadly compatible containers (default false)
    pub compatibility: bool,

    /// Advance automatically when a track fails (default false)
    pub auto_skip_on_error: bool,

    /// Pause before an automatic skip fires, so the audio pipeline is not
    /// starved by immediate back-to-back loads
    pub auto_skip_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            rate: 1.0,
            mode: PlayMode::Sequence,
            quality: AudioQuality::Standard,
            compatibility: false,
            auto_skip_on_error: false,
            auto_skip_delay: Duration::from_millis(800),
        }
    }
}

/// Read-only snapshot of the session, published on every externally visible
/// change. The UI renders from this and never touches the session lock.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    /// Queue contents in order
    pub tracks: Vec<TrackRef>,

    /// Selection index into `tracks`
    pub current_index: Option<usize>,

    /// The selected track, duplicated out of `tracks` for convenience
    pub current_track: Option<TrackRef>,

    /// Whether audio should be running
    pub is_playing: bool,

    /// Playback position within the current track
    pub position: Duration,

    /// Track duration: the catalog hint until the player reports the real one
    pub duration: Duration,

    /// Output volume, `0.0..=1.0`
    pub volume: f32,

    /// Playback rate, `0.5..=2.0`
    pub rate: f32,

    /// Ordering mode
    pub mode: PlayMode,

    /// Quality preference
    pub quality: AudioQuality,

    /// Compatibility-container preference
    pub compatibility: bool,

    /// Auto-skip policy flag
    pub auto_skip_on_error: bool,

    /// Last resolution/playback failure, shown alongside the still-current
    /// failed track until the user acts or auto-skip fires
    pub error: Option<String>,
}

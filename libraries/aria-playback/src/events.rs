//! Session events
//!
//! Broadcast notifications for UI synchronization. The full state travels on
//! the watch channel; these carry just enough to know what changed.

use serde::{Deserialize, Serialize};

/// Events emitted by the playback session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Play/pause flipped
    StateChanged {
        /// The new playing flag
        is_playing: bool,
    },

    /// The visible current track changed (selection, skip, or queue emptied)
    TrackChanged {
        /// Identity of the new current track, `None` when the session went idle
        track_id: Option<String>,
    },

    /// Tracks were added, removed, or the queue was replaced
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Resolution or playback failed; the failing track stays current
    PlaybackFailed {
        /// Human-readable failure description
        message: String,
    },
}

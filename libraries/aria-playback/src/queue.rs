//! Playback queue
//!
//! Ordered track list with a current-position marker. Insertion order is
//! meaningful; inserting a track already present (by identity) is a no-op.
//! Index arithmetic for next/previous lives here as pure functions so the
//! session controller stays free of ordering math.

use aria_core::{PlayMode, TrackRef};
use rand::Rng;

/// Ordered, deduplicated queue of tracks.
///
/// Invariant: `current` is `None` exactly when the queue is empty, otherwise
/// it is within `0..len()`.
#[derive(Debug, Clone, Default)]
pub struct PlaybackQueue {
    items: Vec<TrackRef>,
    current: Option<usize>,
}

impl PlaybackQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents.
    ///
    /// Keeps the existing selection (clamped) when one exists; otherwise a
    /// non-empty queue selects index 0.
    pub fn load(&mut self, tracks: Vec<TrackRef>) {
        self.items.clear();
        for track in tracks {
            if !self.contains(&track) {
                self.items.push(track);
            }
        }

        self.current = if self.items.is_empty() {
            None
        } else {
            Some(self.current.unwrap_or(0).min(self.items.len() - 1))
        };
    }

    /// Insert tracks not already present. An empty queue gaining its first
    /// track also gains a selection at index 0.
    pub fn append(&mut self, tracks: Vec<TrackRef>) {
        for track in tracks {
            if !self.contains(&track) {
                self.items.push(track);
            }
        }

        if self.current.is_none() && !self.items.is_empty() {
            self.current = Some(0);
        }
    }

    /// Remove the track at `index`, adjusting the selection so the current
    /// track's identity is preserved whenever it survives the removal.
    ///
    /// Out-of-range indices are a no-op; returns whether anything was removed.
    pub fn remove_at(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }

        self.items.remove(index);

        self.current = match self.current {
            None => None,
            Some(_) if self.items.is_empty() => None,
            Some(cur) if index < cur => Some(cur - 1),
            // Removal at or after the selection keeps it, re-clamped when the
            // selection fell off the end.
            Some(cur) => Some(cur.min(self.items.len() - 1)),
        };

        true
    }

    /// Empty the queue and clear the selection.
    pub fn clear(&mut self) {
        self.items.clear();
        self.current = None;
    }

    /// Move the selection. Out-of-range indices are a no-op; returns whether
    /// the selection was applied.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    /// Index that `next` would land on under `mode`, or `None` for an empty
    /// queue. Shuffle may return the current index again; that is accepted
    /// "random each time" semantics, not a defect.
    pub fn next_index(&self, mode: PlayMode) -> Option<usize> {
        let count = self.items.len();
        if count == 0 {
            return None;
        }
        let cur = self.current.unwrap_or(0);

        Some(match mode {
            PlayMode::Shuffle => rand::thread_rng().gen_range(0..count),
            PlayMode::RepeatOne => cur,
            PlayMode::Sequence => (cur + 1) % count,
        })
    }

    /// Index that `previous` would land on under `mode`, or `None` for an
    /// empty queue. Every mode but shuffle walks backwards with wrap.
    pub fn previous_index(&self, mode: PlayMode) -> Option<usize> {
        let count = self.items.len();
        if count == 0 {
            return None;
        }
        let cur = self.current.unwrap_or(0);

        Some(match mode {
            PlayMode::Shuffle => rand::thread_rng().gen_range(0..count),
            PlayMode::Sequence | PlayMode::RepeatOne => {
                if cur == 0 {
                    count - 1
                } else {
                    cur - 1
                }
            }
        })
    }

    /// Current selection index.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Currently selected track.
    pub fn current_track(&self) -> Option<&TrackRef> {
        self.current.and_then(|i| self.items.get(i))
    }

    /// Track at `index`.
    pub fn track_at(&self, index: usize) -> Option<&TrackRef> {
        self.items.get(index)
    }

    /// Position of a track in the queue, by identity.
    pub fn position_of(&self, track: &TrackRef) -> Option<usize> {
        self.items.iter().position(|t| t.same_identity(track))
    }

    /// Whether a track with the same identity is already queued.
    pub fn contains(&self, track: &TrackRef) -> bool {
        self.position_of(track).is_some()
    }

    /// All queued tracks in order.
    pub fn tracks(&self) -> &[TrackRef] {
        &self.items
    }

    /// Number of queued tracks.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

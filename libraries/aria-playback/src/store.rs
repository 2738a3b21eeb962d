//! Session persistence
//!
//! Serializes the resumable part of the session into the key-value
//! persistence collaborator, one JSON blob per key. Writes are best-effort
//! and must never block a playback transition; the controller fires them on
//! a background task.

use crate::state::SessionConfig;
use aria_core::{AudioQuality, KeyValueStore, PlayMode, Result, TrackRef};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

// Storage keys, kept stable across versions so old sessions keep restoring.
const KEY_PLAYLIST: &str = "playlist";
const KEY_CURRENT_INDEX: &str = "currentIndex";
const KEY_CURRENT_TIME: &str = "currentTime";
const KEY_PLAY_MODE: &str = "playMode";
const KEY_VOLUME: &str = "volume";
const KEY_PLAYBACK_SPEED: &str = "playbackSpeed";
const KEY_AUDIO_QUALITY: &str = "audioQuality";
const KEY_QUALITY_COMPATIBILITY: &str = "qualityCompatibility";
const KEY_AUTO_SKIP_ON_ERROR: &str = "autoSkipOnError";

const ALL_KEYS: [&str; 9] = [
    KEY_PLAYLIST,
    KEY_CURRENT_INDEX,
    KEY_CURRENT_TIME,
    KEY_PLAY_MODE,
    KEY_VOLUME,
    KEY_PLAYBACK_SPEED,
    KEY_AUDIO_QUALITY,
    KEY_QUALITY_COMPATIBILITY,
    KEY_AUTO_SKIP_ON_ERROR,
];

/// The resumable part of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Queue contents in order
    pub tracks: Vec<TrackRef>,
    /// Selection index
    pub current_index: Option<usize>,
    /// Position within the current track
    pub position: Duration,
    /// Ordering mode
    pub mode: PlayMode,
    /// Output volume
    pub volume: f32,
    /// Playback rate
    pub rate: f32,
    /// Quality preference
    pub quality: AudioQuality,
    /// Compatibility-container preference
    pub compatibility: bool,
    /// Auto-skip policy flag
    pub auto_skip_on_error: bool,
}

/// Persists and restores [`SessionSnapshot`]s through a [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a store over a persistence collaborator.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the whole snapshot, one key at a time.
    pub async fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        self.store
            .save(KEY_PLAYLIST, serde_json::to_value(&snapshot.tracks)?)
            .await?;
        match snapshot.current_index {
            Some(index) => {
                self.store.save(KEY_CURRENT_INDEX, json!(index)).await?;
            }
            None => self.store.delete(KEY_CURRENT_INDEX).await?,
        }
        self.store
            .save(KEY_CURRENT_TIME, json!(snapshot.position.as_secs_f64()))
            .await?;
        self.store
            .save(KEY_PLAY_MODE, serde_json::to_value(snapshot.mode)?)
            .await?;
        self.store.save(KEY_VOLUME, json!(snapshot.volume)).await?;
        self.store
            .save(KEY_PLAYBACK_SPEED, json!(snapshot.rate))
            .await?;
        self.store
            .save(KEY_AUDIO_QUALITY, serde_json::to_value(snapshot.quality)?)
            .await?;
        self.store
            .save(KEY_QUALITY_COMPATIBILITY, json!(snapshot.compatibility))
            .await?;
        self.store
            .save(KEY_AUTO_SKIP_ON_ERROR, json!(snapshot.auto_skip_on_error))
            .await?;
        Ok(())
    }

    /// Update just the playback position. Called on a throttle while audio
    /// runs, so a crash resumes close to where it stopped.
    pub async fn save_position(&self, position: Duration) -> Result<()> {
        self.store
            .save(KEY_CURRENT_TIME, json!(position.as_secs_f64()))
            .await
    }

    /// Restore a snapshot, or `None` when no playlist was ever saved.
    ///
    /// The selection index is clamped into range and unparseable fields fall
    /// back to the defaults in `config`, so a half-written or older session
    /// still restores.
    pub async fn load(&self, config: &SessionConfig) -> Result<Option<SessionSnapshot>> {
        let Some(playlist) = self.store.load(KEY_PLAYLIST).await? else {
            return Ok(None);
        };
        let tracks: Vec<TrackRef> = serde_json::from_value(playlist).unwrap_or_default();

        let current_index = match self.store.load(KEY_CURRENT_INDEX).await? {
            Some(value) => value.as_u64().map(|i| i as usize),
            None => None,
        };
        let current_index = if tracks.is_empty() {
            None
        } else {
            Some(current_index.unwrap_or(0).min(tracks.len() - 1))
        };

        let position = self
            .store
            .load(KEY_CURRENT_TIME)
            .await?
            .and_then(|v| v.as_f64())
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::ZERO);

        let mode = self
            .store
            .load(KEY_PLAY_MODE)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(config.mode);

        let volume = self
            .store
            .load(KEY_VOLUME)
            .await?
            .and_then(|v| v.as_f64())
            .map_or(config.volume, |v| (v as f32).clamp(0.0, 1.0));

        let rate = self
            .store
            .load(KEY_PLAYBACK_SPEED)
            .await?
            .and_then(|v| v.as_f64())
            .map_or(config.rate, |v| (v as f32).clamp(0.5, 2.0));

        let quality = self
            .store
            .load(KEY_AUDIO_QUALITY)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or(config.quality);

        let compatibility = self
            .store
            .load(KEY_QUALITY_COMPATIBILITY)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(config.compatibility);

        let auto_skip_on_error = self
            .store
            .load(KEY_AUTO_SKIP_ON_ERROR)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(config.auto_skip_on_error);

        Ok(Some(SessionSnapshot {
            tracks,
            current_index,
            position,
            mode,
            volume,
            rate,
            quality,
            compatibility,
            auto_skip_on_error,
        }))
    }

    /// Erase everything this store ever wrote.
    pub async fn clear(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.delete(key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_core::{MemoryStore, TrackFlags};

    fn track(id: &str) -> TrackRef {
        TrackRef {
            id: id.to_string(),
            title: format!("Track {id}"),
            artist: "Artist".to_string(),
            album: None,
            cover: None,
            duration_hint: Duration::from_secs(240),
            album_id: Some("album-1".to_string()),
            album_audio_id: None,
            flags: TrackFlags {
                vip: false,
                hq: true,
                sq: false,
            },
        }
    }

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            tracks: vec![track("a"), track("b"), track("c")],
            current_index: Some(1),
            position: Duration::from_secs_f64(42.5),
            mode: PlayMode::RepeatOne,
            volume: 0.55,
            rate: 1.25,
            quality: AudioQuality::Lossless,
            compatibility: true,
            auto_skip_on_error: true,
        }
    }

    #[tokio::test]
    async fn save_then_load_restores_everything() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        store.save(&snapshot()).await.unwrap();

        let restored = store
            .load(&SessionConfig::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restored, snapshot());
    }

    #[tokio::test]
    async fn load_without_playlist_is_none() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        assert!(store
            .load(&SessionConfig::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn out_of_range_index_is_clamped() {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone());
        let mut snap = snapshot();
        snap.current_index = Some(1);
        store.save(&snap).await.unwrap();

        // Simulate a stale index from a longer, older playlist.
        kv.save(KEY_CURRENT_INDEX, json!(99)).await.unwrap();

        let restored = store
            .load(&SessionConfig::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restored.current_index, Some(2));
    }

    #[tokio::test]
    async fn unparseable_fields_fall_back_to_config() {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone());
        store.save(&snapshot()).await.unwrap();

        kv.save(KEY_PLAY_MODE, json!("moonwalk")).await.unwrap();
        kv.save(KEY_VOLUME, json!("loud")).await.unwrap();

        let config = SessionConfig::default();
        let restored = store.load(&config).await.unwrap().unwrap();
        assert_eq!(restored.mode, config.mode);
        assert_eq!(restored.volume, config.volume);
    }

    #[tokio::test]
    async fn clear_erases_all_keys() {
        let kv = Arc::new(MemoryStore::new());
        let store = SessionStore::new(kv.clone());
        store.save(&snapshot()).await.unwrap();

        store.clear().await.unwrap();
        assert!(kv.is_empty().await);
        assert!(store
            .load(&SessionConfig::default())
            .await
            .unwrap()
            .is_none());
    }
}

//! Quality-ranked URL resolution
//!
//! Wraps the streaming API's resolution collaborator with a session cache and
//! a single-hop fallback to the baseline tier. Concurrent resolutions for
//! different `(track, quality)` keys run in parallel; the session controller
//! naturally serializes requests for the current track, so no in-flight
//! de-duplication happens here.

use aria_core::{
    AudioQuality, PlaybackError, ResolveRequest, ResolvedUrls, Result, TrackRef, UrlSource,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Resolves tracks to playable URLs with caching and quality fallback.
pub struct QualityResolver {
    source: Arc<dyn UrlSource>,
    // Append-only within a session; a hit always wins over a new resolution.
    cache: RwLock<HashMap<(String, AudioQuality), Url>>,
}

impl QualityResolver {
    /// Create a resolver over a resolution collaborator.
    pub fn new(source: Arc<dyn UrlSource>) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a track to a playable URL at the preferred quality.
    ///
    /// Falls back exactly once to the baseline tier when the preferred tier
    /// yields no URL; collaborator errors propagate without fallback.
    pub async fn resolve(
        &self,
        track: &TrackRef,
        quality: AudioQuality,
        compatibility: bool,
        free_preview: bool,
    ) -> Result<Url> {
        if !track.has_identity() {
            return Err(PlaybackError::InvalidIdentity);
        }

        let key = (track.id.clone(), quality);
        if let Some(url) = self.cache.read().await.get(&key) {
            debug!(track = %track.id, quality = quality.as_param(), "resolution cache hit");
            return Ok(url.clone());
        }

        let mut url = self
            .attempt(track, quality, compatibility, free_preview)
            .await?;

        if url.is_none() && quality != AudioQuality::baseline() {
            debug!(
                track = %track.id,
                from = quality.as_param(),
                "no URL at preferred tier, falling back to baseline"
            );
            url = self
                .attempt(track, AudioQuality::baseline(), compatibility, free_preview)
                .await?;
        }

        let url = url.ok_or(PlaybackError::UrlUnavailable)?;
        self.cache.write().await.insert(key, url.clone());
        Ok(url)
    }

    /// Peek at the cache; used by tests and prefetch heuristics.
    pub async fn cached(&self, track_id: &str, quality: AudioQuality) -> Option<Url> {
        self.cache
            .read()
            .await
            .get(&(track_id.to_string(), quality))
            .cloned()
    }

    /// One call to the collaborator at one tier, reduced to the first usable
    /// candidate: primary list first, then the backup list.
    async fn attempt(
        &self,
        track: &TrackRef,
        quality: AudioQuality,
        compatibility: bool,
        free_preview: bool,
    ) -> Result<Option<Url>> {
        let request = ResolveRequest {
            track_id: track.id.clone(),
            quality,
            album_id: track.album_id.clone(),
            album_audio_id: track.album_audio_id.clone(),
            free_preview,
            prefer_compatible: compatibility,
        };

        let candidates = self.source.resolve(&request).await?;
        Ok(pick_candidate(&candidates))
    }
}

/// First parseable URL out of the primary then backup lists.
fn pick_candidate(candidates: &ResolvedUrls) -> Option<Url> {
    candidates
        .primary
        .iter()
        .chain(candidates.backup.iter())
        .filter(|raw| !raw.trim().is_empty())
        .find_map(|raw| Url::parse(&normalize_scheme(raw)).ok())
}

/// Some backing CDNs hand out scheme-less URLs; default those to plain HTTP
/// rather than rejecting them. Kept permissive on purpose.
fn normalize_scheme(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    }
}

//! Playback session controller
//!
//! Owns the queue, the play state machine, and the wiring between URL
//! resolution, the media pipeline, and persistence. All mutation goes through
//! one async mutex; the UI observes through a watch channel and never touches
//! the lock.
//!
//! Skips are visible immediately: the selection moves and publishes before
//! resolution starts, and every selection bumps an epoch counter. A
//! resolution that finishes after a newer selection sees a stale epoch and is
//! discarded, so rapid skipping can never load an older track's audio.

use crate::events::SessionEvent;
use crate::queue::PlaybackQueue;
use crate::resolver::QualityResolver;
use crate::state::{PlaybackState, SessionConfig};
use crate::store::{SessionSnapshot, SessionStore};
use aria_core::{
    AudioQuality, KeyValueStore, MediaPlayer, PlayMode, PlaybackError, PlayerEvent, Result,
    TrackRef, UrlSource,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How far the position must move before it is persisted again.
const POSITION_PERSIST_STEP: Duration = Duration::from_secs(1);

/// Mutable session state, guarded by the controller's mutex.
struct Session {
    queue: PlaybackQueue,
    playing: bool,
    position: Duration,
    duration: Duration,
    volume: f32,
    rate: f32,
    mode: PlayMode,
    quality: AudioQuality,
    compatibility: bool,
    auto_skip: bool,
    error: Option<String>,
    /// Track whose audio is actually loaded in the pipeline. Lags behind the
    /// visible selection while resolution is in flight.
    loaded: Option<TrackRef>,
    /// Bumped on every selection; stale resolutions compare and bail.
    epoch: u64,
    /// Set when a device interruption paused us and we owe a resume.
    resume_after_device: bool,
    last_saved_position: Duration,
}

struct ControllerCore {
    session: Mutex<Session>,
    resolver: QualityResolver,
    player: Arc<dyn MediaPlayer>,
    store: SessionStore,
    watch_tx: watch::Sender<PlaybackState>,
    events_tx: broadcast::Sender<SessionEvent>,
    auto_skip_delay: Duration,
}

/// Handle onto a playback session. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct SessionController {
    core: Arc<ControllerCore>,
}

impl SessionController {
    /// Build a session over its three collaborators, restoring whatever the
    /// store holds from the previous run. Restored sessions always come back
    /// paused; nothing is resolved until the user acts.
    pub async fn new(
        player: Arc<dyn MediaPlayer>,
        source: Arc<dyn UrlSource>,
        store: Arc<dyn KeyValueStore>,
        config: SessionConfig,
    ) -> Result<Self> {
        let store = SessionStore::new(store);
        let restored = store.load(&config).await?;

        let mut session = Session {
            queue: PlaybackQueue::new(),
            playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: config.volume.clamp(0.0, 1.0),
            rate: config.rate.clamp(0.5, 2.0),
            mode: config.mode,
            quality: config.quality,
            compatibility: config.compatibility,
            auto_skip: config.auto_skip_on_error,
            error: None,
            loaded: None,
            epoch: 0,
            resume_after_device: false,
            last_saved_position: Duration::ZERO,
        };

        if let Some(snapshot) = restored {
            info!(
                tracks = snapshot.tracks.len(),
                index = ?snapshot.current_index,
                "restoring persisted session"
            );
            session.queue.load(snapshot.tracks);
            if let Some(index) = snapshot.current_index {
                session.queue.set_current(index);
            }
            session.position = snapshot.position;
            session.last_saved_position = snapshot.position;
            session.mode = snapshot.mode;
            session.volume = snapshot.volume;
            session.rate = snapshot.rate;
            session.quality = snapshot.quality;
            session.compatibility = snapshot.compatibility;
            session.auto_skip = snapshot.auto_skip_on_error;
            session.duration = session
                .queue
                .current_track()
                .map(|t| t.duration_hint)
                .unwrap_or(Duration::ZERO);
        }

        player.set_volume(session.volume).await?;
        player.set_rate(session.rate).await?;

        let (watch_tx, _) = watch::channel(snapshot_state(&session));
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            core: Arc::new(ControllerCore {
                session: Mutex::new(session),
                resolver: QualityResolver::new(source),
                player,
                store,
                watch_tx,
                events_tx,
                auto_skip_delay: config.auto_skip_delay,
            }),
        })
    }

    /// Watch channel carrying the full state after every visible change.
    pub fn subscribe_state(&self) -> watch::Receiver<PlaybackState> {
        self.core.watch_tx.subscribe()
    }

    /// Broadcast channel of change notifications.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.core.events_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> PlaybackState {
        self.core.watch_tx.borrow().clone()
    }

    /// Replace the queue contents. Playback is not started; an existing
    /// selection survives (clamped) so the loaded track keeps playing when it
    /// is still present.
    pub async fn load_queue(&self, tracks: Vec<TrackRef>) -> Result<()> {
        let mut s = self.core.session.lock().await;
        s.queue.load(tracks);
        if s.queue.is_empty() {
            self.reset_to_idle(&mut s).await;
        }
        self.publish(&s);
        self.emit(SessionEvent::QueueChanged {
            length: s.queue.len(),
        });
        self.persist(&mut s);
        Ok(())
    }

    /// Append tracks not already queued.
    pub async fn append_tracks(&self, tracks: Vec<TrackRef>) -> Result<()> {
        let mut s = self.core.session.lock().await;
        let before = s.queue.len();
        s.queue.append(tracks);
        if s.queue.len() != before {
            self.publish(&s);
            self.emit(SessionEvent::QueueChanged {
                length: s.queue.len(),
            });
            self.persist(&mut s);
        }
        Ok(())
    }

    /// Empty the queue, stop playback, and erase the persisted session.
    pub async fn clear(&self) -> Result<()> {
        {
            let mut s = self.core.session.lock().await;
            s.queue.clear();
            self.reset_to_idle(&mut s).await;
            self.publish(&s);
            self.emit(SessionEvent::QueueChanged { length: 0 });
            self.emit(SessionEvent::TrackChanged { track_id: None });
        }
        self.core.store.clear().await
    }

    /// Select a queue position and start playing it.
    pub async fn select_and_play(&self, index: usize) -> Result<()> {
        self.activate(index, true).await
    }

    /// Play a specific track, appending it to the queue when absent.
    pub async fn play_track(&self, track: TrackRef) -> Result<()> {
        let index = {
            let mut s = self.core.session.lock().await;
            let index = match s.queue.position_of(&track) {
                Some(index) => index,
                None => {
                    s.queue.append(vec![track.clone()]);
                    self.emit(SessionEvent::QueueChanged {
                        length: s.queue.len(),
                    });
                    match s.queue.position_of(&track) {
                        Some(index) => index,
                        None => return Err(PlaybackError::InvalidIdentity),
                    }
                }
            };
            index
        };
        self.activate(index, true).await
    }

    /// Flip between playing and paused.
    ///
    /// When the selected track was never loaded in this process (a restored
    /// session, or an earlier failure), this resolves it first and resumes at
    /// the remembered position. A manual toggle also cancels any pending
    /// device-driven auto-resume.
    pub async fn toggle_playback(&self) -> Result<()> {
        let mut s = self.core.session.lock().await;
        s.resume_after_device = false;

        let Some(track) = s.queue.current_track().cloned() else {
            return Ok(());
        };

        if s.playing {
            s.playing = false;
            // The pause intent stands even when the pipeline rejects it; the
            // rejection is surfaced as a session error, not returned.
            if let Err(err) = self.core.player.pause().await {
                warn!(%err, "pause rejected by the pipeline");
                s.error = Some(err.to_string());
            }
            self.publish(&s);
            self.emit(SessionEvent::StateChanged { is_playing: false });
            self.persist(&mut s);
            return Ok(());
        }

        let already_loaded = s
            .loaded
            .as_ref()
            .is_some_and(|loaded| loaded.same_identity(&track));

        if already_loaded {
            s.playing = true;
            s.error = None;
            if let Err(err) = self.core.player.play().await {
                self.fail_current(&mut s, &err).await;
                return Ok(());
            }
            self.publish(&s);
            self.emit(SessionEvent::StateChanged { is_playing: true });
            self.persist(&mut s);
            return Ok(());
        }

        // Cold start: resolve, then pick up where the session left off.
        s.epoch += 1;
        let epoch = s.epoch;
        s.playing = true;
        s.error = None;
        let resume_at = s.position;
        let quality = s.quality;
        let compatibility = s.compatibility;
        self.publish(&s);
        self.emit(SessionEvent::StateChanged { is_playing: true });
        drop(s);

        self.resolve_and_load(track, epoch, quality, compatibility, Some(resume_at))
            .await
    }

    /// Advance under the current mode. Moving to a different track while
    /// paused starts it playing; repeat-one keeps the paused state.
    pub async fn next(&self) -> Result<()> {
        let (index, should_play) = {
            let s = self.core.session.lock().await;
            let Some(index) = s.queue.next_index(s.mode) else {
                return Ok(());
            };
            let moved = Some(index) != s.queue.current_index();
            (index, s.playing || moved)
        };
        self.activate(index, should_play).await
    }

    /// Step back under the current mode, keeping the play/pause state.
    pub async fn previous(&self) -> Result<()> {
        let (index, should_play) = {
            let s = self.core.session.lock().await;
            let Some(index) = s.queue.previous_index(s.mode) else {
                return Ok(());
            };
            (index, s.playing)
        };
        self.activate(index, should_play).await
    }

    /// Jump within the current track. Clamped to the known duration.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let mut s = self.core.session.lock().await;
        if s.queue.current_track().is_none() {
            return Ok(());
        }
        let target = if s.duration > Duration::ZERO {
            position.min(s.duration)
        } else {
            position
        };
        if s.loaded.is_some() {
            if let Err(err) = self.core.player.seek(target).await {
                warn!(%err, "seek rejected by the pipeline");
                s.error = Some(err.to_string());
                self.publish(&s);
                return Ok(());
            }
        }
        s.position = target;
        s.last_saved_position = target;
        self.publish(&s);
        self.persist(&mut s);
        Ok(())
    }

    /// Set the output volume, clamped to `0.0..=1.0`. A pipeline rejection
    /// is captured as a session error; the preference still sticks.
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        let mut s = self.core.session.lock().await;
        s.volume = volume.clamp(0.0, 1.0);
        if let Err(err) = self.core.player.set_volume(s.volume).await {
            warn!(%err, "volume change rejected by the pipeline");
            s.error = Some(err.to_string());
        }
        self.publish(&s);
        self.persist(&mut s);
        Ok(())
    }

    /// Set the playback rate, clamped to `0.5..=2.0`. Rejections are
    /// captured like [`Self::set_volume`].
    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        let mut s = self.core.session.lock().await;
        s.rate = rate.clamp(0.5, 2.0);
        if let Err(err) = self.core.player.set_rate(s.rate).await {
            warn!(%err, "rate change rejected by the pipeline");
            s.error = Some(err.to_string());
        }
        self.publish(&s);
        self.persist(&mut s);
        Ok(())
    }

    /// Set the ordering mode. Takes effect on the next advance.
    pub async fn set_mode(&self, mode: PlayMode) -> Result<()> {
        let mut s = self.core.session.lock().await;
        s.mode = mode;
        self.publish(&s);
        self.persist(&mut s);
        Ok(())
    }

    /// Step Sequence -> RepeatOne -> Shuffle -> Sequence.
    pub async fn cycle_mode(&self) -> Result<()> {
        let mode = self.core.session.lock().await.mode.cycled();
        self.set_mode(mode).await
    }

    /// Change the quality preference. A loaded track is re-resolved at the
    /// new tier and restarted from the beginning, keeping the play state.
    pub async fn set_quality(&self, quality: AudioQuality) -> Result<()> {
        let mut s = self.core.session.lock().await;
        if s.quality == quality {
            return Ok(());
        }
        s.quality = quality;
        self.reload_current(s).await
    }

    /// Change the compatibility-container preference; reloads like
    /// [`Self::set_quality`].
    pub async fn set_quality_compatibility(&self, compatibility: bool) -> Result<()> {
        let mut s = self.core.session.lock().await;
        if s.compatibility == compatibility {
            return Ok(());
        }
        s.compatibility = compatibility;
        self.reload_current(s).await
    }

    /// Enable or disable advancing past failed tracks.
    pub async fn set_auto_skip_on_error(&self, enabled: bool) -> Result<()> {
        let mut s = self.core.session.lock().await;
        s.auto_skip = enabled;
        self.publish(&s);
        self.persist(&mut s);
        Ok(())
    }

    /// Remove one queue position.
    ///
    /// Removing the only track stops playback and goes idle. Removing the
    /// current track among others moves the selection without touching the
    /// pipeline; whatever is loaded keeps playing until the user acts.
    pub async fn remove_track(&self, index: usize) -> Result<()> {
        let mut s = self.core.session.lock().await;
        let before = s.queue.current_track().cloned();
        if !s.queue.remove_at(index) {
            return Ok(());
        }

        if s.queue.is_empty() {
            self.reset_to_idle(&mut s).await;
            self.publish(&s);
            self.emit(SessionEvent::QueueChanged { length: 0 });
            self.emit(SessionEvent::TrackChanged { track_id: None });
            self.persist(&mut s);
            return Ok(());
        }

        self.publish(&s);
        self.emit(SessionEvent::QueueChanged {
            length: s.queue.len(),
        });
        let after = s.queue.current_track().cloned();
        let identity_changed = match (&before, &after) {
            (Some(a), Some(b)) => !a.same_identity(b),
            _ => true,
        };
        if identity_changed {
            self.emit(SessionEvent::TrackChanged {
                track_id: after.map(|t| t.id),
            });
        }
        self.persist(&mut s);
        Ok(())
    }

    /// Feed one event from the media pipeline into the session.
    pub async fn handle_player_event(&self, event: PlayerEvent) -> Result<()> {
        match event {
            PlayerEvent::Ready { duration } => {
                let mut s = self.core.session.lock().await;
                if s.loaded.is_some() && duration > Duration::ZERO {
                    s.duration = duration;
                    self.publish(&s);
                }
                Ok(())
            }
            PlayerEvent::Position { position } => {
                let mut s = self.core.session.lock().await;
                s.position = position;
                self.publish(&s);
                let step = position
                    .checked_sub(s.last_saved_position)
                    .unwrap_or(POSITION_PERSIST_STEP);
                if step >= POSITION_PERSIST_STEP {
                    s.last_saved_position = position;
                    let store = self.core.store.clone();
                    tokio::spawn(async move {
                        if let Err(err) = store.save_position(position).await {
                            warn!(%err, "position persist failed");
                        }
                    });
                }
                Ok(())
            }
            PlayerEvent::Ended => {
                debug!("track ended, advancing");
                let index = {
                    let s = self.core.session.lock().await;
                    s.queue.next_index(s.mode)
                };
                match index {
                    Some(index) => self.activate(index, true).await,
                    None => Ok(()),
                }
            }
            PlayerEvent::Failed { message } => {
                let mut s = self.core.session.lock().await;
                self.fail_current(&mut s, &PlaybackError::unknown(message))
                    .await;
                Ok(())
            }
        }
    }

    /// Device interruption began (route loss, unplugged headphones). Pauses
    /// and remembers whether a resume is owed.
    pub async fn suspend_for_device(&self) -> Result<()> {
        let mut s = self.core.session.lock().await;
        if !s.playing {
            return Ok(());
        }
        info!("pausing for device interruption");
        s.playing = false;
        s.resume_after_device = true;
        self.core.player.pause().await?;
        self.publish(&s);
        self.emit(SessionEvent::StateChanged { is_playing: false });
        Ok(())
    }

    /// Device interruption ended. Resumes only when the interruption itself
    /// paused us and no manual toggle happened in between.
    pub async fn resume_for_device(&self) -> Result<()> {
        let mut s = self.core.session.lock().await;
        if !s.resume_after_device {
            return Ok(());
        }
        s.resume_after_device = false;
        if s.playing || s.loaded.is_none() {
            return Ok(());
        }
        info!("resuming after device interruption");
        s.playing = true;
        self.core.player.play().await?;
        self.publish(&s);
        self.emit(SessionEvent::StateChanged { is_playing: true });
        Ok(())
    }

    /// Move the selection to `index` and (optionally) start it. The visible
    /// state flips immediately; audio follows once resolution completes.
    async fn activate(&self, index: usize, should_play: bool) -> Result<()> {
        let (track, epoch, quality, compatibility) = {
            let mut s = self.core.session.lock().await;
            if !s.queue.set_current(index) {
                return Ok(());
            }
            let Some(track) = s.queue.current_track().cloned() else {
                return Ok(());
            };

            s.epoch += 1;
            s.playing = should_play;
            s.position = Duration::ZERO;
            s.last_saved_position = Duration::ZERO;
            s.duration = track.duration_hint;
            s.error = None;
            s.loaded = None;
            s.resume_after_device = false;

            self.publish(&s);
            self.emit(SessionEvent::TrackChanged {
                track_id: Some(track.id.clone()),
            });
            self.persist(&mut s);
            (track, s.epoch, s.quality, s.compatibility)
        };

        self.resolve_and_load(track, epoch, quality, compatibility, None)
            .await
    }

    /// Resolve a track and hand the URL to the pipeline, unless a newer
    /// selection superseded this one while resolution was in flight.
    async fn resolve_and_load(
        &self,
        track: TrackRef,
        epoch: u64,
        quality: AudioQuality,
        compatibility: bool,
        resume_at: Option<Duration>,
    ) -> Result<()> {
        let resolved = self
            .core
            .resolver
            .resolve(&track, quality, compatibility, track.flags.vip)
            .await;

        let mut s = self.core.session.lock().await;
        if s.epoch != epoch {
            debug!(track = %track.id, "discarding stale resolution");
            return Ok(());
        }

        let url = match resolved {
            Ok(url) => url,
            Err(err) => {
                self.fail_current(&mut s, &err).await;
                return Ok(());
            }
        };

        let outcome = async {
            self.core.player.load(&url).await?;
            self.core.player.set_volume(s.volume).await?;
            // Seek before the rate is applied, so a resumed stream never
            // plays a frame from the wrong position at the wrong speed.
            if let Some(position) = resume_at {
                self.core.player.seek(position).await?;
            }
            self.core.player.set_rate(s.rate).await?;
            if s.playing {
                self.core.player.play().await?;
            }
            Ok::<_, PlaybackError>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                s.loaded = Some(track);
                if let Some(position) = resume_at {
                    s.position = position;
                }
                self.publish(&s);
                Ok(())
            }
            Err(err) => {
                self.fail_current(&mut s, &err).await;
                Ok(())
            }
        }
    }

    /// Re-resolve the current track after a quality or compatibility change,
    /// restarting from the top but keeping the play state. Consumes the
    /// guard so resolution runs unlocked.
    async fn reload_current(
        &self,
        mut s: tokio::sync::MutexGuard<'_, Session>,
    ) -> Result<()> {
        if s.loaded.is_none() {
            self.publish(&s);
            self.persist(&mut s);
            return Ok(());
        }
        let Some(track) = s.queue.current_track().cloned() else {
            self.publish(&s);
            self.persist(&mut s);
            return Ok(());
        };

        s.epoch += 1;
        let epoch = s.epoch;
        s.position = Duration::ZERO;
        s.last_saved_position = Duration::ZERO;
        s.loaded = None;
        s.error = None;
        let quality = s.quality;
        let compatibility = s.compatibility;
        self.publish(&s);
        self.persist(&mut s);
        drop(s);

        self.resolve_and_load(track, epoch, quality, compatibility, None)
            .await
    }

    /// Mark the current track failed. It stays selected with the error
    /// visible; when auto-skip is on and the next candidate is a different
    /// track, a delayed advance is scheduled.
    async fn fail_current(&self, s: &mut Session, err: &PlaybackError) {
        warn!(%err, track = ?s.queue.current_track().map(|t| t.id.clone()), "playback failed");
        s.playing = false;
        s.error = Some(err.to_string());
        if self.core.player.pause().await.is_err() {
            debug!("pause after failure was rejected by the pipeline");
        }
        self.publish(s);
        self.emit(SessionEvent::PlaybackFailed {
            message: err.to_string(),
        });

        if !s.auto_skip {
            return;
        }
        let candidate = s.queue.next_index(s.mode);
        if candidate.is_none() || candidate == s.queue.current_index() {
            // Single track, repeat-one, or a shuffle landing on itself:
            // skipping would retry the same failure in a loop.
            return;
        }

        let epoch = s.epoch;
        let this = self.clone();
        let delay = self.core.auto_skip_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = this.auto_skip_advance(epoch).await {
                warn!(%err, "auto-skip advance failed");
            }
        });
    }

    /// The delayed half of auto-skip. Bails when the user already moved on.
    ///
    /// Boxed to break the `Send` inference cycle through `fail_current`,
    /// which spawns a task that re-enters this function.
    fn auto_skip_advance(
        &self,
        epoch: u64,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let index = {
                let s = self.core.session.lock().await;
                if s.epoch != epoch || s.error.is_none() {
                    return Ok(());
                }
                let Some(index) = s.queue.next_index(s.mode) else {
                    return Ok(());
                };
                if Some(index) == s.queue.current_index() {
                    return Ok(());
                }
                index
            };
            debug!(index, "auto-skipping past failed track");
            self.activate(index, true).await
        })
    }

    /// Drop back to the no-track state.
    async fn reset_to_idle(&self, s: &mut Session) {
        s.playing = false;
        s.position = Duration::ZERO;
        s.last_saved_position = Duration::ZERO;
        s.duration = Duration::ZERO;
        s.error = None;
        s.loaded = None;
        s.resume_after_device = false;
        s.epoch += 1;
        if self.core.player.pause().await.is_err() {
            debug!("pause on idle reset was rejected by the pipeline");
        }
    }

    fn publish(&self, s: &Session) {
        self.core.watch_tx.send_replace(snapshot_state(s));
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.core.events_tx.send(event);
    }

    /// Fire-and-forget persistence of the whole session.
    fn persist(&self, s: &mut Session) {
        s.last_saved_position = s.position;
        let snapshot = SessionSnapshot {
            tracks: s.queue.tracks().to_vec(),
            current_index: s.queue.current_index(),
            position: s.position,
            mode: s.mode,
            volume: s.volume,
            rate: s.rate,
            quality: s.quality,
            compatibility: s.compatibility,
            auto_skip_on_error: s.auto_skip,
        };
        let store = self.core.store.clone();
        tokio::spawn(async move {
            if let Err(err) = store.save(&snapshot).await {
                warn!(%err, "session persist failed");
            }
        });
    }
}

fn snapshot_state(s: &Session) -> PlaybackState {
    PlaybackState {
        tracks: s.queue.tracks().to_vec(),
        current_index: s.queue.current_index(),
        current_track: s.queue.current_track().cloned(),
        is_playing: s.playing,
        position: s.position,
        duration: s.duration,
        volume: s.volume,
        rate: s.rate,
        mode: s.mode,
        quality: s.quality,
        compatibility: s.compatibility,
        auto_skip_on_error: s.auto_skip,
        error: s.error.clone(),
    }
}

//! Aria Player - Playback Session Engine
//!
//! Platform-agnostic playback session management for Aria Player.
//!
//! This crate provides:
//! - Ordered, deduplicated play queue with Sequence/RepeatOne/Shuffle modes
//! - Instant track switching with stale-resolution discard
//! - Quality-ranked URL resolution with session caching and baseline fallback
//! - Failure policy (failed track stays visible, optional delayed auto-skip)
//! - Output-device interruption handling with debounce
//! - Session persistence and restore (queue, position, settings)
//!
//! # Architecture
//!
//! `aria-playback` never touches the network or an audio device directly.
//! The streaming API, the media pipeline, and the persistence substrate are
//! injected through the traits in `aria-core`, so the same session logic
//! runs under any frontend and in tests with scripted collaborators.
//!
//! The [`SessionController`] is the single entry point. It is a cheap-clone
//! handle; UIs observe it through a `watch` channel of [`PlaybackState`]
//! snapshots and a `broadcast` channel of [`SessionEvent`]s, and never block
//! on session internals.

#![forbid(unsafe_code)]

mod controller;
mod device;
mod events;
mod queue;
mod resolver;
mod state;
mod store;

pub use controller::SessionController;
pub use device::DeviceWatcher;
pub use events::SessionEvent;
pub use queue::PlaybackQueue;
pub use resolver::QualityResolver;
pub use state::{PlaybackState, SessionConfig};
pub use store::{SessionSnapshot, SessionStore};

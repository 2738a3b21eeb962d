//! Aria Player - Streaming Service Client
//!
//! HTTP client for the streaming service's track resolution API.
//!
//! The client turns track identities into ranked, playable URL candidates
//! and plugs into the playback session through the `UrlSource` trait from
//! `aria-core`. Quality fallback and caching live in `aria-playback`; this
//! crate only speaks the wire protocol.

#![forbid(unsafe_code)]

mod client;
mod error;
mod types;

pub use client::StreamClient;
pub use error::{Result, StreamError};
pub use types::{StreamConfig, UrlPayload, UrlResponse};

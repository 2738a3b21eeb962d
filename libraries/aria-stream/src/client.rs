//! Streaming service client.

use crate::error::{Result, StreamError};
use crate::types::{StreamConfig, UrlResponse};
use aria_core::{ResolveRequest, ResolvedUrls, UrlSource};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the streaming service's HTTP API.
///
/// Implements [`UrlSource`], which is how the playback session consumes it.
///
/// # Example
///
/// ```ignore
/// use aria_stream::{StreamClient, StreamConfig};
///
/// let config = StreamConfig::new("https://api.example.com")
///     .with_auth("user-id", "session-token");
/// let client = StreamClient::new(config)?;
/// ```
pub struct StreamClient {
    http: Client,
    config: StreamConfig,
}

impl StreamClient {
    /// Create a client with the given configuration.
    pub fn new(config: StreamConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(StreamError::InvalidBaseUrl("URL cannot be empty".into()));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StreamError::InvalidBaseUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("AriaPlayer/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(StreamError::Request)?;

        Ok(Self {
            http,
            config: StreamConfig { base_url, ..config },
        })
    }

    /// Service base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Whether account credentials are attached.
    pub fn is_authenticated(&self) -> bool {
        self.config.user_id.is_some() && self.config.token.is_some()
    }

    /// One call to the `/song/url` endpoint.
    async fn fetch_song_url(&self, request: &ResolveRequest) -> Result<ResolvedUrls> {
        let url = format!("{}/song/url", self.config.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("hash", request.track_id.clone()),
            ("quality", request.quality.as_param().to_string()),
        ];
        if let Some(album_id) = &request.album_id {
            query.push(("album_id", album_id.clone()));
        }
        if let Some(album_audio_id) = &request.album_audio_id {
            query.push(("album_audio_id", album_audio_id.clone()));
        }
        // The preview segment is an anonymous-access concession; an
        // authenticated account gets the full stream for its VIP tracks.
        if request.free_preview && !self.is_authenticated() {
            query.push(("free_part", "1".to_string()));
        }
        if request.prefer_compatible {
            query.push(("format", "mp3".to_string()));
        }
        if let (Some(user_id), Some(token)) = (&self.config.user_id, &self.config.token) {
            query.push(("userid", user_id.clone()));
            query.push(("token", token.clone()));
        }

        debug!(
            track = %request.track_id,
            quality = request.quality.as_param(),
            "requesting song URL"
        );

        let response = self.http.get(&url).query(&query).send().await?;
        let http_status = response.status();
        if !http_status.is_success() {
            warn!(%http_status, track = %request.track_id, "song URL request rejected");
            return Err(StreamError::Api {
                status: i64::from(http_status.as_u16()),
                err_code: 0,
            });
        }

        let body: UrlResponse = response
            .json()
            .await
            .map_err(|e| StreamError::Parse(e.to_string()))?;

        match body.status {
            1 => Ok(ResolvedUrls {
                primary: body.payload.url,
                backup: body.payload.backup_url,
            }),
            2 => Err(StreamError::CopyrightRestricted),
            status => Err(StreamError::Api {
                status,
                err_code: body.err_code,
            }),
        }
    }
}

#[async_trait]
impl UrlSource for StreamClient {
    async fn resolve(&self, request: &ResolveRequest) -> aria_core::Result<ResolvedUrls> {
        Ok(self.fetch_song_url(request).await?)
    }
}

//! Wire types for the streaming service API.

use serde::Deserialize;

/// Configuration for a [`crate::StreamClient`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Service base URL, e.g. `https://api.example.com`
    pub base_url: String,

    /// Account identifier, forwarded on resolution requests when present
    pub user_id: Option<String>,

    /// Session token, forwarded alongside `user_id`
    pub token: Option<String>,
}

impl StreamConfig {
    /// Config for anonymous access to a service instance.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_id: None,
            token: None,
        }
    }

    /// Attach account credentials.
    pub fn with_auth(mut self, user_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.token = Some(token.into());
        self
    }
}

/// Response envelope of the `/song/url` endpoint.
#[derive(Debug, Deserialize)]
pub struct UrlResponse {
    /// 1 on success, 2 when the track is not licensed
    pub status: i64,

    /// Service error code, 0 when absent
    #[serde(default, rename = "errcode")]
    pub err_code: i64,

    /// URL candidates; both lists come back empty on failure
    #[serde(flatten)]
    pub payload: UrlPayload,
}

/// URL candidate lists inside a [`UrlResponse`].
#[derive(Debug, Default, Deserialize)]
pub struct UrlPayload {
    /// Primary CDN candidates, best first
    #[serde(default)]
    pub url: Vec<String>,

    /// Backup CDN candidates
    #[serde(default, rename = "backupUrl")]
    pub backup_url: Vec<String>,
}

//! Integration tests for the streaming client against a mock HTTP server.

use aria_core::{AudioQuality, PlaybackError, ResolveRequest, UrlSource};
use aria_stream::{StreamClient, StreamConfig, StreamError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches only requests that do NOT carry the named query parameter.
struct NoQueryParam(&'static str);

impl Match for NoQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

fn request(track_id: &str) -> ResolveRequest {
    ResolveRequest {
        track_id: track_id.to_string(),
        quality: AudioQuality::High,
        album_id: None,
        album_audio_id: None,
        free_preview: false,
        prefer_compatible: false,
    }
}

async fn client_for(server: &MockServer) -> StreamClient {
    StreamClient::new(StreamConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn successful_resolution_returns_ranked_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .and(query_param("hash", "abc123"))
        .and(query_param("quality", "320"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "url": ["https://cdn-a.example.com/a.mp3", "https://cdn-b.example.com/a.mp3"],
            "backupUrl": ["https://backup.example.com/a.mp3"]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let urls = client.resolve(&request("abc123")).await.unwrap();

    assert_eq!(urls.primary.len(), 2);
    assert_eq!(urls.primary[0], "https://cdn-a.example.com/a.mp3");
    assert_eq!(urls.backup, vec!["https://backup.example.com/a.mp3"]);
}

#[tokio::test]
async fn copyright_status_maps_to_restriction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 2
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.resolve(&request("abc123")).await.unwrap_err();
    assert!(matches!(err, PlaybackError::CopyrightRestricted));
}

#[tokio::test]
async fn unexpected_status_is_an_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "errcode": 20010
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.resolve(&request("abc123")).await.unwrap_err();
    assert!(matches!(err, PlaybackError::Unknown(message) if message.contains("20010")));
}

#[tokio::test]
async fn http_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.resolve(&request("abc123")).await.is_err());
}

#[tokio::test]
async fn auth_and_context_params_are_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .and(query_param("hash", "abc123"))
        .and(query_param("album_id", "al-9"))
        .and(query_param("album_audio_id", "aa-7"))
        .and(query_param("userid", "u-1"))
        .and(query_param("token", "t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "url": ["https://cdn.example.com/a.mp3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StreamClient::new(
        StreamConfig::new(server.uri()).with_auth("u-1", "t-1"),
    )
    .unwrap();
    assert!(client.is_authenticated());

    let mut req = request("abc123");
    req.album_id = Some("al-9".to_string());
    req.album_audio_id = Some("aa-7".to_string());
    let urls = client.resolve(&req).await.unwrap();
    assert_eq!(urls.primary.len(), 1);
}

#[tokio::test]
async fn anonymous_vip_track_requests_preview_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .and(query_param("free_part", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "url": ["https://cdn.example.com/a.mp3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut req = request("abc123");
    req.free_preview = true;
    client.resolve(&req).await.unwrap();
}

#[tokio::test]
async fn authenticated_vip_track_gets_the_full_stream() {
    let server = MockServer::start().await;
    // Credentials present: the preview marker must not be sent, so the
    // account is served the full stream.
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .and(query_param("userid", "u-1"))
        .and(NoQueryParam("free_part"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "url": ["https://cdn.example.com/a.mp3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = StreamClient::new(
        StreamConfig::new(server.uri()).with_auth("u-1", "t-1"),
    )
    .unwrap();
    let mut req = request("abc123");
    req.free_preview = true;
    client.resolve(&req).await.unwrap();
}

#[tokio::test]
async fn compatibility_preference_requests_mp3() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/song/url"))
        .and(query_param("quality", "flac"))
        .and(query_param("format", "mp3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 1,
            "url": ["https://cdn.example.com/a.mp3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut req = request("abc123");
    req.quality = AudioQuality::Lossless;
    req.prefer_compatible = true;
    client.resolve(&req).await.unwrap();
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_normalized() {
    let client = StreamClient::new(StreamConfig::new("https://api.example.com/")).unwrap();
    assert_eq!(client.base_url(), "https://api.example.com");
}

#[tokio::test]
async fn invalid_base_url_is_rejected() {
    assert!(matches!(
        StreamClient::new(StreamConfig::new("")),
        Err(StreamError::InvalidBaseUrl(_))
    ));
    assert!(matches!(
        StreamClient::new(StreamConfig::new("ftp://example.com")),
        Err(StreamError::InvalidBaseUrl(_))
    ));
}

//! End-to-end tests of the HTTP API with in-process Spotify and Genius stand-ins.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use setlyrics::{
    clients::{
        CatalogSource, LyricsSource,
        entities::Track,
        errors::{Error, LyricsError, Result},
    },
    collector::{Collector, Config},
    lyrics::{LyricsCache, LyricsFetcher, LyricsPolicy},
    pool::TaskPool,
    settings::DEFAULT_ALLOWED_ORIGIN,
};
use tower::ServiceExt;

struct StubCatalog {
    tracks: Vec<Track>,
    status: Option<u16>,
    calls: AtomicUsize,
}

#[async_trait]
impl CatalogSource for StubCatalog {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(playlist_id, "ABC123");
        match self.status {
            Some(status) => Err(Error::CatalogFetchFailed {
                status: Some(status),
                message: "invalid base62 id".into(),
            }),
            None => Ok(self.tracks.clone()),
        }
    }
}

struct StubLyrics {
    calls: AtomicUsize,
}

#[async_trait]
impl LyricsSource for StubLyrics {
    async fn search_lyrics(
        &self,
        name: &str,
        _artists: &str,
    ) -> std::result::Result<Option<String>, LyricsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((name == "Song").then(|| "La la la".to_string()))
    }
}

struct Harness {
    router: Router,
    catalog: Arc<StubCatalog>,
    lyrics: Arc<StubLyrics>,
}

fn harness(tracks: Vec<Track>, status: Option<u16>) -> Harness {
    let catalog = Arc::new(StubCatalog {
        tracks,
        status,
        calls: AtomicUsize::new(0),
    });
    let lyrics = Arc::new(StubLyrics {
        calls: AtomicUsize::new(0),
    });
    let collector = Collector::new(Config {
        catalog: catalog.clone(),
        lyrics: Arc::new(LyricsFetcher::new(
            lyrics.clone(),
            LyricsPolicy::Cached(Arc::new(LyricsCache::new())),
        )),
        pool: TaskPool::new(4, Duration::from_secs(5)),
        page_size: 5,
    });
    let router =
        setlyrics::http_api::create_router(Arc::new(collector), DEFAULT_ALLOWED_ORIGIN).unwrap();
    Harness {
        router,
        catalog,
        lyrics,
    }
}

fn post_lyrics(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/get_lyrics")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn song() -> Track {
    Track::new("Song", vec!["Artist".into()])
}

#[tokio::test]
async fn index_reports_liveness() {
    let h = harness(vec![], None);
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Servidor em execução! Acesse a API em /api/get_lyrics"
    );
}

#[tokio::test]
async fn get_on_lyrics_endpoint_gives_usage_hint() {
    let h = harness(vec![], None);
    let request = Request::get("/api/get_lyrics").body(Body::empty()).unwrap();
    let (status, body) = send(&h.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Use o método POST para obter as letras"
    );
}

#[tokio::test]
async fn playlist_with_one_track() {
    let h = harness(vec![song()], None);
    let request = post_lyrics(
        json!({"playlist_link": "https://open.spotify.com/playlist/ABC123?si=xyz"}).to_string(),
    );
    let (status, body) = send(&h.router, request).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body,
        json!({"lyrics": [{"name": "Song", "artists": "Artist", "lyrics": "La la la"}]})
    );
}

#[tokio::test]
async fn repeated_tracks_hit_the_cache() {
    let h = harness(
        vec![
            song(),
            Track::new("Other", vec!["A".into(), "B".into()]),
            song(),
        ],
        None,
    );
    let link = json!({"playlist_link": "https://open.spotify.com/playlist/ABC123?si=xyz"});
    let (status, _) = send(&h.router, post_lyrics(link.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&h.router, post_lyrics(link.to_string())).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = body["lyrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Song", "Other", "Song"]);
    assert_eq!(body["lyrics"][1]["artists"], "A, B");
    assert_eq!(body["lyrics"][1]["lyrics"], "Letra não encontrada");
    // "Song - Artist" may be looked up twice by the first request's concurrent page
    assert!(h.lyrics.calls.load(Ordering::SeqCst) <= 3);
    assert_eq!(h.catalog.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn invalid_link_is_a_bad_request() {
    let h = harness(vec![song()], None);
    let (status, body) = send(
        &h.router,
        post_lyrics(json!({"playlist_link": "not-a-url"}).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"error": "link da playlist inválido"}));
    assert_eq!(h.catalog.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.lyrics.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_or_malformed_body_is_a_bad_request() {
    let h = harness(vec![song()], None);
    for body in ["{}", "{\"playlist_link\": null}", "not json"] {
        let (status, response) = send(&h.router, post_lyrics(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        let response: Value = serde_json::from_slice(&response).unwrap();
        assert!(response["error"].is_string());
    }
    assert_eq!(h.catalog.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn catalog_failure_is_a_server_error() {
    let h = harness(vec![], Some(400));
    let (status, body) = send(
        &h.router,
        post_lyrics(
            json!({"playlist_link": "https://open.spotify.com/playlist/ABC123?si=xyz"})
                .to_string(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("erro ao buscar a playlist:"), "{message}");
    assert!(message.contains("invalid base62 id"), "{message}");
    assert_eq!(h.lyrics.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cors_allows_only_the_configured_origin() {
    let h = harness(vec![], None);

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/get_lyrics")
        .header(header::ORIGIN, DEFAULT_ALLOWED_ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(preflight).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        DEFAULT_ALLOWED_ORIGIN
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );

    let foreign = Request::builder()
        .method(Method::GET)
        .uri("/api/get_lyrics")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(foreign).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::clients::{
    entities::LyricsResult,
    errors::{Error, Result},
};
use crate::collector::Collector;

const INDEX_TEXT: &str = "Servidor em execução! Acesse a API em /api/get_lyrics";
const USAGE_TEXT: &str = "Use o método POST para obter as letras";
const INVALID_LINK_TEXT: &str = "link da playlist inválido";

/// Body of `POST /api/get_lyrics`
#[derive(Debug, Serialize, Deserialize)]
pub struct LyricsRequest {
    /// Link copied from the Spotify app
    pub playlist_link: Option<String>,
}

/// Successful response of `POST /api/get_lyrics`
#[derive(Debug, Serialize, Deserialize)]
pub struct LyricsResponse {
    /// One entry per playlist track, in playlist order
    pub lyrics: Vec<LyricsResult>,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
}

/// Errors a handler can answer with
#[derive(Debug)]
pub enum ApiError {
    /// The body had no usable playlist link
    InvalidLink,
    /// Spotify could not be queried
    Upstream(Error),
    /// The collection task died
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidLink(_) => ApiError::InvalidLink,
            other => ApiError::Upstream(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidLink => (StatusCode::BAD_REQUEST, INVALID_LINK_TEXT.to_string()),
            ApiError::Upstream(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("erro ao buscar a playlist: {err}"),
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("erro interno: {message}"),
            ),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    collector: Arc<Collector>,
}

/// Build the router. CORS applies to `/api/*` only and allows `allowed_origin`.
pub fn create_router(collector: Arc<Collector>, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin).map_err(|e| {
        Error::ConfigurationError(format!("Invalid allowed origin {allowed_origin:?}: {e}"))
    })?;
    let cors = CorsLayer::new()
        .allow_origin([origin])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/api/get_lyrics", get(usage).post(get_lyrics))
        .layer(cors)
        .route("/", get(index))
        .with_state(AppState { collector });
    Ok(router)
}

/// Serve `router` on `bind_addr` until Ctrl+C.
pub async fn serve(router: Router, bind_addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, finishing in-flight requests ...");
}

async fn index() -> &'static str {
    INDEX_TEXT
}

async fn usage() -> &'static str {
    USAGE_TEXT
}

async fn get_lyrics(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LyricsRequest>, JsonRejection>,
) -> std::result::Result<Json<LyricsResponse>, ApiError> {
    let link = match payload {
        Ok(Json(LyricsRequest {
            playlist_link: Some(link),
        })) => link,
        Ok(_) => {
            warn!("Request without playlist_link");
            return Err(ApiError::InvalidLink);
        }
        Err(rejection) => {
            warn!("Rejected request body: {rejection}");
            return Err(ApiError::InvalidLink);
        }
    };

    // Spawned so a client hanging up does not cancel lookups already in flight
    let collector = Arc::clone(&state.collector);
    let task = tokio::spawn(async move { collector.collect(&link).await });
    let lyrics = match task.await {
        Ok(Ok(lyrics)) => lyrics,
        Ok(Err(e @ Error::InvalidLink(_))) => {
            warn!("{e}");
            return Err(ApiError::from(e));
        }
        Ok(Err(e)) => {
            error!("Failed to collect lyrics: {e}");
            return Err(ApiError::from(e));
        }
        Err(e) => {
            error!("Lyrics collection task failed: {e}");
            return Err(ApiError::Internal(e.to_string()));
        }
    };
    Ok(Json(LyricsResponse { lyrics }))
}

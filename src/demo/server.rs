//! HTTP endpoint serving the demo list

use super::{lyrics_source, Line};
use crate::error::{Error, Result};
use crate::source::{MemorySource, PageSource};
use crate::types::{Page, PageRequest, PageSize};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Demo server configuration
#[derive(Debug, Clone)]
pub struct DemoServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Delay added to every page response
    pub latency: Option<Duration>,
}

impl Default for DemoServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            latency: Some(super::DEMO_LATENCY),
        }
    }
}

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    source: MemorySource<Line>,
}

/// Query string of the items endpoint
#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    offset: u64,
    #[serde(default = "default_limit")]
    limit: u64,
}

fn default_limit() -> u64 {
    PageSize::DEFAULT.get()
}

/// Build the demo router
///
/// - `GET /health`
/// - `GET /items?offset=0&limit=5` returns `{ "items": [...], "total": n }`
pub fn router(latency: Option<Duration>) -> Router {
    let state = AppState {
        source: lyrics_source(latency),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/items", get(items))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the demo HTTP server
pub async fn serve(config: DemoServerConfig) -> Result<()> {
    let app = router(config.latency);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Serving demo list on http://{}/items", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Io)?;

    axum::serve(listener, app).await.map_err(Error::Io)?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Page of demo lines
async fn items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> std::result::Result<Json<Page<Line>>, (StatusCode, Json<serde_json::Value>)> {
    let size = PageSize::new(query.limit).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    let page = match state.source.fetch(PageRequest::new(query.offset, size)).await {
        Ok(page) => page,
        Err(never) => match never {},
    };
    Ok(Json(page))
}

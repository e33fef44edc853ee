//! Sanity-check endpoints: plain-text root and JSON health

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Body of `GET /`
pub const GREETING: &str = "Hello, libris is working!";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /
async fn home() -> &'static str {
    GREETING
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
}

//! Token API: token issuance and the token-protected book list

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use super::accounts::{obtain_token, CredentialsRequest, TokenResponse};
use crate::db::repos::{ShelfBook, ShelfFilter};
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;

/// POST /api-token-auth - `{username, password}` to `{token}`
async fn token_auth(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    Ok(Json(obtain_token(&state.pool, &req).await?))
}

/// GET /api/books - bookshelf books for token holders
async fn books(
    state: State<Arc<AppState>>,
    _auth: AuthUser,
    filter: Query<ShelfFilter>,
) -> Result<Json<Vec<ShelfBook>>, ApiError> {
    super::shelf::list_books(state, filter).await
}

/// API routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api-token-auth", post(token_auth))
        .route("/api/books", get(books))
}

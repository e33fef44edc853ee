//! Comment endpoints under `/blog`
//!
//! Anyone with a token may comment; only a comment's author may edit or
//! delete it.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::db::repos::{Comment, CommentRepo, Owned};
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;
use crate::models::Content;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub content: String,
}

const NOT_AUTHOR: &str = "only the author may change this comment";

/// POST /blog/post/{id} and /blog/post/{id}/comments/new
pub(crate) async fn add_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(post_id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let content = Content::new(&req.content)?;
    let comment = CommentRepo::new(&state.pool)
        .create(auth.user.id, post_id, &content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn owned_comment(state: &AppState, auth: &AuthUser, id: i64) -> Result<Comment, ApiError> {
    let comment = CommentRepo::new(&state.pool).get(id).await?;
    if comment.author_id != auth.user.id {
        return Err(ApiError::forbidden(NOT_AUTHOR));
    }
    Ok(comment)
}

/// GET /blog/comment/{id}/update and /blog/comment/{id}/delete
async fn show_own_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(owned_comment(&state, &auth, id).await?))
}

/// POST /blog/comment/{id}/update
async fn update_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    let content = Content::new(&req.content)?;
    match CommentRepo::new(&state.pool)
        .update(auth.user.id, id, &content)
        .await?
    {
        Owned::Done(comment) => Ok(Json(comment)),
        Owned::NotOwner => Err(ApiError::forbidden(NOT_AUTHOR)),
    }
}

/// POST /blog/comment/{id}/delete
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    match CommentRepo::new(&state.pool).delete(auth.user.id, id).await? {
        Owned::Done(comment) => {
            tracing::debug!(post_id = comment.post_id, "comment removed from post");
            Ok(StatusCode::NO_CONTENT)
        }
        Owned::NotOwner => Err(ApiError::forbidden(NOT_AUTHOR)),
    }
}

/// Comment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/blog/post/{id}/comments/new", post(add_comment))
        .route(
            "/blog/comment/{id}/update",
            get(show_own_comment).post(update_comment),
        )
        .route(
            "/blog/comment/{id}/delete",
            get(show_own_comment).post(delete_comment),
        )
}

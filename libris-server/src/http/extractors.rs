//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiError;
use super::server::AppState;
use crate::db::{User, UserRepo};

/// Scheme word expected in the `Authorization` header
const TOKEN_SCHEME: &str = "Token";

/// The user owning the request's token.
///
/// Reads `Authorization: Token <key>`. A missing header or an unknown key
/// rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(ApiError::Unauthorized {
                reason: "authentication credentials were not provided",
            })?;

        let key = header
            .to_str()
            .ok()
            .and_then(parse_token_header)
            .ok_or(ApiError::Unauthorized {
                reason: "invalid token header",
            })?;

        let user = UserRepo::new(&state.pool)
            .user_for_token(key)
            .await?
            .ok_or(ApiError::Unauthorized {
                reason: "invalid token",
            })?;

        tracing::debug!(user_id = user.id, "request authenticated");
        Ok(Self { user })
    }
}

/// Split `Token <key>` into the key. The scheme is case-insensitive.
fn parse_token_header(value: &str) -> Option<&str> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let key = parts.next()?;

    if !scheme.eq_ignore_ascii_case(TOKEN_SCHEME) || parts.next().is_some() {
        return None;
    }
    Some(key)
}

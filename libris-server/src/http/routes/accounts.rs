//! Account endpoints: registration, login/logout, profile
//!
//! Login hands out the user's API token; logout revokes it. Both
//! registration forms log the new user in by issuing a token.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::repos::{User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;
use crate::models::{Email, EmailPolicy, FormErrors, Registration, ValidationError, NON_FIELD};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password1: String,
    pub password2: String,
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// A freshly registered user, already logged in
#[derive(Serialize)]
pub struct RegisteredResponse {
    pub user: User,
    pub token: String,
}

/// Validate a login form and return the user's token.
///
/// Blank fields are field errors; a wrong pair is a single non-field error
/// so the response never reveals which half was wrong.
pub(crate) async fn obtain_token(
    pool: &SqlitePool,
    req: &CredentialsRequest,
) -> Result<TokenResponse, ApiError> {
    let mut errors = FormErrors::new();
    if req.username.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "username" });
    }
    if req.password.is_empty() {
        errors.push(ValidationError::Empty { field: "password" });
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let repo = UserRepo::new(pool);
    let user = repo
        .authenticate(req.username.trim(), &req.password)
        .await?
        .ok_or(ValidationError::Rejected {
            field: NON_FIELD,
            reason: "unable to log in with provided credentials",
        })?;

    let token = repo.get_or_create_token(user.id).await?;
    Ok(TokenResponse { token: token.key })
}

async fn register_with(
    pool: &SqlitePool,
    req: RegisterRequest,
    policy: EmailPolicy,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let registration = Registration::validate(
        &req.username,
        req.email.as_deref(),
        &req.password1,
        &req.password2,
        policy,
    )?;

    let repo = UserRepo::new(pool);
    let user = repo.register(&registration).await?;
    let token = repo.get_or_create_token(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse {
            user,
            token: token.key,
        }),
    ))
}

/// POST /blog/register - username, email, and password pair
async fn blog_register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    register_with(&state.pool, req, EmailPolicy::Required).await
}

/// POST /relationship/register - email optional
async fn catalog_register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    register_with(&state.pool, req, EmailPolicy::Optional).await
}

/// POST /blog/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    Ok(Json(obtain_token(&state.pool, &req).await?))
}

/// POST /blog/logout - revokes the presented token
async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    UserRepo::new(&state.pool).revoke(auth.user.id).await?;
    tracing::info!(user_id = auth.user.id, "logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /blog/profile
async fn profile(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// POST /blog/profile - change email
async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let email = Email::new(&req.email)?;
    let user = UserRepo::new(&state.pool)
        .update_email(auth.user.id, &email)
        .await?;
    Ok(Json(user))
}

/// Account routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/relationship/register", post(catalog_register))
        .route("/blog/register", post(blog_register))
        .route("/blog/login", post(login))
        .route("/blog/logout", post(logout))
        .route("/blog/profile", get(profile).post(update_profile))
}

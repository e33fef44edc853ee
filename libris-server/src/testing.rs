//! Shared fixtures for unit and router tests

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use crate::db::{create_pool, migrate, NewPost, Post, PostRepo, User, UserRepo};
use crate::http::{build_router, AppState};
use crate::models::{Content, EmailPolicy, Registration, TagList, Title};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Fresh in-memory database with the schema applied.
pub async fn memory_pool() -> SqlitePool {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}

pub async fn create_user(pool: &SqlitePool, username: &str) -> User {
    let email = format!("{username}@example.com");
    let registration = Registration::validate(
        username,
        Some(email.as_str()),
        TEST_PASSWORD,
        TEST_PASSWORD,
        EmailPolicy::Required,
    )
    .unwrap();
    UserRepo::new(pool).register(&registration).await.unwrap()
}

/// User plus an issued token.
pub async fn login(pool: &SqlitePool, username: &str) -> (User, String) {
    let user = create_user(pool, username).await;
    let token = UserRepo::new(pool).get_or_create_token(user.id).await.unwrap();
    (user, token.key)
}

pub async fn create_post(pool: &SqlitePool, author_id: i64, title: &str) -> Post {
    let form = NewPost {
        title: Title::new(title).unwrap(),
        content: Content::new("body text").unwrap(),
        tags: TagList::default(),
    };
    PostRepo::new(pool)
        .create_post(author_id, &form, Utc::now())
        .await
        .unwrap()
}

/// Router over a fresh database, plus that database.
pub async fn test_app() -> (Router, SqlitePool) {
    let pool = memory_pool().await;
    let app = build_router(Arc::new(AppState { pool: pool.clone() }));
    (app, pool)
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token, None)
}

pub fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(Method::POST, uri, token, Some(body))
}

/// Drive one request through the router. Non-JSON bodies come back as a
/// JSON string; empty bodies as null.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

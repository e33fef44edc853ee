//! libris-server: library catalog, blog, and token API over HTTP
//!
//! SQLite storage through sqlx, validated domain input, and an axum router
//! exposing the catalog (`/relationship`), the bookshelf (`/bookshelf`),
//! the blog (`/blog`), and the token API (`/api`).

pub mod auth;
pub mod db;
pub mod http;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

pub use db::{create_pool, create_pool_with_options, migrate, DbError};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};

//! Database layer - connection pool, schema, and repositories
//!
//! # Design Principles
//!
//! - Connection pool with foreign keys on - cascades live in the schema
//! - All list operations use JOINs or batched lookups - no N+1 queries
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Transactions for multi-step operations

pub mod pool;
pub mod repos;
pub mod schema;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
pub use schema::migrate;
pub use sqlx::SqlitePool;

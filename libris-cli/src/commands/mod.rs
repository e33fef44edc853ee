//! Command implementations for the libris CLI

pub mod config;
pub mod createuser;
pub mod migrate;
pub mod seed;
pub mod serve;

use std::path::Path;

use anyhow::{Context, Result};
use libris_core::LibrisConfig;
use libris_server::db::{create_pool_with_options, migrate as apply_schema, SqlitePool};

pub use config::run_config;
pub use createuser::run_createuser;
pub use migrate::run_migrate;
pub use seed::run_seed;
pub use serve::run_serve;

/// Load the config file (explicit path or the default location) and apply
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<LibrisConfig> {
    let Some(path) = path else {
        return LibrisConfig::load().context("Failed to load config");
    };

    let mut config = LibrisConfig::load_from(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    config
        .apply_overrides(|key| std::env::var(key).ok())
        .context("Invalid environment override")?;
    Ok(config)
}

/// Open the configured database and bring its schema up to date.
pub async fn open_database(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let pool = create_pool_with_options(url, max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", url))?;
    apply_schema(&pool).await.context("Failed to apply migrations")?;
    Ok(pool)
}

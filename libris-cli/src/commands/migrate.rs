//! Apply the database schema

use std::path::Path;

use anyhow::Result;
use clap::Parser;

use super::{load_config, open_database};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_migrate(args: MigrateArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let url = args.database_url.unwrap_or(config.database.url);

    let pool = open_database(&url, config.database.max_connections).await?;
    pool.close().await;

    println!("Schema is up to date: {}", url);
    Ok(())
}

//! libris CLI - library catalog, blog, and token API service
//!
//! Entry point for the `libris` binary:
//! - `serve` runs the HTTP server (migrating first)
//! - `migrate` applies the SQLite schema
//! - `seed` loads the sample catalog and prints the relationship report
//! - `createuser` registers an account from the shell
//! - `config` manages ~/.libris/config.toml

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "libris",
    author,
    version,
    about = "Library catalog, blog, and token API service",
    long_about = "Serve a library catalog with authors, books, libraries and librarians, \
                  a blog with tags, search and comments, and a token-protected API, \
                  all backed by a single SQLite file."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: $LIBRIS_CONFIG or ~/.libris/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Load sample authors, books, libraries and librarians
    Seed(commands::seed::SeedArgs),
    /// Create a user account
    Createuser(commands::createuser::CreateUserArgs),
    /// Manage libris configuration (path, show, init)
    Config(commands::config::ConfigArgs),
}

/// Logging level from the config file, if it can be read at all.
///
/// Errors here are reported later by the command that loads the config.
fn configured_level(path: Option<&std::path::Path>) -> String {
    commands::load_config(path)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        default_level: configured_level(config_path),
    })
    .ok();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config_path).await?,
        Commands::Migrate(args) => commands::run_migrate(args, config_path).await?,
        Commands::Seed(args) => commands::run_seed(args, config_path).await?,
        Commands::Createuser(args) => commands::run_createuser(args, config_path).await?,
        Commands::Config(args) => commands::run_config(args, config_path)?,
    }
    Ok(())
}

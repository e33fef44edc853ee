//! Create a user account from the command line

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Parser;

use libris_server::db::UserRepo;
use libris_server::models::{EmailPolicy, Registration};

use super::{load_config, open_database};

#[derive(Parser, Debug)]
pub struct CreateUserArgs {
    /// Login name (letters, digits and @ . + - _)
    pub username: String,

    /// Email address
    #[arg(long)]
    pub email: Option<String>,

    /// Password (at least 8 characters, not entirely numeric)
    #[arg(long, env = "LIBRIS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Also issue an API token and print it
    #[arg(long)]
    pub token: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

pub async fn run_createuser(args: CreateUserArgs, config_path: Option<&Path>) -> Result<()> {
    let registration = Registration::validate(
        &args.username,
        args.email.as_deref(),
        &args.password,
        &args.password,
        EmailPolicy::Optional,
    )
    .map_err(|errors| anyhow!("invalid user: {}", errors))?;

    let config = load_config(config_path)?;
    let url = args.database_url.unwrap_or(config.database.url);
    let pool = open_database(&url, config.database.max_connections).await?;

    let repo = UserRepo::new(&pool);
    let user = repo.register(&registration).await?;
    println!("Created user {} (id {})", user.username, user.id);

    if args.token {
        let token = repo.get_or_create_token(user.id).await?;
        println!("Token: {}", token.key);
    }

    pool.close().await;
    Ok(())
}

//! Manage the libris config file

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libris_core::LibrisConfig;

use super::load_config;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Print the effective config (file + environment overrides)
    Show(ShowArgs),
    /// Write a config file with default values
    Init(InitArgs),
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Print as JSON instead of TOML
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

pub fn run_config(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(LibrisConfig::config_path);

    match args.command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show(args) => run_show(&path, args),
        ConfigCommands::Init(args) => run_init(&path, args),
    }
}

fn run_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

fn run_show(path: &Path, args: ShowArgs) -> Result<()> {
    let config = load_config(Some(path))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn run_init(path: &Path, args: InitArgs) -> Result<()> {
    LibrisConfig::default()
        .save_to(path, args.force)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default config to {}", path.display());
    Ok(())
}

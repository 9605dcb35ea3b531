//! Operator CLI for Botsify
//!
//! Runs the application core outside the browser: replays navigations
//! through the authorization guard and prints the API parameters a list view
//! would request.

use anyhow::{Context, Result};
use botsify_app::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::{
    navigate::{handle_navigate_command, NavigateCommand},
    params::{handle_params_command, ParamsCommand},
};

#[derive(Parser)]
#[command(name = "botsify")]
#[command(about = "Botsify - navigation and list-parameter tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "botsify.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a navigation through the authorization guard
    Navigate(NavigateCommand),

    /// Print the API parameters for a list view
    Params(ParamsCommand),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load_from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config
        .merge_with_env()
        .context("applying BOTSIFY_* overrides")?;

    match cli.command {
        Commands::Navigate(cmd) => handle_navigate_command(cmd, &config)?,
        Commands::Params(cmd) => handle_params_command(cmd, &config)?,
    }

    Ok(())
}

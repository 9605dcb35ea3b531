//! Navigation replay
//!
//! Feeds a session snapshot and a target path through the guard and router
//! driver, then prints every hop and the final location.

use anyhow::{Context, Result};
use botsify_app::{AppConfig, NavigationGuard, Navigator, RouteTable, Session};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Replay one navigation
#[derive(Args)]
pub struct NavigateCommand {
    /// Session snapshot as the auth store's JSON
    #[arg(long, conflicts_with = "session_file")]
    pub session: Option<String>,

    /// Read the session snapshot from a JSON file
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Path to navigate to
    #[arg(long)]
    pub to: String,

    /// Location the navigation starts from
    #[arg(long, default_value = "/")]
    pub from: String,

    /// API key of the selected agent
    #[arg(long)]
    pub api_key: Option<String>,

    /// Treat sign-up as disabled by the whitelabel settings
    #[arg(long)]
    pub registration_disabled: bool,
}

/// Handle navigate command execution
pub fn handle_navigate_command(cmd: NavigateCommand, config: &AppConfig) -> Result<()> {
    let session = load_session(&cmd)?;
    info!(state = %session.state(&config.navigation.exempt_source), "Session loaded");
    let registration = config.navigation.registration_allowed && !cmd.registration_disabled;
    let routes = RouteTable::botsify()
        .with_unresolved_requires_auth(config.navigation.unresolved_requires_auth);

    let guard = NavigationGuard::new(
        config.navigation.clone(),
        session,
        registration,
        cmd.api_key,
    );
    let mut navigator = Navigator::new(&guard, routes).with_location(&cmd.from);
    let report = navigator
        .navigate(&cmd.to)
        .with_context(|| format!("navigating to {}", cmd.to))?;

    info!(
        to = %cmd.to,
        location = %report.location.full_path(),
        redirects = report.redirects(),
        "Navigation settled"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_session(cmd: &NavigateCommand) -> Result<Session> {
    let json = match (&cmd.session, &cmd.session_file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading session from {}", path.display()))?,
        (None, None) => return Ok(Session::default()),
    };
    Ok(Session::from_json(&json)?)
}

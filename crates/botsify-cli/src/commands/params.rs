//! List parameter preview
//!
//! Drives a [`FilterManager`] the way a list view does and prints the
//! parameters it would hand to the HTTP client.

use anyhow::{anyhow, bail, Result};
use botsify_app::{
    AppConfig, BaseParams, DateRange, FilterManager, FilterValue, SortOrder,
};
use chrono::NaiveDate;
use clap::{Args, ValueEnum};

/// Which list view to build parameters for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Entity {
    /// Base parameters only
    Base,
    /// Users list
    Users,
    /// Conversations list
    Conversations,
}

/// Print API parameters for a list view
#[derive(Args)]
pub struct ParamsCommand {
    /// List view
    #[arg(long, value_enum, default_value = "users")]
    pub entity: Entity,

    /// Page number
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size (20, 50 or 100)
    #[arg(long)]
    pub per_page: Option<u32>,

    /// Search text
    #[arg(long)]
    pub search: Option<String>,

    /// Sort column
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort direction
    #[arg(long)]
    pub sort_order: Option<SortOrder>,

    /// Entity filter as key=value, repeatable
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// First day of the date range (YYYY-MM-DD)
    #[arg(long, requires = "date_to")]
    pub date_from: Option<NaiveDate>,

    /// Last day of the date range (YYYY-MM-DD)
    #[arg(long, requires = "date_from")]
    pub date_to: Option<NaiveDate>,

    /// Print a form-encoded query string instead of JSON
    #[arg(long)]
    pub query_string: bool,
}

fn parse_filter(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got {raw:?}"))?;
    if key.is_empty() {
        bail!("empty filter key in {raw:?}");
    }
    Ok((key.to_string(), value.to_string()))
}

/// Handle params command execution
pub fn handle_params_command(cmd: ParamsCommand, config: &AppConfig) -> Result<()> {
    let manager = match cmd.entity {
        Entity::Base => FilterManager::new(&config.filters, BaseParams),
        Entity::Users => FilterManager::users(&config.filters),
        Entity::Conversations => FilterManager::conversations(&config.filters),
    };

    let mut updates: Vec<(String, FilterValue)> = cmd
        .filters
        .into_iter()
        .map(|(key, value)| (key, FilterValue::Text(value)))
        .collect();
    if let (Some(start), Some(end)) = (cmd.date_from, cmd.date_to) {
        if end < start {
            bail!("date range ends before it starts: {start} > {end}");
        }
        updates.push(("date".to_string(), DateRange::new(start, end).into()));
    }
    manager.update_filters(updates);

    if let Some(search) = cmd.search {
        manager.update_search(search);
    }
    if cmd.sort_by.is_some() || cmd.sort_order.is_some() {
        let (committed_by, committed_order) = manager.committed_sort();
        manager.update_sorting(
            cmd.sort_by.unwrap_or(committed_by),
            cmd.sort_order.unwrap_or(committed_order),
        );
    }
    manager.flush();

    // Pagination last: every other change sends the view back to page 1.
    if let Some(per_page) = cmd.per_page {
        manager.update_filter("per_page", per_page);
    }
    if let Some(page) = cmd.page {
        manager.update_filter("page", page);
    }

    let params = manager.to_api_params();
    if cmd.query_string {
        println!("{}", params.to_query_string());
    } else {
        println!("{}", serde_json::to_string_pretty(&params)?);
    }
    Ok(())
}

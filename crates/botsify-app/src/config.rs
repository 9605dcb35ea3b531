//! Application configuration
//!
//! Loaded from TOML, overridable through `BOTSIFY_*` environment variables,
//! and validated before use. Every field has a default so an empty or
//! missing file yields a working configuration.

use crate::errors::ConfigError;
use crate::filters::{PerPage, SortOrder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Placeholder substituted with the selected agent's API key.
pub const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// Upper bound for either debounce window.
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Navigation guard settings
    pub navigation: NavigationConfig,
    /// List-view filter settings
    pub filters: FilterConfig,
}

/// Navigation guard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Session source tag that bypasses verification and subscription gating
    pub exempt_source: String,
    /// Whitelabel registration flag used when no live collaborator is wired
    pub registration_allowed: bool,
    /// Route template for the default agent page, must contain `{api_key}`
    pub default_agent_route: String,
    /// Maximum hops the router driver follows before reporting a loop
    pub max_redirects: usize,
    /// Whether paths that match no route are treated as protected
    pub unresolved_requires_auth: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            exempt_source: "shopify".to_string(),
            registration_allowed: true,
            default_agent_route: "/agent/{api_key}/dashboard".to_string(),
            max_redirects: 10,
            unresolved_requires_auth: true,
        }
    }
}

impl NavigationConfig {
    /// Build the default agent route for `api_key`.
    pub fn agent_route(&self, api_key: &str) -> String {
        self.default_agent_route.replace(API_KEY_PLACEHOLDER, api_key)
    }
}

/// List-view filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Trailing-edge debounce window for search input
    pub search_debounce_ms: u64,
    /// Trailing-edge debounce window for sort changes
    pub sort_debounce_ms: u64,
    /// Page size restored on reset
    pub default_per_page: u32,
    /// Sort column restored on reset
    pub default_sort_by: String,
    /// Sort direction restored on reset
    pub default_sort_order: SortOrder,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: 500,
            sort_debounce_ms: 300,
            default_per_page: 20,
            default_sort_by: "id".to_string(),
            default_sort_order: SortOrder::Desc,
        }
    }
}

impl FilterConfig {
    /// Search debounce window.
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Sort debounce window.
    pub fn sort_debounce(&self) -> Duration {
        Duration::from_millis(self.sort_debounce_ms)
    }

    /// Default page size, falling back to 20 when the configured value is
    /// not one of the supported sizes.
    pub fn per_page(&self) -> PerPage {
        PerPage::try_from(self.default_per_page).unwrap_or_default()
    }
}

impl AppConfig {
    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Merge with `BOTSIFY_*` environment variables.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge with `BOTSIFY_*` overrides from an arbitrary variable source.
    ///
    /// Unknown `BOTSIFY_*` keys are ignored.
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), ConfigError> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix("BOTSIFY_") else {
                continue;
            };
            match name {
                "EXEMPT_SOURCE" => self.navigation.exempt_source = value,
                "REGISTRATION_ALLOWED" => {
                    self.navigation.registration_allowed = parse_flag(&key, &value)?;
                }
                "DEFAULT_PER_PAGE" => {
                    self.filters.default_per_page = value.parse().map_err(|_| {
                        ConfigError::invalid(key.as_str(), format!("not a number: {value}"))
                    })?;
                }
                _ => {}
            }
        }
        self.validate()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nav = &self.navigation;
        if !nav.default_agent_route.starts_with('/') {
            return Err(ConfigError::invalid(
                "navigation.default_agent_route",
                "must start with '/'",
            ));
        }
        if !nav.default_agent_route.contains(API_KEY_PLACEHOLDER) {
            return Err(ConfigError::invalid(
                "navigation.default_agent_route",
                format!("must contain {API_KEY_PLACEHOLDER}"),
            ));
        }
        if nav.max_redirects == 0 {
            return Err(ConfigError::invalid(
                "navigation.max_redirects",
                "must be at least 1",
            ));
        }

        let filters = &self.filters;
        if PerPage::try_from(filters.default_per_page).is_err() {
            return Err(ConfigError::invalid(
                "filters.default_per_page",
                "must be 20, 50 or 100",
            ));
        }
        for (field, value) in [
            ("filters.search_debounce_ms", filters.search_debounce_ms),
            ("filters.sort_debounce_ms", filters.sort_debounce_ms),
        ] {
            if value > MAX_DEBOUNCE_MS {
                return Err(ConfigError::invalid(
                    field,
                    format!("must not exceed {MAX_DEBOUNCE_MS}ms"),
                ));
            }
        }
        if filters.default_sort_by.trim().is_empty() {
            return Err(ConfigError::invalid(
                "filters.default_sort_by",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, format!("not a boolean: {value}"))),
    }
}

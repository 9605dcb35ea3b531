//! Categorized application errors
//!
//! Navigation and configuration each get their own error enum. Neither is
//! surfaced to end users directly: the navigation guard fails open on any
//! [`GateError`], and configuration errors stop the host before it starts.

use serde::{Deserialize, Serialize};

// ============================================================================
// Navigation Errors
// ============================================================================

/// Failures while evaluating or driving a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum GateError {
    /// The authentication store could not produce a session snapshot
    #[error("Session unavailable: {reason}")]
    SessionUnavailable {
        /// Why the snapshot could not be taken
        reason: String,
    },

    /// The whitelabel collaborator could not answer the registration flag
    #[error("Whitelabel settings unavailable: {reason}")]
    WhitelabelUnavailable {
        /// Why the flag could not be read
        reason: String,
    },

    /// The agent-selection collaborator failed
    #[error("Agent selection unavailable: {reason}")]
    AgentSelectionUnavailable {
        /// Why the selected agent could not be read
        reason: String,
    },

    /// An unresolved route needs the selected agent but none is selected
    #[error("No agent selected while resolving {path}")]
    MissingApiKey {
        /// Path that could not be resolved
        path: String,
    },

    /// The router kept redirecting without settling
    #[error("Redirect loop while navigating to {path} ({hops} hops)")]
    RedirectLoop {
        /// Path of the navigation that started the loop
        path: String,
        /// Number of hops taken before giving up
        hops: usize,
    },
}

impl GateError {
    /// Create a session-unavailable error
    pub fn session(reason: impl Into<String>) -> Self {
        Self::SessionUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a whitelabel-unavailable error
    pub fn whitelabel(reason: impl Into<String>) -> Self {
        Self::WhitelabelUnavailable {
            reason: reason.into(),
        }
    }

    /// Create an agent-selection error
    pub fn agent_selection(reason: impl Into<String>) -> Self {
        Self::AgentSelectionUnavailable {
            reason: reason.into(),
        }
    }

    /// Get a short error code string for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionUnavailable { .. } => "GATE_SESSION",
            Self::WhitelabelUnavailable { .. } => "GATE_WHITELABEL",
            Self::AgentSelectionUnavailable { .. } => "GATE_AGENT",
            Self::MissingApiKey { .. } => "GATE_NO_AGENT",
            Self::RedirectLoop { .. } => "GATE_LOOP",
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Failures while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read
    #[error("Failed to read config file {path}: {reason}")]
    Read {
        /// File that failed
        path: String,
        /// Underlying I/O error
        reason: String,
    },

    /// The configuration is not valid TOML for [`crate::AppConfig`]
    #[error("Failed to parse config: {reason}")]
    Parse {
        /// Parser message
        reason: String,
    },

    /// A value parsed but is out of range
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field name, e.g. `filters.default_per_page`
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-value error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

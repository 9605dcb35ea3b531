//! # Navigation Guard
//!
//! Boundary between the router and the [`AuthorizationGate`]. The guard owns
//! its collaborators explicitly (session store, whitelabel settings, agent
//! selection) and converts every error into [`Decision::Proceed`]. The
//! backend still authorizes every API call.

use super::gate::{AuthorizationGate, Decision, RegistrationPolicy};
use super::routes::NavigationTarget;
use super::session::SessionSource;
use crate::config::NavigationConfig;
use crate::errors::GateError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Agent-selection collaborator providing the currently selected API key.
pub trait AgentSelection {
    /// API key of the selected agent, `None` when no agent is selected.
    fn current_api_key(&self) -> Result<Option<String>, GateError>;
}

impl AgentSelection for Option<String> {
    fn current_api_key(&self) -> Result<Option<String>, GateError> {
        Ok(self.clone())
    }
}

impl AgentSelection for &str {
    fn current_api_key(&self) -> Result<Option<String>, GateError> {
        Ok(Some((*self).to_string()))
    }
}

impl<T: AgentSelection + ?Sized> AgentSelection for std::sync::Arc<T> {
    fn current_api_key(&self) -> Result<Option<String>, GateError> {
        (**self).current_api_key()
    }
}

/// What the router should do for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardResolution {
    /// Decision for the attempted navigation
    pub decision: Decision,
    /// Replace-navigation to perform in addition to the decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_navigation: Option<String>,
    /// Rule that produced the decision, `fail-open` after an error
    pub rule: String,
}

impl GuardResolution {
    fn fail_open() -> Self {
        Self {
            decision: Decision::Proceed,
            side_navigation: None,
            rule: "fail-open".to_string(),
        }
    }
}

/// Router-facing guard wiring the gate to its collaborators.
#[derive(Debug, Clone)]
pub struct NavigationGuard<S, R, A> {
    gate: AuthorizationGate,
    config: NavigationConfig,
    sessions: S,
    registration: R,
    agents: A,
}

impl<S, R, A> NavigationGuard<S, R, A>
where
    S: SessionSource,
    R: RegistrationPolicy,
    A: AgentSelection,
{
    /// Create a guard from configuration and collaborators.
    pub fn new(config: NavigationConfig, sessions: S, registration: R, agents: A) -> Self {
        Self {
            gate: AuthorizationGate::new(config.exempt_source.clone()),
            config,
            sessions,
            registration,
            agents,
        }
    }

    /// The wrapped gate.
    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Navigation configuration in use.
    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    /// Decide a navigation attempt. Never fails; errors resolve to `Proceed`.
    pub fn before_each(&self, to: &NavigationTarget, from: &NavigationTarget) -> GuardResolution {
        match self.try_before_each(to, from) {
            Ok(resolution) => resolution,
            Err(error) => {
                warn!(
                    to = %to.path,
                    from = %from.path,
                    code = error.code(),
                    error = %error,
                    "Navigation guard failed, proceeding"
                );
                GuardResolution::fail_open()
            }
        }
    }

    /// Decide a navigation attempt, surfacing collaborator errors.
    pub fn try_before_each(
        &self,
        to: &NavigationTarget,
        from: &NavigationTarget,
    ) -> Result<GuardResolution, GateError> {
        let session = self.sessions.session_snapshot()?;
        let verdict = self.gate.evaluate(to, from, &session, &self.registration)?;

        let side_navigation = if verdict.wants_agent_route {
            let api_key = self
                .agents
                .current_api_key()?
                .filter(|key| !key.is_empty())
                .ok_or_else(|| GateError::MissingApiKey {
                    path: to.path.clone(),
                })?;
            Some(self.config.agent_route(&api_key))
        } else {
            None
        };

        debug!(
            to = %to.path,
            from = %from.path,
            state = %session.state(self.gate.exempt_source()),
            rule = verdict.rule,
            decision = %verdict.decision,
            side_navigation = ?side_navigation,
            "Navigation guard decided"
        );

        Ok(GuardResolution {
            decision: verdict.decision,
            side_navigation,
            rule: verdict.rule.to_string(),
        })
    }
}

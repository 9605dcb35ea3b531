//! # Navigator
//!
//! Drives navigations the way the frontend router does: resolve the path,
//! ask the guard, follow redirects, then perform any side navigation as a
//! replace-navigation that goes through the guard as well.
//!
//! Redirects keep the original `from` location, matching the router's
//! behavior of re-running guards for the redirected target against the page
//! the user navigated away from.

use super::gate::{Decision, RegistrationPolicy};
use super::guard::{AgentSelection, NavigationGuard};
use super::routes::{NavigationTarget, RouteTable};
use super::session::SessionSource;
use crate::errors::GateError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One guard evaluation performed while navigating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationHop {
    /// Full path that was requested
    pub requested: String,
    /// Guard decision for the request
    pub decision: Decision,
    /// Rule that produced the decision
    pub rule: String,
    /// Replace-navigation requested alongside the decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_navigation: Option<String>,
}

/// Result of a completed navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationReport {
    /// Every guard evaluation, in order
    pub hops: Vec<NavigationHop>,
    /// Where the user ended up
    pub location: NavigationTarget,
}

impl NavigationReport {
    /// Number of redirects and side navigations followed.
    pub fn redirects(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }
}

/// Router driver around a [`NavigationGuard`].
pub struct Navigator<'g, S, R, A> {
    guard: &'g NavigationGuard<S, R, A>,
    routes: RouteTable,
    current: NavigationTarget,
}

impl<'g, S, R, A> Navigator<'g, S, R, A>
where
    S: SessionSource,
    R: RegistrationPolicy,
    A: AgentSelection,
{
    /// Create a navigator positioned at the router's start location.
    pub fn new(guard: &'g NavigationGuard<S, R, A>, routes: RouteTable) -> Self {
        Self {
            guard,
            routes,
            current: NavigationTarget::unresolved("/", false),
        }
    }

    /// Start from an already-displayed location (no guard evaluation).
    pub fn with_location(mut self, full_path: &str) -> Self {
        self.current = self.routes.resolve(full_path);
        self
    }

    /// Current location.
    pub fn location(&self) -> &NavigationTarget {
        &self.current
    }

    /// Navigate to `full_path`, following redirects and side navigations.
    ///
    /// The current location only changes when the navigation settles.
    pub fn navigate(&mut self, full_path: &str) -> Result<NavigationReport, GateError> {
        let max_redirects = self.guard.config().max_redirects;
        let mut from = self.current.clone();
        let mut requested = full_path.to_string();
        let mut hops = Vec::new();

        loop {
            if hops.len() > max_redirects {
                warn!(path = full_path, hops = hops.len(), "Navigation did not settle");
                return Err(GateError::RedirectLoop {
                    path: full_path.to_string(),
                    hops: hops.len(),
                });
            }

            let to = self.routes.resolve(&requested);
            let resolution = self.guard.before_each(&to, &from);
            hops.push(NavigationHop {
                requested: requested.clone(),
                decision: resolution.decision.clone(),
                rule: resolution.rule,
                side_navigation: resolution.side_navigation.clone(),
            });

            match resolution.decision {
                Decision::RedirectTo(next) => requested = next,
                Decision::Proceed => match resolution.side_navigation {
                    Some(side) => {
                        from = to;
                        requested = side;
                    }
                    None => {
                        debug!(
                            path = full_path,
                            location = %to.full_path(),
                            hops = hops.len(),
                            "Navigation settled"
                        );
                        self.current = to.clone();
                        return Ok(NavigationReport { hops, location: to });
                    }
                },
            }
        }
    }
}

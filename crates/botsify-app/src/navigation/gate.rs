//! # Authorization Gate
//!
//! Pure decision function evaluated on every navigation attempt. Given the
//! target, the previous location and a session snapshot it answers
//! [`Decision::Proceed`] or [`Decision::RedirectTo`]. Rules are evaluated in
//! order and the first match wins:
//!
//! 1. Signup while registration is disabled → login.
//! 2. Unauthenticated → proceed to public pages, otherwise login.
//! 3. Authenticated but neither verified nor subscribed → same as (2).
//! 4. Auth pages while signed in → home, plan selection or email
//!    verification depending on the session.
//! 5. Other pages → subscription/verification onboarding redirects,
//!    otherwise proceed. Unresolved routes additionally request a side
//!    navigation to the default agent route.
//!
//! The gate never mutates the session and never blocks; the only fallible
//! step is asking the whitelabel collaborator whether registration is open.

use super::routes::{NavigationTarget, SIGNUP_ROUTE};
use super::session::Session;
use crate::errors::GateError;
use serde::{Deserialize, Serialize};

/// Login page.
pub const LOGIN_PATH: &str = "/auth/login";
/// Landing page for subscribed users.
pub const HOME_PATH: &str = "/";
/// Plan selection page.
pub const CHOOSE_PLAN_PATH: &str = "/choose-plan";
/// Agent picker; the only page allowed to send subscribed users to plan selection.
pub const SELECT_AGENT_PATH: &str = "/select-agent";
/// Email verification page.
pub const VERIFY_EMAIL_PATH: &str = "/auth/verify-email";
/// Prefix of checkout and subscription management pages.
pub const SUBSCRIPTION_PREFIX: &str = "/subscription/";

/// Navigation decision handed to the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Let the navigation through.
    Proceed,
    /// Replace the navigation with one to this path (may carry a query).
    RedirectTo(String),
}

impl Decision {
    /// Create a redirect decision.
    pub fn redirect(path: impl Into<String>) -> Self {
        Self::RedirectTo(path.into())
    }

    /// Returns `true` if the navigation may proceed.
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }

    /// Returns the redirect path, if any.
    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Self::Proceed => None,
            Self::RedirectTo(path) => Some(path),
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::RedirectTo(path) => write!(f, "redirect to {path}"),
        }
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    /// The decision for the attempted navigation
    pub decision: Decision,
    /// Whether the router should also replace-navigate to the default agent route
    pub wants_agent_route: bool,
    /// Which rule produced the decision, for logs and reports
    pub rule: &'static str,
}

impl GateVerdict {
    fn proceed(rule: &'static str) -> Self {
        Self {
            decision: Decision::Proceed,
            wants_agent_route: false,
            rule,
        }
    }

    fn redirect(path: impl Into<String>, rule: &'static str) -> Self {
        Self {
            decision: Decision::redirect(path),
            wants_agent_route: false,
            rule,
        }
    }
}

/// Whitelabel collaborator answering whether self-service signup is open.
pub trait RegistrationPolicy {
    /// Whether new accounts may register.
    fn registration_allowed(&self) -> Result<bool, GateError>;
}

impl RegistrationPolicy for bool {
    fn registration_allowed(&self) -> Result<bool, GateError> {
        Ok(*self)
    }
}

impl<T: RegistrationPolicy + ?Sized> RegistrationPolicy for std::sync::Arc<T> {
    fn registration_allowed(&self) -> Result<bool, GateError> {
        (**self).registration_allowed()
    }
}

/// The navigation authorization gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGate {
    exempt_source: String,
}

impl AuthorizationGate {
    /// Create a gate; sessions whose `source` equals `exempt_source` bypass
    /// verification and subscription gating.
    pub fn new(exempt_source: impl Into<String>) -> Self {
        Self {
            exempt_source: exempt_source.into(),
        }
    }

    /// The configured exempt source tag.
    pub fn exempt_source(&self) -> &str {
        &self.exempt_source
    }

    /// Evaluate a navigation attempt.
    pub fn evaluate<R: RegistrationPolicy + ?Sized>(
        &self,
        to: &NavigationTarget,
        from: &NavigationTarget,
        session: &Session,
        registration: &R,
    ) -> Result<GateVerdict, GateError> {
        if to.name.as_deref() == Some(SIGNUP_ROUTE) && !registration.registration_allowed()? {
            return Ok(GateVerdict::redirect(LOGIN_PATH, "signup-disabled"));
        }

        // Signed-in users who are neither verified nor subscribed are gated
        // exactly like signed-out users.
        let verified = session.is_verified(&self.exempt_source);
        if !session.is_authenticated || !(verified || session.has_subscription) {
            return Ok(Self::unauthenticated(to));
        }

        let exempt = session.is_exempt(&self.exempt_source);
        if to.is_auth_page() {
            Ok(Self::auth_page(to, session, exempt))
        } else {
            Ok(Self::app_page(to, from, session, exempt))
        }
    }

    fn unauthenticated(to: &NavigationTarget) -> GateVerdict {
        if to.requires_auth {
            GateVerdict::redirect(LOGIN_PATH, "login-required")
        } else {
            GateVerdict::proceed("public")
        }
    }

    fn auth_page(to: &NavigationTarget, session: &Session, exempt: bool) -> GateVerdict {
        if session.has_subscription {
            return GateVerdict::redirect(HOME_PATH, "signed-in-home");
        }
        if session.email_verified && !exempt {
            return if to.path == CHOOSE_PLAN_PATH {
                GateVerdict::proceed("choose-plan")
            } else {
                GateVerdict::redirect(CHOOSE_PLAN_PATH, "needs-plan")
            };
        }
        if !session.email_verified && !exempt {
            return if to.path.starts_with(VERIFY_EMAIL_PATH) {
                GateVerdict::proceed("verify-email")
            } else {
                GateVerdict::redirect(verify_email_path(&session.email), "needs-verification")
            };
        }
        GateVerdict::proceed("auth-page")
    }

    fn app_page(
        to: &NavigationTarget,
        from: &NavigationTarget,
        session: &Session,
        exempt: bool,
    ) -> GateVerdict {
        let subscribed = session.has_subscription;

        if subscribed && to.path == CHOOSE_PLAN_PATH {
            return if from.path == SELECT_AGENT_PATH {
                GateVerdict::proceed("plan-change")
            } else {
                GateVerdict::redirect(HOME_PATH, "already-subscribed")
            };
        }
        if !to.requires_auth {
            return GateVerdict::proceed("public");
        }
        if !session.email_verified
            && !subscribed
            && !exempt
            && !to.path.starts_with(VERIFY_EMAIL_PATH)
        {
            return GateVerdict::redirect(verify_email_path(&session.email), "needs-verification");
        }
        if to.path.starts_with(SUBSCRIPTION_PREFIX) {
            return GateVerdict::proceed("subscription");
        }
        if session.email_verified && !subscribed && !exempt && to.path != CHOOSE_PLAN_PATH {
            return GateVerdict::redirect(CHOOSE_PLAN_PATH, "needs-plan");
        }

        let mut verdict = if from.path == to.path {
            GateVerdict::proceed("same-location")
        } else {
            GateVerdict::proceed("authorized")
        };
        verdict.wants_agent_route = to.name.is_none();
        verdict
    }
}

/// Build the verification page path with the email prefilled.
pub fn verify_email_path(email: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(email.as_bytes()).collect();
    format!("{VERIFY_EMAIL_PATH}?email={encoded}")
}

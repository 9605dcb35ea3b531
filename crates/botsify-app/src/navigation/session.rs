//! # Session Snapshot
//!
//! The authentication store hands the guard a [`Session`] snapshot on every
//! navigation. The guard only ever borrows it.

use crate::errors::GateError;
use serde::{Deserialize, Serialize};

/// Session snapshot taken at navigation time.
///
/// Deserializes from the auth store's camelCase JSON; missing keys default
/// to `false` or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
    /// Whether the user is signed in
    pub is_authenticated: bool,
    /// Whether the user confirmed their email address
    pub email_verified: bool,
    /// Whether the account has an active subscription
    pub has_subscription: bool,
    /// Lifetime-deal customer, treated as verified
    pub is_app_sumo_user: bool,
    /// Bot administrator, treated as verified
    pub is_bot_admin: bool,
    /// Origin tag of the session (e.g. a marketplace integration)
    pub source: String,
    /// Account email, used to prefill the verification page
    pub email: String,
}

/// Coarse gating state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Not signed in
    Unauthenticated,
    /// Signed in, neither verified nor subscribed
    AuthenticatedUnverified,
    /// Signed in and verified, no subscription yet
    AuthenticatedVerifiedNoSub,
    /// Signed in with an active subscription
    AuthenticatedSubscribed,
}

impl SessionState {
    /// Get a short label for logging/display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AuthenticatedUnverified => "unverified",
            Self::AuthenticatedVerifiedNoSub => "verified-no-subscription",
            Self::AuthenticatedSubscribed => "subscribed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Session {
    /// Whether the session originates from the exempt source.
    pub fn is_exempt(&self, exempt_source: &str) -> bool {
        !exempt_source.is_empty() && self.source == exempt_source
    }

    /// Whether the session counts as verified for gating purposes.
    ///
    /// AppSumo users, bot admins and exempt sessions are verified without
    /// confirming their email.
    pub fn is_verified(&self, exempt_source: &str) -> bool {
        self.email_verified
            || self.is_app_sumo_user
            || self.is_bot_admin
            || self.is_exempt(exempt_source)
    }

    /// Classify the snapshot.
    pub fn state(&self, exempt_source: &str) -> SessionState {
        if !self.is_authenticated {
            SessionState::Unauthenticated
        } else if self.has_subscription {
            SessionState::AuthenticatedSubscribed
        } else if self.is_verified(exempt_source) {
            SessionState::AuthenticatedVerifiedNoSub
        } else {
            SessionState::AuthenticatedUnverified
        }
    }

    /// Parse a snapshot from the auth store's JSON.
    pub fn from_json(json: &str) -> Result<Self, GateError> {
        serde_json::from_str(json).map_err(|e| GateError::session(format!("invalid snapshot: {e}")))
    }
}

/// Source of session snapshots (the authentication store).
pub trait SessionSource {
    /// Take a snapshot of the current session.
    fn session_snapshot(&self) -> Result<Session, GateError>;
}

impl SessionSource for Session {
    fn session_snapshot(&self) -> Result<Session, GateError> {
        Ok(self.clone())
    }
}

impl<T: SessionSource + ?Sized> SessionSource for std::sync::Arc<T> {
    fn session_snapshot(&self) -> Result<Session, GateError> {
        (**self).session_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXEMPT: &str = "shopify";

    fn signed_in() -> Session {
        Session {
            is_authenticated: true,
            email: "owner@example.com".to_string(),
            ..Session::default()
        }
    }

    #[test]
    fn test_state_classification() {
        assert_eq!(Session::default().state(EXEMPT), SessionState::Unauthenticated);
        assert_eq!(signed_in().state(EXEMPT), SessionState::AuthenticatedUnverified);

        let verified = Session {
            email_verified: true,
            ..signed_in()
        };
        assert_eq!(verified.state(EXEMPT), SessionState::AuthenticatedVerifiedNoSub);

        let subscribed = Session {
            has_subscription: true,
            ..signed_in()
        };
        assert_eq!(subscribed.state(EXEMPT), SessionState::AuthenticatedSubscribed);
    }

    #[test]
    fn test_verified_alternatives() {
        let app_sumo = Session {
            is_app_sumo_user: true,
            ..signed_in()
        };
        let admin = Session {
            is_bot_admin: true,
            ..signed_in()
        };
        let exempt = Session {
            source: EXEMPT.to_string(),
            ..signed_in()
        };
        for session in [app_sumo, admin, exempt] {
            assert!(session.is_verified(EXEMPT));
        }
    }

    #[test]
    fn test_empty_exempt_source_never_matches() {
        let session = signed_in();
        assert!(!session.is_exempt(""));
    }

    #[test]
    fn test_from_camel_case_json() {
        let session = Session::from_json(
            r#"{"isAuthenticated": true, "emailVerified": true, "email": "a@b.co"}"#,
        )
        .unwrap();
        assert!(session.is_authenticated);
        assert!(session.email_verified);
        assert!(!session.has_subscription);
        assert_eq!(session.email, "a@b.co");
    }

    #[test]
    fn test_from_invalid_json() {
        let err = Session::from_json("{not json").unwrap_err();
        assert_eq!(err.code(), "GATE_SESSION");
    }
}

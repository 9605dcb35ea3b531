//! # Route Table
//!
//! Resolves raw paths into [`NavigationTarget`]s the way the frontend router
//! does: the first matching record wins, `:param` segments match any single
//! segment, and the query string is carried along but never matched.

use serde::{Deserialize, Serialize};

/// Route name of the signup page, which whitelabel settings can disable.
pub const SIGNUP_ROUTE: &str = "signup";

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTarget {
    /// Path without query string
    pub path: String,
    /// Route name, `None` when no route matched
    pub name: Option<String>,
    /// Whether the route is only reachable when signed in
    pub requires_auth: bool,
    /// Raw query string without the leading `?`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl NavigationTarget {
    /// Create a named target.
    pub fn named(name: impl Into<String>, path: impl Into<String>, requires_auth: bool) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
            requires_auth,
            query: None,
        }
    }

    /// Create a target that matched no route.
    pub fn unresolved(path: impl Into<String>, requires_auth: bool) -> Self {
        Self {
            path: path.into(),
            name: None,
            requires_auth,
            query: None,
        }
    }

    /// Path plus query string.
    pub fn full_path(&self) -> String {
        match &self.query {
            Some(query) if !query.is_empty() => format!("{}?{}", self.path, query),
            _ => self.path.clone(),
        }
    }

    /// Whether this is a sign-in/sign-up style page.
    pub fn is_auth_page(&self) -> bool {
        self.path.starts_with("/auth/") || self.path == "/unauthenticated"
    }
}

/// A single route definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    /// Route name
    pub name: String,
    /// Path pattern, e.g. `/agent/:api_key/users`
    pub pattern: String,
    /// Whether the route is only reachable when signed in
    pub requires_auth: bool,
}

impl RouteRecord {
    /// Create a route record.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, requires_auth: bool) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            requires_auth,
        }
    }

    /// Whether `path` matches this record's pattern.
    pub fn matches(&self, path: &str) -> bool {
        let mut pattern = segments(&self.pattern);
        let mut path = segments(path);
        loop {
            match (pattern.next(), path.next()) {
                (None, None) => return true,
                (Some(expected), Some(actual)) => {
                    if !(expected.starts_with(':') || expected == actual) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Ordered set of routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteRecord>,
    unresolved_requires_auth: bool,
}

impl RouteTable {
    /// Create a table from records, matched in order.
    pub fn new(routes: Vec<RouteRecord>) -> Self {
        Self {
            routes,
            unresolved_requires_auth: true,
        }
    }

    /// Set whether unmatched paths are treated as protected.
    pub fn with_unresolved_requires_auth(mut self, requires_auth: bool) -> Self {
        self.unresolved_requires_auth = requires_auth;
        self
    }

    /// The Botsify application routes.
    pub fn botsify() -> Self {
        Self::new(vec![
            // Public auth pages
            RouteRecord::new("login", "/auth/login", false),
            RouteRecord::new(SIGNUP_ROUTE, "/auth/signup", false),
            RouteRecord::new("forgot-password", "/auth/forgot-password", false),
            RouteRecord::new("verify-email", "/auth/verify-email", false),
            RouteRecord::new("unauthenticated", "/unauthenticated", false),
            // Onboarding
            RouteRecord::new("home", "/", true),
            RouteRecord::new("choose-plan", "/choose-plan", true),
            RouteRecord::new("select-agent", "/select-agent", true),
            RouteRecord::new("subscription", "/subscription/:plan", true),
            // Agent workspace
            RouteRecord::new("agent-dashboard", "/agent/:api_key/dashboard", true),
            RouteRecord::new("agent-users", "/agent/:api_key/users", true),
            RouteRecord::new("agent-conversations", "/agent/:api_key/conversations", true),
            RouteRecord::new("agent-whatsapp", "/agent/:api_key/whatsapp", true),
            // Account
            RouteRecord::new("whitelabel", "/whitelabel", true),
            RouteRecord::new("invoices", "/billing/invoices", true),
        ])
    }

    /// All records in match order.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Resolve a path (optionally with query string) into a target.
    pub fn resolve(&self, full_path: &str) -> NavigationTarget {
        let (path, query) = match full_path.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (full_path, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        let mut target = match self.routes.iter().find(|route| route.matches(path)) {
            Some(route) => NavigationTarget::named(&route.name, path, route.requires_auth),
            None => NavigationTarget::unresolved(path, self.unresolved_requires_auth),
        };
        target.query = query;
        target
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::botsify()
    }
}

#![deny(clippy::await_holding_lock)]
//! # Botsify App - Headless Application Core
//!
//! Portable decision logic shared by the Botsify web client and tooling.
//! Frontends own rendering, routing and HTTP; this crate owns the two pieces
//! with real branching behavior:
//!
//! - [`navigation`]: the navigation-guard authorization state machine, the
//!   route table it resolves against, and a router driver that follows
//!   redirects.
//! - [`filters`]: the filter/sort/pagination manager used by list views,
//!   with trailing-edge debouncing and per-entity API parameter mapping.
//!
//! ```text
//! Navigation → Resolve route → Guard (session snapshot) → Proceed | RedirectTo
//! List input → FilterManager → (debounce) → ApiParams → subscriber
//! ```

pub mod config;
pub mod errors;
pub mod filters;
pub mod navigation;

pub use config::{AppConfig, FilterConfig, NavigationConfig};
pub use errors::{ConfigError, GateError};
pub use filters::{
    ApiParams, BaseParams, CommittedFilters, ConversationParams, DateRange, FilterKey,
    FilterManager, FilterState, FilterValue, ParamMapper, PerPage, Segment, SortOrder,
    UserParams,
};
pub use navigation::{
    AgentSelection, AuthorizationGate, Decision, GuardResolution, NavigationGuard,
    NavigationHop, NavigationReport, NavigationTarget, Navigator, RegistrationPolicy,
    RouteRecord, RouteTable, Session, SessionSource, SessionState,
};

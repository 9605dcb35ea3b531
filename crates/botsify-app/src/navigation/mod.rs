//! # Navigation
//!
//! Authorization for client-side navigation.
//!
//! ```text
//! path ──► RouteTable::resolve ──► NavigationGuard::before_each ──► Proceed
//!                                        │                          │
//!                                        └── RedirectTo ◄───────────┘ side navigation
//! ```
//!
//! - [`AuthorizationGate`]: pure, ordered decision rules over a [`Session`]
//! - [`NavigationGuard`]: collaborator wiring and fail-open boundary
//! - [`Navigator`]: router driver that follows redirects until settled

pub mod gate;
pub mod guard;
pub mod navigator;
pub mod routes;
pub mod session;

pub use gate::{verify_email_path, AuthorizationGate, Decision, GateVerdict, RegistrationPolicy};
pub use guard::{AgentSelection, GuardResolution, NavigationGuard};
pub use navigator::{NavigationHop, NavigationReport, Navigator};
pub use routes::{NavigationTarget, RouteRecord, RouteTable};
pub use session::{Session, SessionSource, SessionState};

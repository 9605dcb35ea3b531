//! # Filters
//!
//! Filter, sort and pagination handling for list views.
//!
//! - [`FilterManager`]: state owner with debounced search and sort input
//! - [`ParamMapper`]: per-entity translation into [`ApiParams`]
//! - [`FilterState`]: raw state and its value types

mod debounce;
pub mod manager;
pub mod mappers;
pub mod params;
pub mod state;

pub use manager::FilterManager;
pub use mappers::{
    BaseParams, CommittedFilters, ConversationParams, ParamMapper, Segment, UserParams,
};
pub use params::ApiParams;
pub use state::{DateRange, FilterKey, FilterState, FilterValue, PerPage, SortOrder};

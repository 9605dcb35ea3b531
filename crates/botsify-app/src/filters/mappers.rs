//! # Parameter Mappers
//!
//! Strategies turning committed filter state into transport parameters.
//! The manager always emits the base set (`page`, `per_page`, `sortby`,
//! `sortorder`); a [`ParamMapper`] adds the entity-specific fields.

use super::params::ApiParams;
use super::state::{DateRange, FilterValue, PerPage, SortOrder};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Committed view of a manager's state.
///
/// Search and sort fields hold the debounced values, not the raw input.
#[derive(Debug, Clone, Copy)]
pub struct CommittedFilters<'a> {
    /// Current page
    pub page: u32,
    /// Page size
    pub per_page: PerPage,
    /// Debounced search text
    pub search: &'a str,
    /// Debounced sort column
    pub sort_by: &'a str,
    /// Debounced sort direction
    pub sort_order: SortOrder,
    /// Entity-specific fields
    pub fields: &'a BTreeMap<String, FilterValue>,
}

impl CommittedFilters<'_> {
    /// Entity field value, if set.
    pub fn field(&self, name: &str) -> Option<&FilterValue> {
        self.fields.get(name)
    }

    /// Non-empty text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name)
            .and_then(FilterValue::as_text)
            .filter(|text| !text.is_empty())
    }

    /// Date range field.
    pub fn date_range(&self, name: &str) -> Option<&DateRange> {
        self.field(name).and_then(FilterValue::as_date_range)
    }

    /// The base parameter set shared by every entity.
    pub fn base_params(&self) -> ApiParams {
        let mut params = ApiParams::new();
        params.insert("page", self.page);
        params.insert("per_page", self.per_page.value());
        params.insert("sortby", self.sort_by);
        params.insert("sortorder", self.sort_order.as_str());
        params
    }
}

/// Adds entity-specific parameters on top of the base set.
pub trait ParamMapper: Send + Sync {
    /// Extend `params` from the committed filters.
    fn map_params(&self, filters: &CommittedFilters<'_>, params: &mut ApiParams);
}

impl<F> ParamMapper for F
where
    F: Fn(&CommittedFilters<'_>, &mut ApiParams) + Send + Sync,
{
    fn map_params(&self, filters: &CommittedFilters<'_>, params: &mut ApiParams) {
        self(filters, params);
    }
}

// ============================================================================
// Built-in Mappers
// ============================================================================

/// Base parameters only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseParams;

impl ParamMapper for BaseParams {
    fn map_params(&self, _filters: &CommittedFilters<'_>, _params: &mut ApiParams) {}
}

/// Users list: search, status, segment and date range.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserParams;

impl ParamMapper for UserParams {
    fn map_params(&self, filters: &CommittedFilters<'_>, params: &mut ApiParams) {
        insert_common(filters, params);
        if let Some(segment_id) = filters.field("segment").and_then(segment_id) {
            params.insert("segment_id", segment_id);
        }
    }
}

/// Conversations list: search, status and date range.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationParams;

impl ParamMapper for ConversationParams {
    fn map_params(&self, filters: &CommittedFilters<'_>, params: &mut ApiParams) {
        insert_common(filters, params);
    }
}

fn insert_common(filters: &CommittedFilters<'_>, params: &mut ApiParams) {
    if !filters.search.is_empty() {
        params.insert("query", filters.search);
    }
    if let Some(status) = filters.text("status").filter(|status| *status != "all") {
        params.insert("status", status);
    }
    if let Some(range) = filters.date_range("date") {
        params.insert("date", range.to_param());
    }
}

fn segment_id(value: &FilterValue) -> Option<i64> {
    if let Some(id) = value.as_integer() {
        return (id > 0).then_some(id);
    }
    let name = value.as_text()?;
    match name.parse::<Segment>() {
        Ok(segment) => segment.code(),
        Err(_) => {
            debug!(segment = name, "Unknown segment ignored");
            None
        }
    }
}

// ============================================================================
// Segments
// ============================================================================

/// Built-in user audience segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// No segment filter
    All,
    /// Users reached over SMS
    Sms,
    /// Users reached over WhatsApp
    Whatsapp,
    /// Users reached over Facebook Messenger
    Facebook,
    /// Users reached over the website widget
    Website,
}

impl Segment {
    /// Reserved backend id; `None` means no filter.
    pub fn code(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Sms => Some(-2),
            Self::Whatsapp => Some(-3),
            Self::Facebook => Some(-4),
            Self::Website => Some(-5),
        }
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Sms => "sms",
            Self::Whatsapp => "whatsapp",
            Self::Facebook => "facebook",
            Self::Website => "website",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "sms" => Ok(Self::Sms),
            "whatsapp" => Ok(Self::Whatsapp),
            "facebook" => Ok(Self::Facebook),
            "website" => Ok(Self::Website),
            other => Err(format!("unknown segment {other:?}")),
        }
    }
}

//! # Filter State
//!
//! Raw filter, sort and pagination state of one list view. The manager
//! applies updates here immediately; debounced fields are copied into the
//! committed view separately.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Page Size
// ============================================================================

/// Supported page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PerPage {
    /// 20 rows
    #[default]
    Twenty,
    /// 50 rows
    Fifty,
    /// 100 rows
    Hundred,
}

impl PerPage {
    /// Number of rows per page.
    pub fn value(self) -> u32 {
        match self {
            Self::Twenty => 20,
            Self::Fifty => 50,
            Self::Hundred => 100,
        }
    }
}

impl TryFrom<u32> for PerPage {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            20 => Ok(Self::Twenty),
            50 => Ok(Self::Fifty),
            100 => Ok(Self::Hundred),
            other => Err(format!("unsupported page size {other}")),
        }
    }
}

impl TryFrom<i64> for PerPage {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .map_err(|_| format!("unsupported page size {value}"))
            .and_then(Self::try_from)
    }
}

impl From<PerPage> for u32 {
    fn from(value: PerPage) -> Self {
        value.value()
    }
}

// ============================================================================
// Sort Order
// ============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    #[default]
    Desc,
}

impl SortOrder {
    /// Transport representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order {other:?}")),
        }
    }
}

// ============================================================================
// Values
// ============================================================================

/// Inclusive date range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Collapse into the backend's `YYYY/MM/DD-YYYY/MM/DD` form.
    pub fn to_param(&self) -> String {
        format!(
            "{}-{}",
            self.start.format("%Y/%m/%d"),
            self.end.format("%Y/%m/%d")
        )
    }
}

/// Value of a filter field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Free text or enum key
    Text(String),
    /// Numeric value (pages, ids)
    Integer(i64),
    /// Toggle
    Flag(bool),
    /// Date range
    DateRange(DateRange),
    /// Field cleared
    Empty,
}

impl FilterValue {
    /// Text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integer content; numeric text parses too.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Date range content.
    pub fn as_date_range(&self) -> Option<&DateRange> {
        match self {
            Self::DateRange(range) => Some(range),
            _ => None,
        }
    }

    /// Whether the value carries nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<DateRange> for FilterValue {
    fn from(value: DateRange) -> Self {
        Self::DateRange(value)
    }
}

impl From<SortOrder> for FilterValue {
    fn from(value: SortOrder) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

// ============================================================================
// Keys
// ============================================================================

/// Which part of the state an update targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// Current page
    Page,
    /// Page size
    PerPage,
    /// Search text
    Search,
    /// Sort column
    SortBy,
    /// Sort direction
    SortOrder,
    /// Entity-specific field
    Field(String),
}

impl FilterKey {
    /// Whether changing this key sends the view back to page 1.
    pub fn resets_page(&self) -> bool {
        !matches!(self, Self::Page | Self::PerPage)
    }
}

impl From<&str> for FilterKey {
    fn from(key: &str) -> Self {
        match key {
            "page" => Self::Page,
            "per_page" | "perPage" => Self::PerPage,
            "search" => Self::Search,
            "sort_by" | "sortBy" => Self::SortBy,
            "sort_order" | "sortOrder" => Self::SortOrder,
            other => Self::Field(other.to_string()),
        }
    }
}

impl From<String> for FilterKey {
    fn from(key: String) -> Self {
        Self::from(key.as_str())
    }
}

// ============================================================================
// State
// ============================================================================

/// Raw state of one list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Search text as typed
    pub search: String,
    /// Current page, starting at 1
    pub page: u32,
    /// Page size
    pub per_page: PerPage,
    /// Sort column as selected
    pub sort_by: String,
    /// Sort direction as selected
    pub sort_order: SortOrder,
    /// Entity-specific fields
    pub fields: BTreeMap<String, FilterValue>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            per_page: PerPage::Twenty,
            sort_by: "id".to_string(),
            sort_order: SortOrder::Desc,
            fields: BTreeMap::new(),
        }
    }
}

impl FilterState {
    /// Entity field value, if set.
    pub fn field(&self, name: &str) -> Option<&FilterValue> {
        self.fields.get(name)
    }

    /// Apply one update. Malformed values are ignored (page values below 1
    /// clamp to 1) and reported as `false`.
    pub fn set(&mut self, key: &FilterKey, value: FilterValue) -> bool {
        match key {
            FilterKey::Page => match value.as_integer() {
                Some(page) => {
                    self.page = u32::try_from(page.max(1)).unwrap_or(u32::MAX);
                    page >= 1
                }
                None => false,
            },
            FilterKey::PerPage => match value.as_integer().map(PerPage::try_from) {
                Some(Ok(per_page)) => {
                    self.per_page = per_page;
                    true
                }
                _ => false,
            },
            FilterKey::Search => match value {
                FilterValue::Text(text) => {
                    self.search = text;
                    true
                }
                FilterValue::Empty => {
                    self.search.clear();
                    true
                }
                _ => false,
            },
            FilterKey::SortBy => match value.as_text() {
                Some(column) if !column.trim().is_empty() => {
                    self.sort_by = column.to_string();
                    true
                }
                _ => false,
            },
            FilterKey::SortOrder => match value.as_text().map(SortOrder::from_str) {
                Some(Ok(order)) => {
                    self.sort_order = order;
                    true
                }
                _ => false,
            },
            FilterKey::Field(name) => {
                if matches!(value, FilterValue::Empty) {
                    self.fields.remove(name);
                } else {
                    self.fields.insert(name.clone(), value);
                }
                true
            }
        }
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input and result types for the incident analytics operations.
//!
//! Raw request inputs ([`FilterParams`], sort/order strings, page numbers)
//! are validated here into typed values ([`FilterSpec`], [`SortSpec`],
//! [`PageRequest`]). Every validation failure is a [`ParameterError`] that
//! names the offending parameter. The result types are what the read
//! operations in `ops_dashboard_analytics` hand back to the HTTP layer.

use std::num::NonZeroU64;

use chrono::NaiveDate;
use ops_dashboard_database_models::IncidentRow;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Date format accepted for the `from` / `to` filters.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Smallest page size a list request may ask for.
pub const MIN_PAGE_SIZE: u32 = 5;

/// Largest page size a list request may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when the request does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A request parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParameterError {
    /// Name of the offending parameter as the client sent it.
    pub parameter: &'static str,
    /// Human-readable explanation, including the allowed set where one
    /// exists.
    pub message: String,
}

impl ParameterError {
    /// Creates a new error for `parameter`.
    #[must_use]
    pub fn new(parameter: &'static str, message: impl Into<String>) -> Self {
        Self {
            parameter,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// The six optional filter dimensions exactly as they arrive from a
/// request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Inclusive start day (`YYYY-MM-DD`).
    pub from: Option<String>,
    /// Inclusive end day (`YYYY-MM-DD`).
    pub to: Option<String>,
    /// Exact sector match.
    pub sector: Option<String>,
    /// Exact direction match.
    pub direction: Option<String>,
    /// Exact event type match.
    pub event_type: Option<String>,
    /// Minimum intensity (must be at least 1).
    pub min_intensity: Option<i64>,
}

/// A validated minimum-intensity bound. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MinIntensity(i32);

impl MinIntensity {
    /// Validates a raw minimum intensity.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if `value` is below 1 or does not fit the
    /// intensity column.
    pub fn new(value: i64) -> Result<Self, ParameterError> {
        if value < 1 {
            return Err(ParameterError::new(
                "min_intensity",
                "min_intensity must be >= 1",
            ));
        }
        i32::try_from(value).map(Self).map_err(|_| {
            ParameterError::new(
                "min_intensity",
                format!("min_intensity must be <= {}", i32::MAX),
            )
        })
    }

    /// Returns the bound as stored in the intensity column.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

/// Validated filter values, at most one per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Inclusive start day.
    pub from: Option<NaiveDate>,
    /// Inclusive end day.
    pub to: Option<NaiveDate>,
    /// Exact sector match.
    pub sector: Option<String>,
    /// Exact direction match.
    pub direction: Option<String>,
    /// Exact event type match.
    pub event_type: Option<String>,
    /// Minimum intensity.
    pub min_intensity: Option<MinIntensity>,
}

impl FilterSpec {
    /// Parses raw filter parameters.
    ///
    /// Absent or empty values mean "no bound" for that dimension.
    /// Categorical values are kept exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if a date is not `YYYY-MM-DD` or the
    /// minimum intensity is below 1.
    pub fn parse(params: &FilterParams) -> Result<Self, ParameterError> {
        Ok(Self {
            from: parse_ymd(params.from.as_deref(), "from")?,
            to: parse_ymd(params.to.as_deref(), "to")?,
            sector: non_empty(params.sector.as_deref()),
            direction: non_empty(params.direction.as_deref()),
            event_type: non_empty(params.event_type.as_deref()),
            min_intensity: params.min_intensity.map(MinIntensity::new).transpose()?,
        })
    }

    /// Returns `true` if no dimension is constrained.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.sector.is_none()
            && self.direction.is_none()
            && self.event_type.is_none()
            && self.min_intensity.is_none()
    }
}

/// Parses an optional `YYYY-MM-DD` string. Absent or empty input is
/// `Ok(None)`; anything else, including surrounding whitespace, must be an
/// exact calendar date.
///
/// # Errors
///
/// Returns [`ParameterError`] naming `parameter` if the string is not a
/// valid calendar date in the expected format.
pub fn parse_ymd(
    value: Option<&str>,
    parameter: &'static str,
) -> Result<Option<NaiveDate>, ParameterError> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ParameterError::new(parameter, format!("Invalid '{parameter}'. Use YYYY-MM-DD")))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(ToString::to_string)
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Columns an incident list may be sorted by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    /// Incident identifier.
    Id,
    /// Occurrence timestamp.
    OccurredAt,
    /// Sector label.
    Sector,
    /// Direction label.
    Direction,
    /// Event type label.
    EventType,
    /// Intensity score.
    Intensity,
}

impl SortField {
    /// Returns every sortable field.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Id,
            Self::OccurredAt,
            Self::Sector,
            Self::Direction,
            Self::EventType,
            Self::Intensity,
        ]
    }

    /// Returns the column this field sorts on.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::OccurredAt => "occurred_at",
            Self::Sector => "sector",
            Self::Direction => "direction",
            Self::EventType => "event_type",
            Self::Intensity => "intensity",
        }
    }
}

/// Sort direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword for this direction.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated `(field, order)` pair for list queries.
///
/// The identifier is always appended as a descending secondary key when
/// rendered, so equal primary values still order deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SortSpec {
    /// Primary sort field.
    pub field: SortField,
    /// Primary sort direction.
    pub order: SortOrder,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::OccurredAt,
            order: SortOrder::Desc,
        }
    }
}

impl SortSpec {
    /// Validates raw sort and order strings. Both are trimmed; the order
    /// is matched case-insensitively, the field exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if the field is not sortable or the
    /// order is not `asc`/`desc`.
    pub fn parse(sort: &str, order: &str) -> Result<Self, ParameterError> {
        let field = sort.trim().parse::<SortField>().map_err(|_| {
            let mut allowed: Vec<&str> = SortField::all().iter().map(|f| f.column()).collect();
            allowed.sort_unstable();
            ParameterError::new("sort", format!("sort must be one of {}", allowed.join(", ")))
        })?;

        let order = order
            .trim()
            .parse::<SortOrder>()
            .map_err(|_| ParameterError::new("order", "order must be asc|desc"))?;

        Ok(Self { field, order })
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// A validated page request.
///
/// Only constructible through [`PageRequest::new`] or [`Default`], so the
/// page is always at least 1:
///
/// ```compile_fail
/// use ops_dashboard_analytics_models::PageRequest;
///
/// let page = PageRequest { page: 0, page_size: 5 };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageRequest {
    page: NonZeroU64,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: NonZeroU64::MIN,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Validates a raw page number and page size.
    ///
    /// No upper bound is placed on `page`; a page past the end of the data
    /// is simply empty.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if `page` is below 1 or `page_size` is
    /// outside the configured range.
    pub fn new(page: i64, page_size: i64) -> Result<Self, ParameterError> {
        let page = u64::try_from(page)
            .ok()
            .and_then(NonZeroU64::new)
            .ok_or_else(|| ParameterError::new("page", "page must be >= 1"))?;

        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|size| (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(size))
            .ok_or_else(|| {
                ParameterError::new(
                    "page_size",
                    format!("page_size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"),
                )
            })?;

        Ok(Self { page, page_size })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(self) -> u64 {
        self.page.get()
    }

    /// Items per page, within [`MIN_PAGE_SIZE`]..=[`MAX_PAGE_SIZE`].
    #[must_use]
    pub const fn page_size(self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip: `(page - 1) * page_size`, or `None` if that
    /// does not fit in a `u64`.
    #[must_use]
    pub fn offset(self) -> Option<u64> {
        (self.page.get() - 1).checked_mul(u64::from(self.page_size))
    }

    /// Number of rows to return.
    #[must_use]
    pub fn limit(self) -> u64 {
        u64::from(self.page_size)
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Time bucket for trend queries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrendGranularity {
    /// Calendar day.
    Day,
    /// ISO week, keyed by its Monday.
    Week,
}

impl TrendGranularity {
    /// Parses the raw `group` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] for anything other than `day` or `week`.
    pub fn parse(value: &str) -> Result<Self, ParameterError> {
        value
            .parse()
            .map_err(|_| ParameterError::new("group", "group must be day|week"))
    }
}

/// Categorical column a distribution is grouped by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistributionDimension {
    /// Group by sector.
    Sector,
    /// Group by direction.
    Direction,
    /// Group by event type.
    EventType,
}

impl DistributionDimension {
    /// Returns the column this dimension groups on.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Sector => "sector",
            Self::Direction => "direction",
            Self::EventType => "event_type",
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Headline numbers for the filtered incident set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    /// Number of matching incidents.
    pub total_incidents: u64,
    /// Sum of intensity over matching incidents (0 when none match).
    pub total_intensity: i64,
    /// Mean intensity rounded to two decimals (0.0 when none match).
    pub avg_intensity: f64,
    /// Direction with the most matching incidents, ties broken by label.
    /// `None` when nothing matches.
    pub top_direction: Option<String>,
}

/// One bucket of a trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Bucket start (the day itself, or the Monday of the week).
    #[serde(rename = "t")]
    pub bucket: NaiveDate,
    /// Matching incidents in the bucket.
    #[serde(rename = "value")]
    pub count: u64,
}

/// One label of a categorical distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    /// Category label.
    pub label: String,
    /// Matching incidents carrying the label.
    #[serde(rename = "value")]
    pub count: u64,
}

/// One sector row of the heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapRow {
    /// Sector label.
    pub sector: String,
    /// Counts aligned with [`Heatmap::columns`].
    pub values: Vec<u64>,
}

/// Dense sector × week incident counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    /// Week starts, ascending.
    pub columns: Vec<NaiveDate>,
    /// Sectors in ascending order, each with one value per column.
    pub rows: Vec<HeatmapRow>,
}

/// One page of incidents together with the total match count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentPage {
    /// Total matching incidents across all pages.
    pub total: u64,
    /// One-based page number.
    pub page: u64,
    /// Requested page size.
    pub page_size: u32,
    /// Incidents on this page.
    pub items: Vec<IncidentRow>,
}

/// Values available for each filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct sectors, ascending.
    pub sectors: Vec<String>,
    /// Distinct directions, ascending.
    pub directions: Vec<String>,
    /// Distinct event types, ascending.
    pub event_types: Vec<String>,
    /// Earliest occurrence day, if any incidents exist.
    pub min_date: Option<NaiveDate>,
    /// Latest occurrence day, if any incidents exist.
    pub max_date: Option<NaiveDate>,
}

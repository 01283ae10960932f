#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database row types for the `incidents` table.
//!
//! The table is owned and populated externally; the dashboard only reads
//! it. These types describe the stored shape and are distinct from the
//! analytics result types in `ops_dashboard_analytics_models`.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

/// Columns selected for a full incident row, in declaration order.
pub const INCIDENT_COLUMNS: &str =
    "id, occurred_at, sector, direction, event_type, intensity, source, summary";

/// Timestamp format used when an incident is serialized for clients.
pub const OCCURRED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single incident as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncidentRow {
    /// Surrogate primary key. Strictly increasing, so usable as a
    /// deterministic tie-break.
    pub id: i64,
    /// When the incident occurred.
    #[serde(serialize_with = "serialize_occurred_at")]
    pub occurred_at: NaiveDateTime,
    /// Operational sector.
    pub sector: String,
    /// Operational direction.
    pub direction: String,
    /// Event type label.
    pub event_type: String,
    /// Intensity score (non-negative).
    pub intensity: i32,
    /// Reporting source, if known.
    pub source: Option<String>,
    /// Free-text summary.
    pub summary: String,
}

fn serialize_occurred_at<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(OCCURRED_AT_FORMAT))
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::cargo_common_metadata,
    clippy::future_not_send
)]

//! Read-only analytics over the `incidents` table.
//!
//! Every operation turns the same optional filters into one shared
//! [`Predicate`](predicate::Predicate), runs one or more parameterized
//! queries through an [`IncidentStore`](store::IncidentStore), and shapes
//! the rows into the typed results from `ops_dashboard_analytics_models`.
//! Nothing here writes to the store.

pub mod pivot;
pub mod predicate;
pub mod queries;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use ops_dashboard_analytics_models::ParameterError;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A request parameter failed validation.
    #[error("Invalid parameter '{}': {}", .0.parameter, .0.message)]
    InvalidParameter(#[from] ParameterError),

    /// No incident exists with the requested identifier.
    #[error("Incident {id} not found")]
    NotFound {
        /// The identifier that was looked up.
        id: i64,
    },

    /// The store could not execute a query.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A row returned by the store did not have the expected shape.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

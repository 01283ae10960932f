//! The query capability the analytics operations run against.

use async_trait::async_trait;
use switchy_database::{Database, DatabaseValue, Row};

use crate::AnalyticsError;

/// Executes a parameterized read query and returns its rows.
///
/// `sql` uses `$1..$n` placeholders matched positionally by `params`.
/// Implementations must not retry; any failure to execute is reported as
/// [`AnalyticsError::StoreUnavailable`].
#[async_trait(?Send)]
pub trait IncidentStore {
    /// Runs `sql` with `params` bound in order.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::StoreUnavailable`] if the query cannot be
    /// executed.
    async fn fetch(&self, sql: &str, params: &[DatabaseValue]) -> Result<Vec<Row>, AnalyticsError>;
}

#[async_trait(?Send)]
impl IncidentStore for dyn Database {
    async fn fetch(&self, sql: &str, params: &[DatabaseValue]) -> Result<Vec<Row>, AnalyticsError> {
        self.query_raw_params(sql, params).await.map_err(|e| {
            log::error!("Incident query failed: {e}");
            AnalyticsError::StoreUnavailable(e.to_string())
        })
    }
}

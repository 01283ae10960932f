//! In-memory [`IncidentStore`] for unit tests.
//!
//! Records every query it receives and replays queued responses in order.
//! When the queue is empty it answers with no rows.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use switchy_database::{DatabaseValue, Row};

use crate::AnalyticsError;
use crate::store::IncidentStore;

#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub sql: String,
    pub params: Vec<DatabaseValue>,
}

#[derive(Debug, Default)]
pub struct RecordingStore {
    responses: RefCell<VecDeque<Result<Vec<Row>, AnalyticsError>>>,
    calls: RefCell<Vec<RecordedQuery>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: Vec<Row>) -> Self {
        self.responses.borrow_mut().push_back(Ok(rows));
        self
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(AnalyticsError::StoreUnavailable(message.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<RecordedQuery> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl IncidentStore for RecordingStore {
    async fn fetch(&self, sql: &str, params: &[DatabaseValue]) -> Result<Vec<Row>, AnalyticsError> {
        self.calls.borrow_mut().push(RecordedQuery {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn row(columns: Vec<(&str, DatabaseValue)>) -> Row {
    Row {
        columns: columns
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    }
}

/// Normalizes whitespace so assertions don't depend on SQL indentation.
pub fn squash(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

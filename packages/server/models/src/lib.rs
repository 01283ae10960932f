#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident dashboard server.
//!
//! Filter parameters are shared with the analytics layer; the types here
//! cover the endpoint-specific query strings and the envelopes the server
//! adds around analytics results.

use serde::{Deserialize, Serialize};

/// `GET /` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiBanner {
    /// Human-readable service description.
    pub message: String,
    /// Server version.
    pub version: String,
}

/// `GET /health` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"ok"` while the process is serving requests.
    pub status: String,
}

impl ApiHealth {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// What went wrong.
    pub error: String,
    /// The offending request parameter, for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// Query parameters for the trend endpoint, alongside the filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendQueryParams {
    /// `day` or `week`; defaults to `day`.
    pub group: Option<String>,
}

/// Query parameters for the incident list endpoint, alongside the filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentListQueryParams {
    /// One-based page number; defaults to 1.
    pub page: Option<i64>,
    /// Items per page; defaults to 20.
    pub page_size: Option<i64>,
    /// Sort field; defaults to `occurred_at`.
    pub sort: Option<String>,
    /// `asc` or `desc`; defaults to `desc`.
    pub order: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_omits_missing_parameter() {
        let body = ApiErrorBody {
            error: "Incident not found".to_string(),
            parameter: None,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"Incident not found"}"#
        );
    }

    #[test]
    fn error_body_names_parameter() {
        let body = ApiErrorBody {
            error: "order must be asc|desc".to_string(),
            parameter: Some("order".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "error": "order must be asc|desc", "parameter": "order" })
        );
    }

    #[test]
    fn health_is_ok() {
        assert_eq!(
            serde_json::to_string(&ApiHealth::ok()).unwrap(),
            r#"{"status":"ok"}"#
        );
    }
}

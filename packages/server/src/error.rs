//! Mapping from analytics failures to HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use ops_dashboard_analytics::AnalyticsError;
use ops_dashboard_analytics_models::ParameterError;
use ops_dashboard_server_models::ApiErrorBody;

/// Errors returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An analytics operation failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// The query string or path could not be decoded at all.
    #[error("{message}")]
    Malformed {
        /// Which part of the request was rejected, if known.
        parameter: Option<&'static str>,
        /// Decoder message.
        message: String,
    },
}

impl From<ParameterError> for ApiError {
    fn from(value: ParameterError) -> Self {
        Self::Analytics(value.into())
    }
}

impl ApiError {
    /// The JSON body sent to the client.
    #[must_use]
    pub fn body(&self) -> ApiErrorBody {
        match self {
            Self::Analytics(AnalyticsError::InvalidParameter(e)) => ApiErrorBody {
                error: e.message.clone(),
                parameter: Some(e.parameter.to_string()),
            },
            Self::Analytics(AnalyticsError::NotFound { .. }) => ApiErrorBody {
                error: "Incident not found".to_string(),
                parameter: None,
            },
            Self::Analytics(AnalyticsError::StoreUnavailable(_)) => ApiErrorBody {
                error: "Incident store unavailable".to_string(),
                parameter: None,
            },
            Self::Analytics(AnalyticsError::Conversion { .. }) => ApiErrorBody {
                error: "Internal server error".to_string(),
                parameter: None,
            },
            Self::Malformed { parameter, message } => ApiErrorBody {
                error: message.clone(),
                parameter: parameter.map(ToString::to_string),
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Analytics(AnalyticsError::InvalidParameter(_)) | Self::Malformed { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Analytics(AnalyticsError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Analytics(AnalyticsError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Analytics(AnalyticsError::Conversion { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Analytics(AnalyticsError::Conversion { .. }) = self {
            log::error!("Failed to read query results: {self}");
        }
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

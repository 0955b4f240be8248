//! Service error taxonomy.
//!
//! Only two conditions are fatal to a request: the upstream completion
//! service failing to answer, and the key-value store refusing a write.
//! Everything else (unparseable model output, corrupt cached records,
//! unknown section names) is recovered locally and never reaches here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Errors that abort the current request.
#[derive(Debug, Error)]
pub enum GazetteError {
    /// The completion API returned a non-success status, a transport
    /// failure occurred, or a success response carried no usable text.
    #[error("upstream completion service failed: {detail}")]
    Upstream { detail: String },

    /// The key-value store could not persist or read a record.
    #[error("key-value store failure: {detail}")]
    Store { detail: String },
}

impl GazetteError {
    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::Upstream {
            detail: detail.into(),
        }
    }

    pub fn store(detail: impl Into<String>) -> Self {
        Self::Store {
            detail: detail.into(),
        }
    }
}

impl From<reqwest::Error> for GazetteError {
    fn from(e: reqwest::Error) -> Self {
        Self::upstream(e.to_string())
    }
}

impl IntoResponse for GazetteError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Details go to the log, not to the client.
        error!(error = %self, status = %status, "request failed");
        (status, "server error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_maps_to_bad_gateway() {
        let response = GazetteError::upstream("boom").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_store_maps_to_internal_error() {
        let response = GazetteError::store("disk full").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_display_carries_detail() {
        let e = GazetteError::upstream("status 503");
        assert!(e.to_string().contains("status 503"));
    }
}

//! API error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cadence_core::{InvalidItemIdentifier, RelayError};
use cadence_search::SearchError;
use serde_json::json;
use tracing::debug;

/// Errors returned by API handlers before any response body is sent.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing client input
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl From<InvalidItemIdentifier> for ApiError {
    fn from(error: InvalidItemIdentifier) -> Self {
        Self::InvalidInput {
            message: format!("Invalid item id: {error}"),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Search(e) if e.is_user_error() => StatusCode::BAD_REQUEST,
            Self::Search(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Relay(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::InvalidInput { message } => {
                debug!("Rejected request: {}", message);
                message.clone()
            }
            Self::Search(SearchError::EmptyQuery) => "Missing search query".to_string(),
            Self::Search(_) => "Search failed".to_string(),
            // Relay failures answer with a bare status.
            Self::Relay(_) => return status.into_response(),
            Self::Internal { .. } => "Internal server error".to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use cadence_core::ItemIdentifier;
    use cadence_core::relay::UpstreamError;
    use cadence_core::resolver::{ExtractionError, ResolutionError};

    use super::*;

    #[test]
    fn test_status_mapping() {
        let item = ItemIdentifier::parse("abc").unwrap();

        let resolution = ApiError::from(RelayError::from(ResolutionError::new(
            item.clone(),
            ExtractionError::NotFound {
                diagnostic: "Video unavailable".to_string(),
            },
        )));
        assert_eq!(resolution.status(), StatusCode::NOT_FOUND);

        let upstream = ApiError::from(RelayError::Upstream {
            item,
            source: UpstreamError::Status { status: 403 },
        });
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            ApiError::from(SearchError::EmptyQuery).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ItemIdentifier::parse("a b").unwrap_err()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_relay_errors_have_empty_body() {
        let item = ItemIdentifier::parse("abc").unwrap();
        let response = ApiError::from(RelayError::Upstream {
            item,
            source: UpstreamError::Timeout {
                timeout: std::time::Duration::from_secs(1),
            },
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_search_failure_has_json_body() {
        let response = ApiError::from(SearchError::ProviderFailed {
            reason: "secret diagnostic".to_string(),
        })
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Search failed");
    }
}

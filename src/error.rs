use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid vote type '{0}', expected 'up' or 'down'")]
    InvalidVoteType(String),
    #[error("Suggestion {0} not found")]
    SuggestionNotFound(i32),
    #[error("Not found")]
    NotFound,
    #[error("Upload exceeds the size limit")]
    PayloadTooLarge,
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidVoteType(_) => StatusCode::BAD_REQUEST,
            ApiError::SuggestionNotFound(_) | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ConversionFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::DatabaseError(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::InvalidRequest(_) => "Invalid request",
            ApiError::InvalidVoteType(_) => "Invalid vote type",
            ApiError::SuggestionNotFound(_) => "Suggestion not found",
            ApiError::NotFound => "Not found",
            ApiError::PayloadTooLarge => "Payload too large",
            ApiError::ConversionFailed(_) => "Conversion failed",
            ApiError::DatabaseError(_) | ApiError::Internal(_) => "Internal server error",
        };

        // storage and internal details stay in the logs
        let details = if status.is_server_error() {
            error!("{self}");
            error_message.to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": error_message,
            "details": details
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        ApiError::Internal(error.to_string())
    }
}

// extractor rejections keep the JSON error shape
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::InvalidVoteType("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::SuggestionNotFound(7).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::ConversionFailed("exit 1".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let response =
            ApiError::DatabaseError("relation \"votes\" does not exist".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert!(!body["details"].as_str().unwrap().contains("votes"));
    }

    #[tokio::test]
    async fn test_client_error_carries_details() {
        let response = ApiError::SuggestionNotFound(42).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Suggestion not found");
        assert_eq!(body["details"], "Suggestion 42 not found");
    }
}

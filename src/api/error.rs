//! Maps [`AdvError`] to HTTP responses.
//!
//! Every failure body is `{"status": "error", "message": ...}`. Unrecoverable
//! errors are logged here and reach the client only as a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use crate::advertisement::AdvError;

pub const STATUS_ERROR: &str = "error";
pub const INTERNAL_ERROR: &str = "internal server error";
pub const ROUTE_NOT_FOUND: &str = "resource not found";
pub const METHOD_NOT_ALLOWED: &str = "method not allowed";

/// Uniform error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[schema(value_type = String, example = "error")]
    pub status: &'static str,
    /// A string, or a validation failure object.
    #[schema(value_type = Object)]
    pub message: Value,
}

impl ErrorEnvelope {
    fn new(message: impl Into<Value>) -> Self {
        Self {
            status: STATUS_ERROR,
            message: message.into(),
        }
    }
}

impl AdvError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unrecoverable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AdvError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let envelope = match self {
            Self::Validation(failure) => match serde_json::to_value(&failure) {
                Ok(message) => ErrorEnvelope::new(message),
                Err(err) => {
                    error!("Failed to serialize validation failure: {err}");
                    ErrorEnvelope::new(failure.msg)
                }
            },
            Self::Conflict(message) => ErrorEnvelope::new(message),
            Self::NotFound(message) => ErrorEnvelope::new(message),
            Self::Unrecoverable(err) => {
                error!("Unrecoverable request failure: {err:#}");
                ErrorEnvelope::new(INTERNAL_ERROR)
            }
        };

        (status, Json(envelope)).into_response()
    }
}

/// Router fallback for paths that match no route.
pub async fn fallback() -> AdvError {
    AdvError::NotFound(ROUTE_NOT_FOUND.to_string())
}

/// Route fallback for a known path used with an unsupported method.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorEnvelope::new(METHOD_NOT_ALLOWED)),
    )
        .into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{advertisement::ALREADY_EXISTS, schema::CREATE_ADVERTISEMENT};
    use axum::body::to_bytes;
    use serde_json::json;

    async fn render(err: AdvError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn conflict_is_bad_request() {
        let (status, body) = render(AdvError::Conflict(ALREADY_EXISTS)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"status": "error", "message": "advertisement already exists"})
        );
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = render(AdvError::not_found(3)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Advertisement 3 is not found");
    }

    #[tokio::test]
    async fn validation_message_is_an_object() {
        let failure = CREATE_ADVERTISEMENT.validate(&json!({})).unwrap_err();
        let (status, body) = render(AdvError::Validation(failure)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"]["type"], "missing");
        assert_eq!(body["message"]["loc"], json!(["title"]));
    }

    #[tokio::test]
    async fn method_not_allowed_uses_the_envelope() {
        let response = method_not_allowed().await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "error", "message": "method not allowed"}));
    }

    #[tokio::test]
    async fn unrecoverable_hides_the_cause() {
        let err = AdvError::Unrecoverable(anyhow::anyhow!("password=hunter2 rejected"));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], INTERNAL_ERROR);
    }
}

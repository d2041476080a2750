//! # Error Handling
//!
//! Service errors are answered with a problem+json body carrying the request's
//! trace ID. Graph API failures on the admin flows are different: the upstream
//! body is forwarded untouched so the admin client can read `error.message`
//! exactly as the Graph API wrote it.

use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;

use crate::graph::GraphFlowError;
use crate::service::ServiceError;
use crate::telemetry;

const PROBLEM_JSON: &str = "application/problem+json";

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationFailed,
    Unauthorized,
    NotFound,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Problem body returned by every non-Graph failure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Per-field hints for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Trace ID of the failed request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status(),
            code,
            message: message.into(),
            details: None,
            trace_id: telemetry::current_trace_id(),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, PROBLEM_JSON)], Json(self)).into_response()
    }
}

/// Storage and other unexpected failures: logged in full, reported opaquely.
impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!(error = ?error, "Internal error");
        Self::new(ErrorCode::InternalServerError, "An internal error occurred")
    }
}

pub fn unauthorized(message: &str) -> ApiError {
    ApiError::new(ErrorCode::Unauthorized, message)
}

pub fn not_found(message: &str) -> ApiError {
    ApiError::new(ErrorCode::NotFound, message)
}

/// 400 with per-field `details`.
pub fn validation_error(message: &str, field_errors: Value) -> ApiError {
    ApiError::new(ErrorCode::ValidationFailed, message).with_details(field_errors)
}

/// Failures of the admin endpoints.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Flow(#[from] GraphFlowError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<anyhow::Error> for AdminError {
    fn from(error: anyhow::Error) -> Self {
        AdminError::Api(error.into())
    }
}

impl From<ServiceError> for AdminError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Flow(flow) => AdminError::Flow(flow),
            ServiceError::Storage(error) => error.into(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        match self {
            AdminError::Flow(GraphFlowError::InvalidDomain) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid domain given" })),
            )
                .into_response(),
            AdminError::Flow(GraphFlowError::Api(body)) => {
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AdminError::Flow(GraphFlowError::MissingAppCredentials) => validation_error(
                "App ID and app secret must be configured first",
                json!({ "app_id": "required", "app_secret": "required" }),
            )
            .into_response(),
            AdminError::Api(error) => error.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{TraceContext, with_trace_context};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn code_decides_status() {
        assert_eq!(not_found("Widget not found").status, StatusCode::NOT_FOUND);
        assert_eq!(unauthorized("no").status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::new(ErrorCode::ServiceUnavailable, "down").status,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn problem_body_shape() {
        let response = validation_error("Invalid widget", json!({"id": "required"})).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], PROBLEM_JSON);
        assert_eq!(
            body_json(response).await,
            json!({
                "code": "VALIDATION_FAILED",
                "message": "Invalid widget",
                "details": {"id": "required"}
            })
        );
    }

    #[tokio::test]
    async fn trace_id_comes_from_the_request_scope() {
        let error = with_trace_context(
            TraceContext {
                trace_id: "req-9".to_string(),
            },
            async { not_found("Unknown tag") },
        )
        .await;

        assert_eq!(error.trace_id.as_deref(), Some("req-9"));
        assert!(not_found("Unknown tag").trace_id.is_none());
    }

    #[test]
    fn storage_failures_are_opaque() {
        let api_error: ApiError = anyhow::anyhow!("database file is locked").into();

        assert_eq!(api_error.code, ErrorCode::InternalServerError);
        assert_eq!(api_error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn graph_error_body_is_forwarded_verbatim() {
        let body = json!({"error": {"message": "Invalid token", "code": 190}});
        let response = AdminError::from(GraphFlowError::Api(body.clone())).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, body);
    }

    #[tokio::test]
    async fn invalid_domain_response_shape() {
        let response = AdminError::from(GraphFlowError::InvalidDomain).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Invalid domain given"}));
    }

    #[tokio::test]
    async fn missing_app_credentials_is_a_validation_failure() {
        let response = AdminError::from(ServiceError::Flow(GraphFlowError::MissingAppCredentials))
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_FAILED");
    }
}

//! # API Handlers
//!
//! HTTP endpoint handlers for the social metadata API.

use crate::db::health_check;
use crate::error::{ApiError, ErrorCode};
use crate::models::{ReadinessStatus, ServiceInfo};
use crate::server::AppState;
use axum::{extract::State, response::Json};

pub mod admin;
pub mod render;
pub mod widgets;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Readiness probe: succeeds once the database answers
#[utoipa::path(
    get,
    path = "/readyz",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessStatus),
        (status = 503, description = "Database unavailable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn readyz(State(state): State<AppState>) -> Result<Json<ReadinessStatus>, ApiError> {
    health_check(&state.db).await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        ApiError::new(ErrorCode::ServiceUnavailable, "Database unavailable")
    })?;
    Ok(Json(ReadinessStatus::ready()))
}

//! # Admin API Handlers
//!
//! Operator-only endpoints that store the app credentials, authorize pages
//! through the token exchange and manage the app's allowed domains.

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::auth::OperatorAuth;
use crate::credentials::PageRecord;
use crate::error::{AdminError, ApiError};
use crate::server::AppState;

/// App id and secret of the Facebook app
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AppDataRequest {
    /// An empty value removes the stored id
    #[serde(default)]
    pub app_id: String,
    /// An empty value removes the stored secret
    #[serde(default)]
    pub app_secret: String,
}

/// Short-lived user token obtained by the client-side login
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenExchangeRequest {
    pub token: String,
    pub user_id: String,
}

/// Pages the operator chose to authorize
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SavePagesRequest {
    #[serde(default)]
    pub data: Vec<PageRecord>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct DomainRequest {
    pub domain: String,
}

/// Store the app credentials
#[utoipa::path(
    post,
    path = "/admin/app",
    security(("bearer_auth" = [])),
    request_body = AppDataRequest,
    responses(
        (status = 200, description = "Credentials stored", body = bool),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn save_app_data(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Json(request): Json<AppDataRequest>,
) -> Result<Json<bool>, AdminError> {
    state
        .service
        .credentials()
        .save_app_credentials(&request.app_id, &request.app_secret)
        .await?;

    info!("App credentials updated");
    Ok(Json(true))
}

/// Exchange a short-lived user token and list the user's manageable pages
#[utoipa::path(
    post,
    path = "/admin/pages/exchange",
    security(("bearer_auth" = [])),
    request_body = TokenExchangeRequest,
    responses(
        (status = 200, description = "Graph API page listing, returned as received", body = Value),
        (status = 400, description = "Graph API error body, or missing app credentials"),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn exchange_token(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Json(request): Json<TokenExchangeRequest>,
) -> Result<Json<Value>, AdminError> {
    debug!("Exchanging user token for page tokens");

    let pages = state
        .service
        .exchange_token(&request.token, &request.user_id)
        .await?;
    Ok(Json(pages))
}

/// Replace the list of authorized pages
#[utoipa::path(
    put,
    path = "/admin/pages",
    security(("bearer_auth" = [])),
    request_body = SavePagesRequest,
    responses(
        (status = 200, description = "Whether pages were stored; false when the list was cleared", body = bool),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn save_pages(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Json(request): Json<SavePagesRequest>,
) -> Result<Json<bool>, AdminError> {
    let stored = state
        .service
        .credentials()
        .save_pages(&request.data)
        .await?;

    info!(count = request.data.len(), stored, "Authorized pages updated");
    Ok(Json(stored))
}

/// List authorized pages with masked tokens
#[utoipa::path(
    get,
    path = "/admin/pages",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authorized pages", body = Vec<PageRecord>),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn list_pages(
    State(state): State<AppState>,
    _operator: OperatorAuth,
) -> Result<Json<Vec<PageRecord>>, AdminError> {
    let pages = state.service.credentials().masked_pages().await?;
    Ok(Json(pages))
}

/// Whether a domain is registered on the app
#[utoipa::path(
    post,
    path = "/admin/domains/check",
    security(("bearer_auth" = [])),
    request_body = DomainRequest,
    responses(
        (status = 200, description = "Whether the domain is listed in the app domains", body = bool),
        (status = 400, description = "Invalid domain or Graph API error body"),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn check_domain(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Json(request): Json<DomainRequest>,
) -> Result<Json<bool>, AdminError> {
    let registered = state.service.check_domain(&request.domain).await?;
    debug!(domain = %request.domain, registered, "Checked app domain");
    Ok(Json(registered))
}

/// Add a domain to the app domains
#[utoipa::path(
    post,
    path = "/admin/domains/register",
    security(("bearer_auth" = [])),
    request_body = DomainRequest,
    responses(
        (status = 200, description = "The Graph API success flag", body = bool),
        (status = 400, description = "Invalid domain or Graph API error body"),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "admin"
)]
pub async fn register_domain(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Json(request): Json<DomainRequest>,
) -> Result<Json<bool>, AdminError> {
    let success = state.service.register_domain(&request.domain).await?;
    Ok(Json(success))
}

//! # Widget API Handlers
//!
//! Operator endpoints for saved widget instances and the public endpoint
//! rendering one of them.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use utoipa::IntoParams;

use crate::auth::{OperatorAuth, ViewerRights};
use crate::content::{ContentKind, Viewer};
use crate::error::{AdminError, ApiError, not_found, validation_error};
use crate::sanitize::sanitize_key;
use crate::server::AppState;
use crate::surfaces::{WidgetChrome, WidgetSettings, render_widget as render_widget_html};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct WidgetPath {
    /// Widget identifier
    pub id: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WidgetQuery {
    /// Content object displaying the widget
    pub context: Option<String>,
}

/// List saved widgets
#[utoipa::path(
    get,
    path = "/admin/widgets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Saved widgets", body = Vec<WidgetSettings>),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn list_widgets(
    State(state): State<AppState>,
    _operator: OperatorAuth,
) -> Result<Json<Vec<WidgetSettings>>, AdminError> {
    let widgets = state.service.widgets().list().await?;
    Ok(Json(widgets))
}

/// Create or replace a widget
#[utoipa::path(
    put,
    path = "/admin/widgets/{id}",
    security(("bearer_auth" = [])),
    params(WidgetPath),
    request_body = WidgetSettings,
    responses(
        (status = 200, description = "Stored widget", body = WidgetSettings),
        (status = 400, description = "Invalid widget settings", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn save_widget(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Path(path): Path<WidgetPath>,
    Json(mut settings): Json<WidgetSettings>,
) -> Result<Json<WidgetSettings>, AdminError> {
    let id = sanitize_key(&path.id);
    if id.is_empty() {
        return Err(validation_error(
            "Widget id must contain letters, digits, '-' or '_'",
            json!({ "id": "invalid" }),
        )
        .into());
    }

    if let Some(kind) = settings.option.filter(|kind| !kind.supported_by_widget()) {
        return Err(validation_error(
            &format!("{} cannot be shown in a widget", kind.label()),
            json!({ "option": kind.as_str() }),
        )
        .into());
    }

    settings.id = id;
    let stored = state.service.widgets().upsert(&settings).await?;
    info!(widget_id = %stored.id, "Widget saved");
    Ok(Json(stored))
}

/// Delete a widget
#[utoipa::path(
    delete,
    path = "/admin/widgets/{id}",
    security(("bearer_auth" = [])),
    params(WidgetPath),
    responses(
        (status = 204, description = "Widget deleted"),
        (status = 404, description = "Widget not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn delete_widget(
    State(state): State<AppState>,
    _operator: OperatorAuth,
    Path(path): Path<WidgetPath>,
) -> Result<StatusCode, AdminError> {
    if state.service.widgets().delete(&path.id).await? {
        info!(widget_id = %path.id, "Widget deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Widget not found").into())
    }
}

/// Render a saved widget
#[utoipa::path(
    get,
    path = "/widgets/{id}",
    params(WidgetPath, WidgetQuery),
    responses(
        (status = 200, description = "Rendered widget", content_type = "text/html", body = String),
        (status = 404, description = "Widget not found", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn render_widget(
    State(state): State<AppState>,
    ViewerRights(rights): ViewerRights,
    Path(path): Path<WidgetPath>,
    Query(query): Query<WidgetQuery>,
) -> Result<Html<String>, ApiError> {
    let settings = state
        .service
        .widgets()
        .find(&path.id)
        .await?
        .ok_or_else(|| not_found("Widget not found"))?;

    debug!(
        widget_id = %settings.id,
        option = settings.option.map(ContentKind::as_str),
        "Rendering widget"
    );

    let viewer = Viewer::new(query.context, Arc::new(rights));
    let html = render_widget_html(
        &state.service,
        &settings,
        &WidgetChrome::default(),
        &viewer,
    )
    .await?;
    Ok(Html(html))
}

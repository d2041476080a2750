//! # Render API Handlers
//!
//! Public endpoints returning HTML fragments for a single tag or for every
//! tag inside a text body.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{Html, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::ViewerRights;
use crate::content::{ContentKind, Viewer};
use crate::error::{ApiError, not_found};
use crate::server::AppState;
use crate::surfaces;

/// Text body whose tags should be expanded
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RenderContentRequest {
    pub content: String,
    /// Identifier of the content object the body belongs to
    #[serde(default)]
    pub context: Option<String>,
}

/// Render one tag
///
/// Query parameters are the tag attributes: `page_id`, `context`, and any
/// render option such as `limit` or `category`.
#[utoipa::path(
    get,
    path = "/render/{tag}",
    params(
        ("tag" = String, Path, description = "Tag name, e.g. social-lastpost"),
        ("page_id" = Option<String>, Query, description = "Authorized page id"),
        ("context" = Option<String>, Query, description = "Content object displaying the fragment")
    ),
    responses(
        (status = 200, description = "Rendered fragment", content_type = "text/html", body = String),
        (status = 404, description = "Unknown tag", body = ApiError)
    ),
    tag = "render"
)]
pub async fn render_tag(
    State(state): State<AppState>,
    ViewerRights(rights): ViewerRights,
    Path(tag): Path<String>,
    Query(mut attributes): Query<BTreeMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    let kind = ContentKind::from_tag(&tag).ok_or_else(|| not_found("Unknown tag"))?;
    let viewer = Viewer::new(attributes.remove("context"), Arc::new(rights));

    let html = surfaces::render_shortcode(&state.service, kind, &attributes, &viewer).await?;
    Ok(Html(html))
}

/// Expand every tag inside a text body
#[utoipa::path(
    post,
    path = "/render/content",
    request_body = RenderContentRequest,
    responses(
        (status = 200, description = "Body with tags replaced by fragments", content_type = "text/html", body = String)
    ),
    tag = "render"
)]
pub async fn render_content(
    State(state): State<AppState>,
    ViewerRights(rights): ViewerRights,
    Json(request): Json<RenderContentRequest>,
) -> Result<Html<String>, ApiError> {
    let viewer = Viewer::new(request.context, Arc::new(rights));
    let html = surfaces::expand(&state.service, &request.content, &viewer).await?;
    Ok(Html(html))
}

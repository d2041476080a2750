//! # Server Configuration
//!
//! Router setup for the social metadata API: public render endpoints, the
//! operator-only admin endpoints and the OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::service::MetadataService;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub service: Arc<MetadataService>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let admin = Router::new()
        .route("/admin/app", post(handlers::admin::save_app_data))
        .route("/admin/pages/exchange", post(handlers::admin::exchange_token))
        .route(
            "/admin/pages",
            put(handlers::admin::save_pages).get(handlers::admin::list_pages),
        )
        .route("/admin/domains/check", post(handlers::admin::check_domain))
        .route("/admin/domains/register", post(handlers::admin::register_domain))
        .route("/admin/widgets", get(handlers::widgets::list_widgets))
        .route(
            "/admin/widgets/{id}",
            put(handlers::widgets::save_widget).delete(handlers::widgets::delete_widget),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/readyz", get(handlers::readyz))
        .route("/render/content", post(handlers::render::render_content))
        .route("/render/{tag}", get(handlers::render::render_tag))
        .route("/widgets/{id}", get(handlers::widgets::render_widget))
        .merge(admin)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_context_middleware))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(db);
    let service = MetadataService::new(&config, Arc::clone(&db))?;
    let state = AppState {
        config: Arc::new(config.clone()),
        db,
        service: Arc::new(service),
    };
    let app = create_app(state);

    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::readyz,
        crate::handlers::admin::save_app_data,
        crate::handlers::admin::exchange_token,
        crate::handlers::admin::save_pages,
        crate::handlers::admin::list_pages,
        crate::handlers::admin::check_domain,
        crate::handlers::admin::register_domain,
        crate::handlers::widgets::list_widgets,
        crate::handlers::widgets::save_widget,
        crate::handlers::widgets::delete_widget,
        crate::handlers::widgets::render_widget,
        crate::handlers::render::render_tag,
        crate::handlers::render::render_content,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::ReadinessStatus,
            crate::error::ApiError,
            crate::error::ErrorCode,
            crate::credentials::PageRecord,
            crate::content::ContentKind,
            crate::content::RenderOptions,
            crate::surfaces::widget::WidgetSettings,
            crate::surfaces::widget::WidgetOptions,
            crate::handlers::admin::AppDataRequest,
            crate::handlers::admin::TokenExchangeRequest,
            crate::handlers::admin::SavePagesRequest,
            crate::handlers::admin::DomainRequest,
            crate::handlers::render::RenderContentRequest,
        )
    ),
    modifiers(&BearerSecurity),
    info(
        title = "Social Metadata API",
        description = "Facebook page metadata rendered as HTML fragments, with the admin flows that authorize pages",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

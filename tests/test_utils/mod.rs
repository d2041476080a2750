//! Test utilities shared by the integration tests.
//!
//! Provides an in-memory SQLite database with migrations applied and a fully
//! wired application whose Graph API base points at a wiremock server.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use social_metadata::{
    cache::MemoryTransientStore,
    clock::ManualClock,
    config::AppConfig,
    credentials::PageRecord,
    graph::GraphClient,
    repositories::{OptionRepository, WidgetRepository},
    server::{AppState, create_app},
    service::{MetadataService, ServiceSettings},
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower::ServiceExt;

pub const OPERATOR_TOKEN: &str = "integration-operator-token";

/// Sunday, 2026-10-18 12:00 UTC.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
}

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<Arc<DatabaseConnection>> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    Migrator::up(&db, None).await?;

    Ok(Arc::new(db))
}

/// Configuration pointing the Graph API at `graph_base`.
pub fn test_config(graph_base: &str) -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        operator_tokens: vec![OPERATOR_TOKEN.to_string()],
        graph_api_base: format!("{}/", graph_base.trim_end_matches('/')),
        ..Default::default()
    }
}

/// Everything a test needs to drive the service and observe time.
pub struct TestApp {
    pub router: Router,
    pub service: Arc<MetadataService>,
    pub clock: Arc<ManualClock>,
}

/// Builds the service and router against the Graph API at `graph_base`.
pub async fn spawn_app(graph_base: &str) -> Result<TestApp> {
    let config = test_config(graph_base);
    let db = setup_test_db().await?;
    let clock = Arc::new(ManualClock::new(test_now()));
    let cache = Arc::new(MemoryTransientStore::new(
        NonZeroUsize::new(config.cache_capacity).unwrap(),
        clock.clone(),
    ));
    let graph = GraphClient::from_base(&config.graph_api_base)?;

    let service = Arc::new(MetadataService::with_parts(
        Arc::new(OptionRepository::new(db.clone())),
        WidgetRepository::new(db.clone()),
        Arc::new(graph),
        cache,
        clock.clone(),
        ServiceSettings::from_config(&config),
    ));

    let router = create_app(AppState {
        config: Arc::new(config),
        db,
        service: service.clone(),
    });

    Ok(TestApp {
        router,
        service,
        clock,
    })
}

/// Stores one authorized page with a known token.
pub async fn authorize_page(service: &MetadataService, id: &str) -> Result<()> {
    service
        .credentials()
        .save_pages(&[PageRecord {
            id: id.to_string(),
            name: "Corner Cafe".to_string(),
            category: "Cafe".to_string(),
            access_token: format!("page-token-{id}"),
        }])
        .await?;
    Ok(())
}

/// Request carrying the operator bearer token, with an optional JSON body.
pub fn operator_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {OPERATOR_TOKEN}"));

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends `request` and returns the status with the body as text.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Sends `request` and parses the body as JSON.
pub async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_str(&body).unwrap_or(Value::Null))
}

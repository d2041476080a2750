//! # Metadata Service
//!
//! One explicitly constructed instance owns the credential store, the content
//! resolver and the widget repository, and is shared by the presentation
//! surfaces and the HTTP handlers.

use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::cache::{MemoryTransientStore, TransientStore};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::content::{ContentKind, ContentResolver, RenderOptions, Viewer};
use crate::credentials::CredentialStore;
use crate::graph::{GraphApi, GraphClient, GraphFlowError, domains, oauth};
use crate::render::{self, RenderContext};
use crate::repositories::{OptionRepository, OptionStore, WidgetRepository};

/// Display settings taken from configuration.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub facebook_base: String,
    pub cache_ttl: Duration,
    pub display_utc_offset_minutes: i32,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            facebook_base: config.facebook_base.clone(),
            cache_ttl: Duration::seconds(config.cache_ttl_seconds as i64),
            display_utc_offset_minutes: config.display_utc_offset_minutes,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct MetadataService {
    credentials: CredentialStore,
    resolver: ContentResolver,
    widgets: WidgetRepository,
    graph: Arc<dyn GraphApi>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
}

impl MetadataService {
    /// Production wiring: SeaORM option store, reqwest Graph client,
    /// in-memory cache on the system clock.
    pub fn new(config: &AppConfig, db: Arc<DatabaseConnection>) -> Result<Self> {
        let graph = GraphClient::from_base(&config.graph_api_base)
            .with_context(|| format!("invalid graph api base '{}'", config.graph_api_base))?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let capacity =
            NonZeroUsize::new(config.cache_capacity).context("cache capacity must be positive")?;
        let cache = Arc::new(MemoryTransientStore::new(capacity, clock.clone()));

        Ok(Self::with_parts(
            Arc::new(OptionRepository::new(db.clone())),
            WidgetRepository::new(db),
            Arc::new(graph),
            cache,
            clock,
            ServiceSettings::from_config(config),
        ))
    }

    /// Wiring from explicit collaborators.
    pub fn with_parts(
        options: Arc<dyn OptionStore>,
        widgets: WidgetRepository,
        graph: Arc<dyn GraphApi>,
        cache: Arc<dyn TransientStore>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        let resolver = ContentResolver::new(graph.clone(), cache, clock.clone(), settings.cache_ttl);
        Self {
            credentials: CredentialStore::new(options),
            resolver,
            widgets,
            graph,
            clock,
            settings,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    pub fn widgets(&self) -> &WidgetRepository {
        &self.widgets
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(
            self.clock.now(),
            self.settings.display_utc_offset_minutes,
            self.settings.facebook_base.clone(),
        )
    }

    /// Resolves and renders `kind` for the authorized page `page_id`.
    pub async fn render_kind(
        &self,
        page_id: &str,
        kind: ContentKind,
        options: &RenderOptions,
        viewer: &Viewer,
    ) -> Result<String> {
        let page = self.credentials.find_page(page_id).await?;
        let content = self
            .resolver
            .resolve(page.as_ref(), kind, options, viewer)
            .await;
        Ok(render::render(kind, content.as_ref(), options, &self.render_context()))
    }

    /// Exchanges a short-lived user token and lists the user's pages.
    pub async fn exchange_token(
        &self,
        short_lived_token: &str,
        user_id: &str,
    ) -> Result<Value, ServiceError> {
        let credentials = self
            .credentials
            .app_credentials()
            .await?
            .ok_or(GraphFlowError::MissingAppCredentials)?;
        let pages = oauth::fetch_manageable_pages(
            self.graph.as_ref(),
            &credentials,
            short_lived_token,
            user_id,
        )
        .await?;
        Ok(pages)
    }

    pub async fn check_domain(&self, domain: &str) -> Result<bool, ServiceError> {
        let credentials = self.credentials.app_credentials().await?;
        Ok(domains::check_domain(self.graph.as_ref(), credentials.as_ref(), domain).await?)
    }

    pub async fn register_domain(&self, domain: &str) -> Result<bool, ServiceError> {
        let credentials = self.credentials.app_credentials().await?;
        Ok(domains::register_domain(self.graph.as_ref(), credentials.as_ref(), domain).await?)
    }
}

/// Failure of an admin flow: a Graph-level outcome or a storage error.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Flow(#[from] GraphFlowError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

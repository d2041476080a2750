//! Widget repository
//!
//! Persists sidebar widget settings, one row per widget instance.

use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use std::sync::Arc;

use crate::content::ContentKind;
use crate::models::widget::{self, Entity as Widget};
use crate::surfaces::widget::{WidgetOptions, WidgetSettings};

/// Repository for widget settings
#[derive(Debug, Clone)]
pub struct WidgetRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl WidgetRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_settings(model: widget::Model) -> Result<WidgetSettings> {
        let option = if model.content_option.is_empty() {
            None
        } else {
            match model.content_option.parse::<ContentKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    log::warn!("Widget '{}' has {}; showing no content", model.id, e);
                    None
                }
            }
        };
        let options: WidgetOptions = serde_json::from_str(&model.options)
            .with_context(|| format!("widget '{}' options are not valid JSON", model.id))?;

        Ok(WidgetSettings {
            id: model.id,
            title: model.title,
            page_id: model.page_id,
            option,
            show_page_name: model.show_page_name,
            options,
        })
    }

    /// All widgets ordered by id
    pub async fn list(&self) -> Result<Vec<WidgetSettings>> {
        Widget::find()
            .order_by_asc(widget::Column::Id)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(Self::to_settings)
            .collect()
    }

    pub async fn find(&self, id: &str) -> Result<Option<WidgetSettings>> {
        Widget::find_by_id(id.to_string())
            .one(&*self.db)
            .await?
            .map(Self::to_settings)
            .transpose()
    }

    /// Creates the widget or replaces its settings.
    pub async fn upsert(&self, settings: &WidgetSettings) -> Result<WidgetSettings> {
        let now = Utc::now().fixed_offset();
        let content_option = settings
            .option
            .map(|kind| kind.as_str().to_string())
            .unwrap_or_default();
        let options = serde_json::to_string(&settings.options)?;

        let model = if let Some(existing) = Widget::find_by_id(settings.id.clone())
            .one(&*self.db)
            .await?
        {
            let mut am: widget::ActiveModel = existing.into();
            am.title = Set(settings.title.clone());
            am.page_id = Set(settings.page_id.clone());
            am.content_option = Set(content_option);
            am.show_page_name = Set(settings.show_page_name);
            am.options = Set(options);
            am.updated_at = Set(now);
            am.update(&*self.db).await?
        } else {
            let am = widget::ActiveModel {
                id: Set(settings.id.clone()),
                title: Set(settings.title.clone()),
                page_id: Set(settings.page_id.clone()),
                content_option: Set(content_option),
                show_page_name: Set(settings.show_page_name),
                options: Set(options),
                created_at: Set(now),
                updated_at: Set(now),
            };
            am.insert(&*self.db).await?
        };

        log::info!("Saved widget '{}'", model.id);
        Self::to_settings(model)
    }

    /// Removes a widget. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Widget::delete_by_id(id.to_string())
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_db;

    fn settings(id: &str) -> WidgetSettings {
        WidgetSettings {
            id: id.to_string(),
            title: "Opening hours".to_string(),
            page_id: "1001".to_string(),
            option: Some(ContentKind::BusinessHours),
            show_page_name: true,
            options: WidgetOptions {
                limit: None,
                empty_message: Some("Closed".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let repo = WidgetRepository::new(test_db().await);

        let created = repo.upsert(&settings("sidebar-1")).await.unwrap();
        assert_eq!(created, settings("sidebar-1"));

        let mut changed = settings("sidebar-1");
        changed.option = Some(ContentKind::LastPost);
        changed.options.limit = Some(3);
        repo.upsert(&changed).await.unwrap();

        let found = repo.find("sidebar-1").await.unwrap().unwrap();
        assert_eq!(found.option, Some(ContentKind::LastPost));
        assert_eq!(found.options.limit, Some(3));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unset_option_round_trips_as_none() {
        let repo = WidgetRepository::new(test_db().await);
        let mut blank = settings("footer");
        blank.option = None;

        repo.upsert(&blank).await.unwrap();
        assert_eq!(repo.find("footer").await.unwrap().unwrap().option, None);
    }

    #[tokio::test]
    async fn list_is_ordered_and_delete_reports_existence() {
        let repo = WidgetRepository::new(test_db().await);
        repo.upsert(&settings("b")).await.unwrap();
        repo.upsert(&settings("a")).await.unwrap();

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|w| w.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        assert!(repo.find("a").await.unwrap().is_none());
    }
}

//! Option repository
//!
//! Key-value persistence standing in for the host platform's option store.
//! Values are arbitrary JSON documents; absent keys read as `None`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use std::sync::Arc;

use crate::models::option::{self, Entity as StoredOption};

/// Generic key-value option store.
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Reads an option, `None` when it was never set or has been deleted.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Creates or replaces an option.
    async fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Removes an option. Returns whether a row existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Reads an option, falling back to `default` when absent.
    async fn get_or(&self, key: &str, default: Value) -> Result<Value> {
        Ok(self.get(key).await?.unwrap_or(default))
    }
}

/// SeaORM-backed [`OptionStore`]
#[derive(Debug, Clone)]
pub struct OptionRepository {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
}

impl OptionRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OptionStore for OptionRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let Some(row) = StoredOption::find_by_id(key.to_string())
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let value = serde_json::from_str(&row.value)
            .with_context(|| format!("option '{}' does not hold valid JSON", key))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        let now = Utc::now().fixed_offset();

        if let Some(existing) = StoredOption::find_by_id(key.to_string())
            .one(&*self.db)
            .await?
        {
            let mut am: option::ActiveModel = existing.into();
            am.value = Set(encoded);
            am.updated_at = Set(now);
            am.update(&*self.db).await?;
        } else {
            let am = option::ActiveModel {
                key: Set(key.to_string()),
                value: Set(encoded),
                updated_at: Set(now),
            };
            StoredOption::insert(am).exec(&*self.db).await?;
        }

        log::debug!("Stored option '{}'", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let result = StoredOption::delete_by_id(key.to_string())
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

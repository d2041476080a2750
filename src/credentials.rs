//! # Credential Store
//!
//! App id, app secret and the authorized pages, kept in the option store
//! under fixed keys. The page list is replaced wholesale on every save.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use utoipa::ToSchema;

use crate::graph::AppCredentials;
use crate::repositories::OptionStore;
use crate::sanitize::{sanitize_key, sanitize_text};

pub const OPTION_APP_ID: &str = "social_plugin_fb_app_id";
pub const OPTION_APP_SECRET: &str = "social_plugin_fb_app_secret";
pub const OPTION_PAGES: &str = "social_plugin_fb_pages";

/// Number of trailing token characters kept visible in masked listings.
const VISIBLE_TOKEN_CHARS: usize = 10;

/// A Facebook page the operator authorized, with its long-lived page token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub access_token: String,
}

impl PageRecord {
    /// Copy with `id` passed through `sanitize_key` and the rest through `sanitize_text`.
    pub fn sanitized(&self) -> Self {
        Self {
            id: sanitize_key(&self.id),
            name: sanitize_text(&self.name),
            category: sanitize_text(&self.category),
            access_token: sanitize_text(&self.access_token),
        }
    }

    /// Copy whose access token only shows its last characters.
    pub fn masked(&self) -> Self {
        let chars: Vec<char> = self.access_token.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(VISIBLE_TOKEN_CHARS)..]
            .iter()
            .collect();
        Self {
            access_token: format!("***{tail}"),
            ..self.clone()
        }
    }
}

/// Typed access to the credential options.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn OptionStore>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty()))
    }

    async fn set_or_delete(&self, key: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            self.store.delete(key).await?;
        } else {
            self.store.set(key, &Value::String(value.to_string())).await?;
        }
        Ok(())
    }

    pub async fn app_id(&self) -> Result<Option<String>> {
        self.get_string(OPTION_APP_ID).await
    }

    /// Both app values, or `None` unless id and secret are set.
    pub async fn app_credentials(&self) -> Result<Option<AppCredentials>> {
        let app_id = self.get_string(OPTION_APP_ID).await?;
        let app_secret = self.get_string(OPTION_APP_SECRET).await?;
        Ok(app_id
            .zip(app_secret)
            .map(|(app_id, app_secret)| AppCredentials { app_id, app_secret }))
    }

    /// Stores the sanitized values; an empty value clears its option.
    pub async fn save_app_credentials(&self, app_id: &str, app_secret: &str) -> Result<()> {
        let app_id = sanitize_key(app_id);
        let app_secret = sanitize_key(app_secret);

        self.set_or_delete(OPTION_APP_ID, &app_id).await?;
        self.set_or_delete(OPTION_APP_SECRET, &app_secret).await?;

        info!(
            app_id_set = !app_id.is_empty(),
            app_secret_set = !app_secret.is_empty(),
            "Saved app credentials"
        );
        Ok(())
    }

    /// Authorized pages in saved order; empty when none were saved.
    pub async fn pages(&self) -> Result<Vec<PageRecord>> {
        match self.store.get(OPTION_PAGES).await? {
            Some(value) => serde_json::from_value(value)
                .context("stored page list has an unexpected shape"),
            None => Ok(Vec::new()),
        }
    }

    /// The authorized page with `id`, if any.
    pub async fn find_page(&self, id: &str) -> Result<Option<PageRecord>> {
        // Last match wins when a list somehow holds duplicates.
        Ok(self.pages().await?.into_iter().rfind(|p| p.id == id))
    }

    /// Replaces the page list. Saving no pages removes the list and returns `false`.
    pub async fn save_pages(&self, pages: &[PageRecord]) -> Result<bool> {
        if pages.is_empty() {
            self.store.delete(OPTION_PAGES).await?;
            info!("Cleared authorized pages");
            return Ok(false);
        }

        let sanitized: Vec<PageRecord> = pages.iter().map(PageRecord::sanitized).collect();
        self.store
            .set(OPTION_PAGES, &serde_json::to_value(&sanitized)?)
            .await?;

        info!(count = sanitized.len(), "Saved authorized pages");
        Ok(true)
    }

    /// Authorized pages with their tokens masked.
    pub async fn masked_pages(&self) -> Result<Vec<PageRecord>> {
        Ok(self.pages().await?.iter().map(PageRecord::masked).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{OptionRepository, test_db};
    use serde_json::json;

    async fn store() -> (CredentialStore, Arc<OptionRepository>) {
        let repo = Arc::new(OptionRepository::new(test_db().await));
        (CredentialStore::new(repo.clone()), repo)
    }

    fn page(id: &str, token: &str) -> PageRecord {
        PageRecord {
            id: id.to_string(),
            name: "Corner Cafe".to_string(),
            category: "Restaurant".to_string(),
            access_token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn app_credentials_require_both_values() {
        let (creds, _) = store().await;
        assert!(creds.app_credentials().await.unwrap().is_none());

        creds.save_app_credentials("12345", "").await.unwrap();
        assert!(creds.app_credentials().await.unwrap().is_none());
        assert_eq!(creds.app_id().await.unwrap().as_deref(), Some("12345"));

        creds.save_app_credentials("12345", "ABCdef").await.unwrap();
        assert_eq!(
            creds.app_credentials().await.unwrap(),
            Some(AppCredentials {
                app_id: "12345".into(),
                app_secret: "abcdef".into()
            })
        );
    }

    #[tokio::test]
    async fn empty_app_values_delete_the_options() {
        let (creds, repo) = store().await;
        creds.save_app_credentials("1", "2").await.unwrap();
        creds.save_app_credentials("", "").await.unwrap();

        assert!(repo.get(OPTION_APP_ID).await.unwrap().is_none());
        assert!(repo.get(OPTION_APP_SECRET).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saving_pages_overwrites_and_sanitizes() {
        let (creds, _) = store().await;
        assert!(creds.save_pages(&[page("111", "a"), page("222", "b")]).await.unwrap());

        let mut dirty = page("333 <x>", "tok");
        dirty.name = "  <b>New</b>   Page ".into();
        assert!(creds.save_pages(&[dirty]).await.unwrap());

        let pages = creds.pages().await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "333x");
        assert_eq!(pages[0].name, "New Page");
        assert!(creds.find_page("111").await.unwrap().is_none());
        assert!(creds.find_page("333x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn saving_zero_pages_deletes_the_list() {
        let (creds, repo) = store().await;
        creds.save_pages(&[page("1", "t")]).await.unwrap();

        assert!(!creds.save_pages(&[]).await.unwrap());
        assert!(repo.get(OPTION_PAGES).await.unwrap().is_none());
        assert!(creds.pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn masked_listing_keeps_last_ten_token_chars() {
        let (creds, _) = store().await;
        creds
            .save_pages(&[page("1", "EAABsecretsecret0123456789"), page("2", "short")])
            .await
            .unwrap();

        let masked = creds.masked_pages().await.unwrap();
        assert_eq!(masked[0].access_token, "***0123456789");
        assert_eq!(masked[1].access_token, "***short");
        assert_eq!(masked[0].name, "Corner Cafe");
    }

    #[tokio::test]
    async fn malformed_page_list_is_an_error() {
        let (creds, repo) = store().await;
        repo.set(OPTION_PAGES, &json!({"not": "a list"})).await.unwrap();

        assert!(creds.pages().await.is_err());
    }
}

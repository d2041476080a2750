//! Sidebar widget.
//!
//! A widget instance shows one kind of content for one authorized page,
//! wrapped in theme-neutral markup with its title.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::content::{ContentKind, RenderOptions, Viewer};
use crate::render::{self, error_message, escape};
use crate::service::MetadataService;

pub const WIDGET_NAME: &str = "Facebook page info Widget";

/// Options the widget form exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct WidgetOptions {
    /// Number of posts, all when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

impl WidgetOptions {
    pub fn to_render_options(&self) -> RenderOptions {
        RenderOptions {
            limit: self.limit.filter(|l| *l > 0),
            empty_message: self.empty_message.clone().filter(|m| !m.is_empty()),
            ..Default::default()
        }
    }
}

/// Saved settings of one widget instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WidgetSettings {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub page_id: String,
    /// Content to show; `None` renders a notice instead
    #[serde(default)]
    pub option: Option<ContentKind>,
    #[serde(default)]
    pub show_page_name: bool,
    #[serde(default)]
    pub options: WidgetOptions,
}

/// Theme markup placed around the widget.
#[derive(Debug, Clone)]
pub struct WidgetChrome {
    pub before_widget: String,
    pub after_widget: String,
    pub before_title: String,
    pub after_title: String,
}

impl Default for WidgetChrome {
    fn default() -> Self {
        Self {
            before_widget: r#"<section class="widget social-plugin-metadata-widget">"#.to_string(),
            after_widget: "</section>".to_string(),
            before_title: r#"<h2 class="widget-title">"#.to_string(),
            after_title: "</h2>".to_string(),
        }
    }
}

/// Renders a widget instance to HTML.
pub async fn render_widget(
    service: &MetadataService,
    settings: &WidgetSettings,
    chrome: &WidgetChrome,
    viewer: &Viewer,
) -> Result<String> {
    let page = service.credentials().find_page(&settings.page_id).await?;
    let options = settings.options.to_render_options();
    let ctx = service.render_context();

    let result = match settings.option {
        Some(kind) => service
            .resolver()
            .resolve(page.as_ref(), kind, &options, viewer)
            .await,
        None => None,
    };

    let body = match result.as_ref().and_then(error_message) {
        Some(message) => format!(
            "<div>{WIDGET_NAME}</div><div><small>{}</small></div>",
            escape(&message)
        ),
        None => {
            let mut body = String::new();
            if let Some(page) = page.as_ref().filter(|_| settings.show_page_name) {
                body.push_str(&format!(
                    r#"<h4 class="social-plugin-metadata-title">{}</h4>"#,
                    escape(&page.name)
                ));
            }
            match settings.option {
                Some(kind) => body.push_str(&render::render(kind, result.as_ref(), &options, &ctx)),
                None => body.push_str(&format!("<div><small>No option given for {WIDGET_NAME}</small></div>")),
            }
            body
        }
    };

    Ok(format!(
        r#"{}{}{}&nbsp;{}<div class="fb-pageinfo-widget">{}</div>{}"#,
        chrome.before_widget,
        chrome.before_title,
        escape(&settings.title),
        chrome.after_title,
        body,
        chrome.after_widget
    ))
}

/// Content kinds offered in the widget form, with their labels.
pub fn supported_options() -> Vec<(ContentKind, &'static str)> {
    ContentKind::ALL
        .into_iter()
        .filter(|kind| kind.supported_by_widget())
        .map(|kind| (kind, kind.label()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::{Value, json};

    use crate::cache::MemoryTransientStore;
    use crate::clock::ManualClock;
    use crate::credentials::PageRecord;
    use crate::graph::{GraphApi, HttpMethod};
    use crate::repositories::{OptionRepository, WidgetRepository, test_db};
    use crate::service::ServiceSettings;

    struct FixedGraph(Value);

    #[async_trait]
    impl GraphApi for FixedGraph {
        async fn request(&self, _path: &str, _query: &[(&str, String)], _m: HttpMethod) -> Value {
            self.0.clone()
        }
    }

    async fn service(reply: Value) -> MetadataService {
        let db = test_db().await;
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
        ));
        let service = MetadataService::with_parts(
            Arc::new(OptionRepository::new(db.clone())),
            WidgetRepository::new(db),
            Arc::new(FixedGraph(reply)),
            Arc::new(MemoryTransientStore::new(NonZeroUsize::new(8).unwrap(), clock.clone())),
            clock,
            ServiceSettings::default(),
        );
        service
            .credentials()
            .save_pages(&[PageRecord {
                id: "1001".to_string(),
                name: "Corner Cafe & Co".to_string(),
                category: "Cafe".to_string(),
                access_token: "token".to_string(),
            }])
            .await
            .unwrap();
        service
    }

    fn settings(option: Option<ContentKind>) -> WidgetSettings {
        WidgetSettings {
            id: "w1".to_string(),
            title: "Opening hours".to_string(),
            page_id: "1001".to_string(),
            option,
            show_page_name: true,
            options: WidgetOptions::default(),
        }
    }

    #[tokio::test]
    async fn wraps_fragment_in_chrome_with_page_name() {
        let service = service(json!({"id": "1001", "about": "We roast our own beans"})).await;

        let html = render_widget(
            &service,
            &settings(Some(ContentKind::About)),
            &WidgetChrome::default(),
            &Viewer::visitor("page-1"),
        )
        .await
        .unwrap();

        assert!(html.starts_with(r#"<section class="widget social-plugin-metadata-widget"><h2 class="widget-title">Opening hours&nbsp;</h2>"#));
        assert!(html.contains(r#"<h4 class="social-plugin-metadata-title">Corner Cafe &amp; Co</h4>"#));
        assert!(html.contains("We roast our own beans"));
        assert!(html.ends_with("</div></section>"));
    }

    #[tokio::test]
    async fn graph_error_replaces_content() {
        let service = service(json!({"error": {"message": "Invalid <token>"}})).await;

        let html = render_widget(
            &service,
            &settings(Some(ContentKind::LastPost)),
            &WidgetChrome::default(),
            &Viewer::visitor("page-1"),
        )
        .await
        .unwrap();

        assert!(html.contains(&format!("<div>{WIDGET_NAME}</div>")));
        assert!(html.contains("Invalid &lt;token&gt;"));
        assert!(!html.contains("social-plugin-metadata-title"));
    }

    #[tokio::test]
    async fn missing_option_shows_notice() {
        let service = service(json!({})).await;

        let html = render_widget(
            &service,
            &settings(None),
            &WidgetChrome::default(),
            &Viewer::visitor("page-1"),
        )
        .await
        .unwrap();

        assert!(html.contains("No option given for Facebook page info Widget"));
    }

    #[test]
    fn events_are_not_offered() {
        let kinds: Vec<ContentKind> = supported_options().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![ContentKind::BusinessHours, ContentKind::About, ContentKind::LastPost]
        );
    }

    #[test]
    fn widget_options_drop_empty_values() {
        let options = WidgetOptions {
            limit: Some(0),
            empty_message: Some(String::new()),
        };
        assert_eq!(options.to_render_options(), RenderOptions::default());
    }
}

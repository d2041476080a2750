//! Page content resolution.
//!
//! Turns (page, kind) into the raw Graph API body, serving it from the
//! transient cache for viewers without edit rights. Error bodies are passed
//! through like data; renderers decide what to show.

use std::sync::Arc;

use chrono::Duration;
use metrics::counter;
use serde_json::Value;
use tracing::debug;

use super::{ContentKind, RenderOptions, Viewer};
use crate::cache::TransientStore;
use crate::clock::Clock;
use crate::credentials::PageRecord;
use crate::graph::{GraphApi, HttpMethod};

const POST_FIELDS: &str = "message,permalink_url,created_time,status_type";
const EVENT_FIELDS: &str = "id,category,name,start_time,end_time";

/// Cache key for one page/kind pair.
pub fn cache_key(page_id: &str, kind: ContentKind) -> String {
    format!("page-content-cache-{page_id}-{kind}")
}

pub struct ContentResolver {
    graph: Arc<dyn GraphApi>,
    cache: Arc<dyn TransientStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ContentResolver {
    pub fn new(
        graph: Arc<dyn GraphApi>,
        cache: Arc<dyn TransientStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            graph,
            cache,
            clock,
            ttl,
        }
    }

    /// Graph path and query for `kind`.
    fn query(
        &self,
        page: &PageRecord,
        kind: ContentKind,
        options: &RenderOptions,
    ) -> (String, Vec<(&'static str, String)>) {
        let mut query = Vec::new();
        let path = match kind {
            ContentKind::BusinessHours => {
                query.push(("fields", "hours".to_string()));
                format!("{}/", page.id)
            }
            ContentKind::About => {
                query.push(("fields", "about".to_string()));
                format!("{}/", page.id)
            }
            ContentKind::LastPost => {
                query.push(("fields", POST_FIELDS.to_string()));
                if let Some(limit) = options.limit {
                    query.push(("limit", limit.to_string()));
                }
                format!("{}/published_posts", page.id)
            }
            ContentKind::Events => {
                query.push(("fields", EVENT_FIELDS.to_string()));
                if options.upcoming {
                    query.push(("since", self.clock.now().timestamp().to_string()));
                }
                if let Some(limit) = options.limit {
                    query.push(("limit", limit.to_string()));
                }
                format!("{}/events", page.id)
            }
        };
        query.push(("access_token", page.access_token.clone()));
        (path, query)
    }

    /// Raw content for `page`, or `None` when the page is not authorized.
    pub async fn resolve(
        &self,
        page: Option<&PageRecord>,
        kind: ContentKind,
        options: &RenderOptions,
        viewer: &Viewer,
    ) -> Option<Value> {
        let page = page?;
        let use_cache = viewer.cache_eligible();
        let key = cache_key(&page.id, kind);

        if use_cache {
            if let Some(hit) = self.cache.get(&key) {
                counter!("content_cache_hits_total", "kind" => kind.as_str()).increment(1);
                debug!(page_id = %page.id, %kind, "Serving cached page content");
                return Some(hit);
            }
            counter!("content_cache_misses_total", "kind" => kind.as_str()).increment(1);
        }

        let (path, query) = self.query(page, kind, options);
        let body = self.graph.request(&path, &query, HttpMethod::Get).await;

        if use_cache {
            self.cache.set(&key, body.clone(), self.ttl);
        }

        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryTransientStore;
    use crate::clock::ManualClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::num::NonZeroUsize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingGraph {
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl CountingGraph {
        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last(&self) -> (String, Vec<(String, String)>) {
            self.calls.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl GraphApi for CountingGraph {
        async fn request(&self, path: &str, query: &[(&str, String)], _m: HttpMethod) -> Value {
            let mut calls = self.calls.lock().unwrap();
            calls.push((
                path.to_string(),
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            json!({"about": format!("call {}", calls.len())})
        }
    }

    struct Fixture {
        graph: Arc<CountingGraph>,
        clock: Arc<ManualClock>,
        resolver: ContentResolver,
    }

    fn fixture() -> Fixture {
        let graph = Arc::new(CountingGraph::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap(),
        ));
        let cache = Arc::new(MemoryTransientStore::new(
            NonZeroUsize::new(16).unwrap(),
            clock.clone(),
        ));
        let resolver = ContentResolver::new(
            graph.clone(),
            cache,
            clock.clone(),
            Duration::seconds(300),
        );
        Fixture {
            graph,
            clock,
            resolver,
        }
    }

    fn page() -> PageRecord {
        PageRecord {
            id: "1001".into(),
            name: "Cafe".into(),
            category: "Food".into(),
            access_token: "page-token".into(),
        }
    }

    fn has(query: &[(String, String)], key: &str, value: &str) -> bool {
        query.iter().any(|(k, v)| k == key && v == value)
    }

    #[tokio::test]
    async fn absent_page_resolves_to_nothing_without_calls() {
        let f = fixture();
        for kind in ContentKind::ALL {
            let result = f
                .resolver
                .resolve(None, kind, &RenderOptions::default(), &Viewer::visitor("p"))
                .await;
            assert!(result.is_none());
        }
        assert_eq!(f.graph.count(), 0);
    }

    #[tokio::test]
    async fn visitor_hits_cache_within_ttl() {
        let f = fixture();
        let viewer = Viewer::visitor("post-7");
        let options = RenderOptions::default();

        let first = f.resolver.resolve(Some(&page()), ContentKind::About, &options, &viewer).await;
        f.clock.advance(Duration::seconds(299));
        let second = f.resolver.resolve(Some(&page()), ContentKind::About, &options, &viewer).await;
        assert_eq!(f.graph.count(), 1);
        assert_eq!(first, second);

        f.clock.advance(Duration::seconds(1));
        f.resolver.resolve(Some(&page()), ContentKind::About, &options, &viewer).await;
        assert_eq!(f.graph.count(), 2);
    }

    #[tokio::test]
    async fn editor_always_fetches_and_never_fills_cache() {
        let f = fixture();
        let options = RenderOptions::default();

        f.resolver
            .resolve(Some(&page()), ContentKind::About, &options, &Viewer::editor("post-7"))
            .await;
        f.resolver
            .resolve(Some(&page()), ContentKind::About, &options, &Viewer::editor("post-7"))
            .await;
        assert_eq!(f.graph.count(), 2);

        f.resolver
            .resolve(Some(&page()), ContentKind::About, &options, &Viewer::visitor("post-7"))
            .await;
        assert_eq!(f.graph.count(), 3);
    }

    #[tokio::test]
    async fn cache_entries_are_per_kind() {
        let f = fixture();
        let viewer = Viewer::visitor("post-7");
        let options = RenderOptions::default();

        f.resolver.resolve(Some(&page()), ContentKind::About, &options, &viewer).await;
        f.resolver.resolve(Some(&page()), ContentKind::BusinessHours, &options, &viewer).await;
        assert_eq!(f.graph.count(), 2);
    }

    #[tokio::test]
    async fn queries_follow_content_kind() {
        let f = fixture();
        let viewer = Viewer::editor("x");

        f.resolver
            .resolve(Some(&page()), ContentKind::BusinessHours, &RenderOptions::default(), &viewer)
            .await;
        let (path, query) = f.graph.last();
        assert_eq!(path, "1001/");
        assert!(has(&query, "fields", "hours"));
        assert!(has(&query, "access_token", "page-token"));

        let options = RenderOptions {
            limit: Some(3),
            ..Default::default()
        };
        f.resolver.resolve(Some(&page()), ContentKind::LastPost, &options, &viewer).await;
        let (path, query) = f.graph.last();
        assert_eq!(path, "1001/published_posts");
        assert!(has(&query, "fields", POST_FIELDS));
        assert!(has(&query, "limit", "3"));

        let options = RenderOptions {
            upcoming: true,
            ..Default::default()
        };
        f.resolver.resolve(Some(&page()), ContentKind::Events, &options, &viewer).await;
        let (path, query) = f.graph.last();
        assert_eq!(path, "1001/events");
        assert!(has(&query, "since", &f.clock.now().timestamp().to_string()));
        assert!(!query.iter().any(|(k, _)| k == "limit"));
    }
}

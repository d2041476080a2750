//! HTTP client for the Graph API.

use async_trait::async_trait;
use metrics::counter;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

/// HTTP verb used for a Graph API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A single-attempt Graph API call.
///
/// Implementations never fail: transport errors and undecodable bodies come
/// back as an empty JSON object, and API error bodies are returned unchanged.
#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn request(&self, path: &str, query: &[(&str, String)], method: HttpMethod) -> Value;
}

/// [`GraphApi`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GraphClient {
    /// A base without a trailing slash gets one, so joined paths extend the
    /// last segment instead of replacing it.
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Parses `base` and builds a client for it.
    pub fn from_base(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(base)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn request(&self, path: &str, query: &[(&str, String)], method: HttpMethod) -> Value {
        counter!("graph_requests_total", "method" => method.as_str()).increment(1);

        let url = match self.build_url(path, query) {
            Ok(url) => url,
            Err(e) => {
                warn!(path, error = %e, "Could not build Graph API URL");
                return empty_object();
            }
        };

        // Only the path is logged; the query carries access tokens.
        debug!(method = method.as_str(), path = url.path(), "Graph API request");

        let request = match method {
            HttpMethod::Get => self.http.get(url),
            HttpMethod::Post => self.http.post(url),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                counter!("graph_transport_failures_total").increment(1);
                warn!(path, error = %e.without_url(), "Graph API transport failure");
                return empty_object();
            }
        };

        let status = response.status();
        match response.json::<Value>().await {
            Ok(body) => {
                if !status.is_success() {
                    debug!(path, %status, "Graph API answered with an error status");
                }
                body
            }
            Err(e) => {
                warn!(path, %status, error = %e.without_url(), "Graph API body is not JSON");
                empty_object()
            }
        }
    }
}

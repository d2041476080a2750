//! Long-lived token exchange.
//!
//! The admin client hands over the short-lived user token obtained from the
//! login popup; it is exchanged for a long-lived user token, which is then
//! used to list the pages the user can manage. Nothing is persisted here: the
//! client picks the pages to keep and saves them separately.

use serde_json::{Value, json};
use tracing::{info, warn};

use super::{AppCredentials, GraphApi, GraphFlowError, HttpMethod, has_error};
use crate::sanitize::{sanitize_key, sanitize_text};

/// Exchanges `short_lived_token` and returns the raw `{user_id}/accounts` body.
pub async fn fetch_manageable_pages(
    graph: &dyn GraphApi,
    credentials: &AppCredentials,
    short_lived_token: &str,
    user_id: &str,
) -> Result<Value, GraphFlowError> {
    let short_lived_token = sanitize_text(short_lived_token);
    let user_id = sanitize_key(user_id);

    let exchange = graph
        .request(
            "oauth/access_token",
            &[
                ("client_id", credentials.app_id.clone()),
                ("client_secret", credentials.app_secret.clone()),
                ("grant_type", "fb_exchange_token".to_string()),
                ("fb_exchange_token", short_lived_token),
            ],
            HttpMethod::Get,
        )
        .await;

    if has_error(&exchange) {
        warn!("Token exchange rejected by the Graph API");
        return Err(GraphFlowError::Api(exchange));
    }

    let Some(long_lived_token) = exchange
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
    else {
        warn!("Token exchange response carried no access token");
        return Err(GraphFlowError::Api(json!({
            "error": { "message": "No access token returned by the token exchange" }
        })));
    };

    let accounts = graph
        .request(
            &format!("{user_id}/accounts"),
            &[("access_token", long_lived_token.to_string())],
            HttpMethod::Get,
        )
        .await;

    if has_error(&accounts) {
        warn!(user_id = %user_id, "Listing manageable pages failed");
        return Err(GraphFlowError::Api(accounts));
    }

    let count = accounts
        .get("data")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    info!(user_id = %user_id, pages = count, "Listed manageable pages");
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned bodies in order and records each call.
    struct ScriptedGraph {
        replies: Mutex<Vec<Value>>,
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl ScriptedGraph {
        fn new(mut replies: Vec<Value>) -> Self {
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GraphApi for ScriptedGraph {
        async fn request(&self, path: &str, query: &[(&str, String)], _m: HttpMethod) -> Value {
            self.calls.lock().unwrap().push((
                path.to_string(),
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
            self.replies.lock().unwrap().pop().unwrap_or_else(|| json!({}))
        }
    }

    fn creds() -> AppCredentials {
        AppCredentials {
            app_id: "4242".into(),
            app_secret: "s3cret".into(),
        }
    }

    #[tokio::test]
    async fn exchanges_then_lists_accounts() {
        let graph = ScriptedGraph::new(vec![
            json!({"access_token": "long-lived", "token_type": "bearer"}),
            json!({"data": [{"id": "1", "name": "Cafe", "category": "Food", "access_token": "p"}]}),
        ]);

        let body = fetch_manageable_pages(&graph, &creds(), " short ", "User42")
            .await
            .unwrap();

        assert_eq!(body["data"][0]["name"], "Cafe");
        let calls = graph.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "oauth/access_token");
        assert!(calls[0].1.contains(&("fb_exchange_token".into(), "short".into())));
        assert!(calls[0].1.contains(&("client_id".into(), "4242".into())));
        assert_eq!(calls[1].0, "user42/accounts");
        assert_eq!(
            calls[1].1,
            vec![("access_token".to_string(), "long-lived".to_string())]
        );
    }

    #[tokio::test]
    async fn exchange_error_is_forwarded_without_second_call() {
        let error = json!({"error": {"message": "Invalid OAuth access token", "code": 190}});
        let graph = ScriptedGraph::new(vec![error.clone()]);

        let result = fetch_manageable_pages(&graph, &creds(), "bad", "1").await;

        assert!(matches!(result, Err(GraphFlowError::Api(ref body)) if *body == error));
        assert_eq!(graph.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accounts_error_is_forwarded() {
        let error = json!({"error": {"message": "Unsupported get request"}});
        let graph = ScriptedGraph::new(vec![json!({"access_token": "t"}), error.clone()]);

        let result = fetch_manageable_pages(&graph, &creds(), "short", "1").await;

        assert!(matches!(result, Err(GraphFlowError::Api(ref body)) if *body == error));
    }

    #[tokio::test]
    async fn transport_failure_on_exchange_becomes_api_error() {
        let graph = ScriptedGraph::new(vec![json!({})]);

        let result = fetch_manageable_pages(&graph, &creds(), "short", "1").await;

        match result {
            Err(GraphFlowError::Api(body)) => assert!(body["error"]["message"].is_string()),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

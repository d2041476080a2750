//! Graph API client against a mock server.

use serde_json::json;
use social_metadata::graph::{GraphApi, GraphClient, HttpMethod};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GraphClient {
    GraphClient::from_base(&format!("{}/", server.uri())).unwrap()
}

#[tokio::test]
async fn get_sends_query_and_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1001/published_posts"))
        .and(query_param("fields", "message,permalink_url"))
        .and(query_param("access_token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server)
        .request(
            "1001/published_posts",
            &[
                ("fields", "message,permalink_url".to_string()),
                ("access_token", "tok".to_string()),
            ],
            HttpMethod::Get,
        )
        .await;

    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn error_status_body_is_returned_unchanged() {
    let server = MockServer::start().await;
    let error = json!({"error": {"message": "Unsupported get request.", "code": 100}});
    Mock::given(method("GET"))
        .and(path("/missing/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(error.clone()))
        .mount(&server)
        .await;

    let body = client_for(&server)
        .request("missing/", &[], HttpMethod::Get)
        .await;

    assert_eq!(body, error);
}

#[tokio::test]
async fn post_uses_post_method() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/555"))
        .and(query_param("app_domains", r#"["example.com"]"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server)
        .request(
            "555",
            &[("app_domains", r#"["example.com"]"#.to_string())],
            HttpMethod::Post,
        )
        .await;

    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn non_json_body_becomes_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1001/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let body = client_for(&server)
        .request("1001/", &[], HttpMethod::Get)
        .await;

    assert_eq!(body, json!({}));
}

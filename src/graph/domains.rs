//! App domain administration.
//!
//! The login popup only works on domains registered with the Facebook app.
//! Both operations reject a syntactically invalid domain before touching the
//! network.

use serde_json::Value;
use tracing::info;

use super::{AppCredentials, GraphApi, GraphFlowError, HttpMethod, has_error};
use crate::sanitize::sanitize_text;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Hostname syntax check: dot-separated labels of ASCII alphanumerics and
/// hyphens, no label starting or ending with a hyphen.
pub fn is_valid_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Sanitizes and validates `domain`, returning the value to use.
fn checked_domain(domain: &str) -> Result<String, GraphFlowError> {
    let domain = sanitize_text(domain);
    if is_valid_domain(&domain) {
        Ok(domain)
    } else {
        Err(GraphFlowError::InvalidDomain)
    }
}

async fn registered_domains(
    graph: &dyn GraphApi,
    credentials: &AppCredentials,
) -> Result<Vec<Value>, GraphFlowError> {
    let body = graph
        .request(
            &credentials.app_id,
            &[
                ("fields", "app_domains".to_string()),
                ("access_token", credentials.app_access_token()),
            ],
            HttpMethod::Get,
        )
        .await;

    if has_error(&body) {
        return Err(GraphFlowError::Api(body));
    }

    Ok(body
        .get("app_domains")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default())
}

/// Whether `domain` is already among the app's registered domains.
pub async fn check_domain(
    graph: &dyn GraphApi,
    credentials: Option<&AppCredentials>,
    domain: &str,
) -> Result<bool, GraphFlowError> {
    let domain = checked_domain(domain)?;
    let credentials = credentials.ok_or(GraphFlowError::MissingAppCredentials)?;

    let domains = registered_domains(graph, credentials).await?;
    Ok(domains.iter().any(|d| d.as_str() == Some(domain.as_str())))
}

/// Appends `domain` to the app's registered domains.
///
/// Returns the `success` flag of the update call.
pub async fn register_domain(
    graph: &dyn GraphApi,
    credentials: Option<&AppCredentials>,
    domain: &str,
) -> Result<bool, GraphFlowError> {
    let domain = checked_domain(domain)?;
    let credentials = credentials.ok_or(GraphFlowError::MissingAppCredentials)?;

    let mut domains = registered_domains(graph, credentials).await?;
    domains.push(Value::String(domain.clone()));

    let body = graph
        .request(
            &credentials.app_id,
            &[
                ("app_domains", Value::Array(domains).to_string()),
                ("access_token", credentials.app_access_token()),
            ],
            HttpMethod::Post,
        )
        .await;

    if has_error(&body) {
        return Err(GraphFlowError::Api(body));
    }

    let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
    info!(domain = %domain, success, "Registered app domain");
    Ok(success)
}

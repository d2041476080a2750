//! # Graph API
//!
//! Thin access layer over the Facebook Graph API: a JSON-or-empty HTTP client
//! plus the two admin flows built on it (token exchange and app domain
//! management).

pub mod client;
pub mod domains;
pub mod oauth;

use serde_json::Value;
use thiserror::Error;

pub use client::{GraphApi, GraphClient, HttpMethod};

/// Failures surfaced by the admin flows.
///
/// `Api` carries the Graph API body untouched; callers forward it as-is.
#[derive(Debug, Error)]
pub enum GraphFlowError {
    #[error("Invalid domain given")]
    InvalidDomain,
    #[error("app id and app secret are not configured")]
    MissingAppCredentials,
    #[error("graph api returned an error: {0}")]
    Api(Value),
}

/// The registered Facebook app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub app_id: String,
    pub app_secret: String,
}

impl AppCredentials {
    /// App access token in the `{app_id}|{app_secret}` form the Graph API accepts.
    pub fn app_access_token(&self) -> String {
        format!("{}|{}", self.app_id, self.app_secret)
    }
}

/// Returns true when a Graph API body carries a non-empty `error` member.
pub fn has_error(body: &Value) -> bool {
    match body.get("error") {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(_)) => true,
    }
}

//! # Operator Authentication
//!
//! Admin endpoints require an operator bearer token from configuration. The
//! public render endpoints read the same header optionally: a valid token
//! there marks the viewer as an editor, who bypasses the content cache.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::AppConfig;
use crate::content::EditRights;
use crate::error::{ApiError, unauthorized};
use crate::server::AppState;

/// Request extension proving the operator check passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAuth;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// What the `Authorization` header holds.
#[derive(Debug, PartialEq, Eq)]
enum Credential<'a> {
    Absent,
    Unreadable,
    OtherScheme,
    Bearer(&'a str),
}

fn read_credential(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Credential::Absent;
    };
    let Ok(value) = value.to_str() else {
        return Credential::Unreadable;
    };
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Credential::Bearer(token.trim())
        }
        _ => Credential::OtherScheme,
    }
}

fn is_operator_token(config: &AppConfig, token: &str) -> bool {
    !token.is_empty()
        && config
            .operator_tokens
            .iter()
            .any(|known| bool::from(known.as_bytes().ct_eq(token.as_bytes())))
}

fn check_operator(config: &AppConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    match read_credential(headers) {
        Credential::Absent => Err(unauthorized("Missing Authorization header")),
        Credential::Unreadable => Err(unauthorized("Invalid Authorization header")),
        Credential::OtherScheme => Err(unauthorized("Authorization header must use Bearer scheme")),
        Credential::Bearer(token) if is_operator_token(config, token) => Ok(()),
        Credential::Bearer(_) => Err(unauthorized("Invalid bearer token")),
    }
}

/// Route layer guarding the admin routes.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_operator(&config, request.headers())?;

    tracing::info!(
        method = %request.method(),
        path = %request.uri().path(),
        "Operator request authenticated"
    );
    request.extensions_mut().insert(OperatorAuth);

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for OperatorAuth
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OperatorAuth>()
            .copied()
            .ok_or_else(|| unauthorized("Operator authentication required"))
    }
}

/// Edit rights of the caller of a public endpoint. Never rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerRights(pub EditRights);

impl<S> FromRequestParts<S> for ViewerRights
where
    Arc<AppConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);
        let rights = match check_operator(&config, &parts.headers) {
            Ok(()) => EditRights::Granted,
            Err(_) => EditRights::Denied,
        };
        Ok(ViewerRights(rights))
    }
}

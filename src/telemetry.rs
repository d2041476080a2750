//! # Telemetry
//!
//! Installs the global subscriber (JSON or pretty, with `log` records bridged
//! in) and carries the per-request trace ID that error bodies report.

use std::any::type_name_of_val;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use log::LevelFilter;
use thiserror::Error;
use tokio::task_local;
use tracing::Instrument;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Header used to accept and echo request correlation IDs.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

const MAX_TRACE_ID_LEN: usize = 128;

/// Directives appended to the configured level unless `RUST_LOG` is set.
/// SQL statement logging and connection chatter drown out request logs.
const QUIET_DEPENDENCIES: &str = "sqlx=warn,sea_orm=info,hyper_util=info,reqwest=info";

#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("another logger is installed: {0}")]
    LogBridge(#[from] log::SetLoggerError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

/// Log output layout, from `log_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `pretty` logs JSON.
    pub fn from_config(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("pretty") {
            LogFormat::Pretty
        } else {
            LogFormat::Json
        }
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},{QUIET_DEPENDENCIES}")))
}

/// Routes `log::` records into tracing. A bridge installed earlier (test
/// harnesses do this) is accepted; any other logger is an error.
fn bridge_log_records() -> Result<(), TelemetryInitError> {
    match LogTracer::init_with_filter(LevelFilter::Trace) {
        Ok(()) => Ok(()),
        Err(_) if type_name_of_val(log::logger()).contains("LogTracer") => Ok(()),
        Err(err) => Err(err.into()),
    }
}

static SUBSCRIBER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if SUBSCRIBER_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    bridge_log_records()?;

    let output = match LogFormat::from_config(&config.log_format) {
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(default_filter(&config.log_level))
        .with(output)
        .try_init()
        .inspect_err(|_| SUBSCRIBER_INSTALLED.store(false, Ordering::SeqCst))?;

    Ok(())
}

/// Trace ID of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static REQUEST_TRACE: TraceContext;
}

/// Runs `future` with `context` as the current trace.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    REQUEST_TRACE.scope(context, future).await
}

/// Trace ID of the request being served on this task.
pub fn current_trace_id() -> Option<String> {
    REQUEST_TRACE.try_with(|ctx| ctx.trace_id.clone()).ok()
}

fn accepted_trace_id(value: &HeaderValue) -> Option<String> {
    value
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_TRACE_ID_LEN)
        .filter(|id| id.chars().all(|c| c.is_ascii_graphic()))
        .map(str::to_string)
}

/// Reuses a well-formed incoming `x-trace-id` or mints a UUID, scopes it for
/// the request and echoes it on the response.
pub async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(accepted_trace_id)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let context = TraceContext {
        trace_id: trace_id.clone(),
    };
    request.extensions_mut().insert(context.clone());

    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = with_trace_context(context, next.run(request))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}

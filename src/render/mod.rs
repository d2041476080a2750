//! # Renderers
//!
//! Pure HTML formatters, one per [`ContentKind`]. [`render`] applies the checks
//! every kind shares (missing content, Graph API error) before handing the
//! body to the kind's [`Renderer`].

pub mod about;
pub mod business_hours;
pub mod date_format;
pub mod events;
pub mod last_post;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::Value;

use crate::content::{ContentKind, RenderOptions};
use crate::graph::has_error;

pub const NOT_FOUND_TEXT: &str = "Facebook page not found or no access";
pub const NO_ENTRIES_TEXT: &str = "Currently there are no entries available on Facebook";
pub const NO_POSTS_TEXT: &str = "Currently there are no posts available on Facebook";
pub const NO_EVENTS_TEXT: &str = "Currently there are no events posted on Facebook";

/// Request-independent inputs the renderers need besides the content.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Current time in the display timezone
    pub now: DateTime<FixedOffset>,
    /// Public site base, with trailing slash, used for event links
    pub facebook_base: String,
}

impl RenderContext {
    /// Context for `now` shifted into the display offset; an out-of-range
    /// offset falls back to UTC.
    pub fn new(now: DateTime<Utc>, utc_offset_minutes: i32, facebook_base: impl Into<String>) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        Self {
            now: now.with_timezone(&offset),
            facebook_base: facebook_base.into(),
        }
    }
}

/// Kind-specific formatting of a non-empty, error-free Graph body.
pub trait Renderer: Send + Sync {
    fn render(&self, content: &Value, options: &RenderOptions, ctx: &RenderContext) -> String;
}

static BUSINESS_HOURS: business_hours::BusinessHoursRenderer = business_hours::BusinessHoursRenderer;
static ABOUT: about::AboutRenderer = about::AboutRenderer;
static LAST_POST: last_post::LastPostRenderer = last_post::LastPostRenderer;
static EVENTS: events::EventsRenderer = events::EventsRenderer;

/// The renderer registered for `kind`.
pub fn renderer(kind: ContentKind) -> &'static dyn Renderer {
    match kind {
        ContentKind::BusinessHours => &BUSINESS_HOURS,
        ContentKind::About => &ABOUT,
        ContentKind::LastPost => &LAST_POST,
        ContentKind::Events => &EVENTS,
    }
}

/// Renders resolved content for `kind`.
///
/// Absent or empty content yields the not-found fragment; a body carrying an
/// `error` yields the error-state fragment.
pub fn render(
    kind: ContentKind,
    content: Option<&Value>,
    options: &RenderOptions,
    ctx: &RenderContext,
) -> String {
    let Some(content) = content.filter(|c| !is_empty(c)) else {
        return not_found();
    };
    if has_error(content) {
        return error_state(&error_message(content).unwrap_or_else(|| "Unknown error".to_string()));
    }
    renderer(kind).render(content, options, ctx)
}

/// Null, `false`, empty strings and empty containers count as no content.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}

/// The human-readable message of a Graph error body.
pub fn error_message(content: &Value) -> Option<String> {
    let error = content.get("error")?;
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
}

pub(crate) fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

pub(crate) fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

pub fn not_found() -> String {
    format!(
        r#"<div class="social-plugin-metadata-empty" style="text-align: center; font-size: smaller"><strong>[social-plugin-metadata]</strong><br />{NOT_FOUND_TEXT}</div>"#
    )
}

/// Empty-state fragment with the custom message, escaped, or `default_text`.
pub fn empty_state(options: &RenderOptions, default_text: &str) -> String {
    let text = match options.empty_message.as_deref().filter(|m| !m.is_empty()) {
        Some(custom) => escape(custom),
        None => default_text.to_string(),
    };
    format!(r#"<div class="social-plugin-metadata-empty" style="text-align: center">{text}</div>"#)
}

pub fn error_state(message: &str) -> String {
    format!(
        r#"<div class="social-plugin-metadata-empty social-plugin-metadata-error" style="text-align: center"><strong>[social-plugin-metadata]</strong><br />{}</div>"#,
        escape(message)
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::RenderContext;
    use chrono::{TimeZone, Utc};

    /// Sunday 2026-10-18 12:00 UTC.
    pub fn ctx() -> RenderContext {
        RenderContext::new(
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
            0,
            "https://facebook.com/",
        )
    }
}

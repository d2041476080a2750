//! # Page Content
//!
//! The closed set of content kinds a page can be asked for, the per-request
//! render options, and the viewer capability that decides whether cached
//! results may be served.

pub mod resolver;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use resolver::ContentResolver;

/// What to display from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ContentKind {
    BusinessHours,
    About,
    LastPost,
    Events,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::BusinessHours,
        ContentKind::About,
        ContentKind::LastPost,
        ContentKind::Events,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::BusinessHours => "BusinessHours",
            ContentKind::About => "About",
            ContentKind::LastPost => "LastPost",
            ContentKind::Events => "Events",
        }
    }

    /// Inline tag name, e.g. `social-lastpost`.
    pub fn tag(self) -> &'static str {
        match self {
            ContentKind::BusinessHours => "social-businesshours",
            ContentKind::About => "social-about",
            ContentKind::LastPost => "social-lastpost",
            ContentKind::Events => "social-events",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Human label shown in widget settings.
    pub fn label(self) -> &'static str {
        match self {
            ContentKind::BusinessHours => "Business hours",
            ContentKind::About => "About us",
            ContentKind::LastPost => "Last Posts",
            ContentKind::Events => "Events",
        }
    }

    pub fn supported_by_widget(self) -> bool {
        !matches!(self, ContentKind::Events)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown content kind '{0}'")]
pub struct UnknownContentKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownContentKind(s.to_string()))
    }
}

/// Per-request display options.
///
/// Every field is optional; renderers only act on what is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RenderOptions {
    /// Maximum number of posts or events requested from the Graph API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Only show posts younger than this many minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    /// Truncate post messages to this many words
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_words: Option<usize>,
    /// Event category, matched case-insensitively
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Case-insensitive substring of the event name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format_end: Option<String>,
    /// Only request events starting from now
    pub upcoming: bool,
    /// Link event titles to their Facebook page
    pub link: bool,
    /// Replaces the default empty-state text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<String>,
}

fn positive<T: FromStr + Default + PartialOrd>(value: &str) -> Option<T> {
    value.trim().parse::<T>().ok().filter(|n| *n > T::default())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn truthy(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

impl RenderOptions {
    /// Builds options from loosely typed tag or query attributes.
    ///
    /// Unknown keys are ignored, as are numbers that do not parse or are not
    /// positive.
    pub fn from_attributes(attributes: &BTreeMap<String, String>) -> Self {
        let mut options = Self::default();
        for (key, value) in attributes {
            match key.as_str() {
                "limit" => options.limit = positive(value),
                "max_age" => options.max_age = positive(value),
                "max_words" => options.max_words = positive(value),
                "category" => options.category = non_empty(value),
                "filter" => options.filter = non_empty(value),
                "date_format" => options.date_format = non_empty(value),
                "date_format_start" => options.date_format_start = non_empty(value),
                "date_format_end" => options.date_format_end = non_empty(value),
                "upcoming" => options.upcoming = truthy(value),
                "link" => options.link = truthy(value),
                "empty_message" => options.empty_message = non_empty(value),
                _ => {}
            }
        }
        options
    }
}

/// Host capability: may the current viewer edit the given content context?
pub trait EditPermission: Send + Sync {
    fn can_edit(&self, context: &str) -> bool;
}

/// Blanket edit rights, decided once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditRights {
    Granted,
    Denied,
}

impl EditPermission for EditRights {
    fn can_edit(&self, _context: &str) -> bool {
        matches!(self, EditRights::Granted)
    }
}

/// Who is looking at rendered content, and in which context.
#[derive(Clone)]
pub struct Viewer {
    /// Identifier of the content object being displayed, when there is one
    pub context: Option<String>,
    pub permission: Arc<dyn EditPermission>,
}

impl Viewer {
    pub fn new(context: Option<String>, permission: Arc<dyn EditPermission>) -> Self {
        Self {
            context: context.filter(|c| !c.is_empty()),
            permission,
        }
    }

    /// Anonymous viewer of `context`.
    pub fn visitor(context: impl Into<String>) -> Self {
        Self::new(Some(context.into()), Arc::new(EditRights::Denied))
    }

    /// Viewer that can edit everything.
    pub fn editor(context: impl Into<String>) -> Self {
        Self::new(Some(context.into()), Arc::new(EditRights::Granted))
    }

    /// Cached results are only read and written for a viewer inside a
    /// content context they cannot edit.
    pub fn cache_eligible(&self) -> bool {
        self.context
            .as_deref()
            .is_some_and(|context| !self.permission.can_edit(context))
    }
}

impl fmt::Debug for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewer")
            .field("context", &self.context)
            .field("cache_eligible", &self.cache_eligible())
            .finish()
    }
}

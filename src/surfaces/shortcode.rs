//! Inline placeholder tags.
//!
//! `[social-lastpost page_id="1001" limit=3]` inside a text body is replaced
//! by the rendered fragment. `page_id` picks the authorized page; every other
//! attribute becomes a render option.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;

use crate::content::{ContentKind, RenderOptions, Viewer};
use crate::service::MetadataService;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(
            r"\[(social-businesshours|social-about|social-lastpost|social-events)(\s[^\]]*?)?\s*/?\]",
        )
        .expect("static regex")
    })
}

fn attribute_pattern() -> &'static Regex {
    static ATTR: OnceLock<Regex> = OnceLock::new();
    ATTR.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'\]]+))"#)
            .expect("static regex")
    })
}

/// Parses `key="value"`, `key='value'` and `key=value` pairs. Keys are
/// lowercased; a repeated key keeps its last value.
pub fn parse_attributes(raw: &str) -> BTreeMap<String, String> {
    attribute_pattern()
        .captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (caps[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

/// A tag found in a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcode {
    pub kind: ContentKind,
    pub attributes: BTreeMap<String, String>,
}

/// Every tag in `content` with its byte range, in order of appearance.
fn locate(content: &str) -> Vec<(Range<usize>, Shortcode)> {
    tag_pattern()
        .captures_iter(content)
        .filter_map(|caps| {
            let range = caps.get(0)?.range();
            let shortcode = Shortcode {
                kind: ContentKind::from_tag(&caps[1])?,
                attributes: parse_attributes(caps.get(2).map_or("", |m| m.as_str())),
            };
            Some((range, shortcode))
        })
        .collect()
}

/// Every tag in `content`, in order of appearance.
pub fn find_shortcodes(content: &str) -> Vec<Shortcode> {
    locate(content).into_iter().map(|(_, tag)| tag).collect()
}

/// Renders one tag.
pub async fn render_shortcode(
    service: &MetadataService,
    kind: ContentKind,
    attributes: &BTreeMap<String, String>,
    viewer: &Viewer,
) -> Result<String> {
    let mut attributes = attributes.clone();
    let page_id = attributes.remove("page_id").unwrap_or_default();
    let options = RenderOptions::from_attributes(&attributes);

    service.render_kind(&page_id, kind, &options, viewer).await
}

/// Replaces every tag in `content` with its rendered fragment.
///
/// Tags are rendered one after another, in order.
pub async fn expand(service: &MetadataService, content: &str, viewer: &Viewer) -> Result<String> {
    let mut output = String::with_capacity(content.len());
    let mut last = 0;

    for (range, tag) in locate(content) {
        output.push_str(&content[last..range.start]);
        output.push_str(&render_shortcode(service, tag.kind, &tag.attributes, viewer).await?);
        last = range.end;
    }

    output.push_str(&content[last..]);
    Ok(output)
}

use serde_json::Value;

use super::{NO_ENTRIES_TEXT, RenderContext, Renderer, empty_state};
use crate::content::RenderOptions;

/// The page's about text, emitted as-is: the page owner controls it.
pub struct AboutRenderer;

impl Renderer for AboutRenderer {
    fn render(&self, content: &Value, options: &RenderOptions, _ctx: &RenderContext) -> String {
        match content.get("about").and_then(Value::as_str) {
            Some(about) if !about.is_empty() => {
                format!(r#"<div class="social-plugin-metadata-about">{about}</div>"#)
            }
            _ => empty_state(options, NO_ENTRIES_TEXT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{render, test_support::ctx};
    use super::*;
    use crate::content::ContentKind;
    use serde_json::json;

    #[test]
    fn about_text_is_not_escaped() {
        let html = render(
            ContentKind::About,
            Some(&json!({"about": "Fresh <em>coffee</em> & cake", "id": "1"})),
            &RenderOptions::default(),
            &ctx(),
        );
        assert_eq!(
            html,
            r#"<div class="social-plugin-metadata-about">Fresh <em>coffee</em> & cake</div>"#
        );
    }

    #[test]
    fn blank_about_shows_empty_state() {
        for body in [json!({"id": "1"}), json!({"about": "", "id": "1"})] {
            let html = render(ContentKind::About, Some(&body), &RenderOptions::default(), &ctx());
            assert!(html.contains(NO_ENTRIES_TEXT));
        }
    }
}

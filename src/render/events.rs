//! Event listing.

use serde_json::Value;

use super::date_format::{DEFAULT_DATE_FORMAT, format_php, parse_graph_time};
use super::{NO_EVENTS_TEXT, RenderContext, Renderer, empty_state, escape, escape_attr, not_found};
use crate::content::RenderOptions;

fn str_field<'a>(event: &'a Value, key: &str) -> &'a str {
    event.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn matches_filters(event: &Value, options: &RenderOptions) -> bool {
    let category_ok = options
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .is_none_or(|category| str_field(event, "category").eq_ignore_ascii_case(category));
    let name_ok = options
        .filter
        .as_deref()
        .filter(|f| !f.is_empty())
        .is_none_or(|filter| {
            str_field(event, "name")
                .to_lowercase()
                .contains(&filter.to_lowercase())
        });
    category_ok && name_ok
}

fn formatted_time(event: &Value, key: &str, format: &str) -> String {
    parse_graph_time(str_field(event, key))
        .map(|time| escape(&format_php(&time, format)))
        .unwrap_or_default()
}

pub struct EventsRenderer;

impl Renderer for EventsRenderer {
    fn render(&self, content: &Value, options: &RenderOptions, ctx: &RenderContext) -> String {
        let Some(events) = content.get("data").and_then(Value::as_array) else {
            return not_found();
        };

        let events: Vec<&Value> = events
            .iter()
            .filter(|event| matches_filters(event, options))
            .collect();
        if events.is_empty() {
            return empty_state(options, NO_EVENTS_TEXT);
        }

        let shared = options.date_format.as_deref().filter(|f| !f.is_empty());
        let start_format = options
            .date_format_start
            .as_deref()
            .filter(|f| !f.is_empty())
            .or(shared)
            .unwrap_or(DEFAULT_DATE_FORMAT);
        let end_format = options
            .date_format_end
            .as_deref()
            .filter(|f| !f.is_empty())
            .or(shared)
            .unwrap_or(DEFAULT_DATE_FORMAT);

        let body: String = events
            .iter()
            .map(|event| {
                let name = escape(str_field(event, "name"));
                let title = if options.link {
                    let href = format!("{}events/{}", ctx.facebook_base, str_field(event, "id"));
                    format!(r#"<a href="{}" target="_blank">{name}</a>"#, escape_attr(&href))
                } else {
                    name
                };
                format!(
                    concat!(
                        r#"<div class="social-plugin-metadata-event">"#,
                        r#"<div class="social-plugin-metadata-event-title">{title}</div>"#,
                        r#"<div class="social-plugin-metadata-event-dates"><span>{start}</span> <span>{end}</span></div>"#,
                        r#"</div>"#
                    ),
                    title = title,
                    start = formatted_time(event, "start_time", start_format),
                    end = formatted_time(event, "end_time", end_format),
                )
            })
            .collect();

        format!(r#"<div class="social-plugin-metadata-events">{body}</div>"#)
    }
}

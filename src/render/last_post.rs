//! Recent posts with relative ages.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use super::date_format::{long_date, parse_graph_time};
use super::{NO_POSTS_TEXT, RenderContext, Renderer, empty_state, escape, escape_attr};
use crate::content::RenderOptions;

pub const UPDATED_PLACEHOLDER: &str = "<i>Some information has been updated on Facebook</i>";

const FACEBOOK_ICON: &str = "https://upload.wikimedia.org/wikipedia/commons/c/c2/F_icon.svg";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// "N minutes ago" under an hour, hours under a day, days under three days,
/// then the long date.
pub fn relative_age(created: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> String {
    let seconds = (*now - *created).num_seconds().max(0);
    if seconds < HOUR {
        format!("{} minutes ago", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{} hours ago", seconds / HOUR)
    } else if seconds < 3 * DAY {
        format!("{} days ago", seconds / DAY)
    } else {
        long_date(&created.with_timezone(&now.timezone()))
    }
}

/// First `max_words` space-separated words, with `...` when anything was cut.
pub fn truncate_words(message: &str, max_words: usize) -> String {
    let words: Vec<&str> = message.split(' ').collect();
    if words.len() <= max_words {
        return message.to_string();
    }
    format!("{}...", words[..max_words].join(" "))
}

fn created_time(post: &Value) -> Option<DateTime<FixedOffset>> {
    post.get("created_time")
        .and_then(Value::as_str)
        .and_then(parse_graph_time)
}

pub struct LastPostRenderer;

impl LastPostRenderer {
    fn render_post(&self, post: &Value, options: &RenderOptions, ctx: &RenderContext) -> String {
        let message = match post.get("message").and_then(Value::as_str) {
            Some(text) => {
                let text = match options.max_words {
                    Some(n) => truncate_words(text, n),
                    None => text.to_string(),
                };
                escape(&text)
            }
            None => UPDATED_PLACEHOLDER.to_string(),
        };

        let age = created_time(post)
            .map(|created| relative_age(&created, &ctx.now))
            .unwrap_or_default();
        let permalink = post
            .get("permalink_url")
            .and_then(Value::as_str)
            .unwrap_or_default();

        format!(
            concat!(
                r#"<div class="social-plugin-metadata-lastpost">"#,
                r#"<div>{message}</div>"#,
                r#"<div class="social-plugin-metadata-lastpost-footer">"#,
                r#"<div class="social-plugin-metadata-lastpost-link"><small>"#,
                r#"<a href="{href}" target="_blank"><img src="{icon}" style="width: 18px; vertical-align: middle;" /> Show on Facebook</a>"#,
                r#"</small></div>"#,
                r#"<div class="social-plugin-metadata-lastpost-created"><small>{age}</small></div>"#,
                r#"</div></div>"#
            ),
            message = message,
            href = escape_attr(permalink),
            icon = FACEBOOK_ICON,
            age = age,
        )
    }
}

impl Renderer for LastPostRenderer {
    fn render(&self, content: &Value, options: &RenderOptions, ctx: &RenderContext) -> String {
        let posts = content
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let posts: Vec<&Value> = match options.max_age {
            Some(max_age) => posts
                .iter()
                .filter(|post| {
                    created_time(post).is_some_and(|created| {
                        (ctx.now - created).num_seconds() < max_age.saturating_mul(MINUTE)
                    })
                })
                .collect(),
            None => posts.iter().collect(),
        };

        if posts.is_empty() {
            return empty_state(options, NO_POSTS_TEXT);
        }

        let body: String = posts
            .iter()
            .map(|post| self.render_post(post, options, ctx))
            .collect();
        format!(r#"<div class="social-plugin-lastposts">{body}</div>"#)
    }
}

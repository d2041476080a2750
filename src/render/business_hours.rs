//! Opening hours table.
//!
//! The Graph API reports hours as flat keys such as `mon_1_open` and
//! `mon_1_close`; the index allows several slots per day.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Datelike, Weekday};
use regex::Regex;
use serde_json::Value;

use super::{NO_ENTRIES_TEXT, RenderContext, Renderer, empty_state, escape};
use crate::content::RenderOptions;

const DAYS: [(&str, &str, Weekday); 7] = [
    ("mon", "Monday", Weekday::Mon),
    ("tue", "Tuesday", Weekday::Tue),
    ("wed", "Wednesday", Weekday::Wed),
    ("thu", "Thursday", Weekday::Thu),
    ("fri", "Friday", Weekday::Fri),
    ("sat", "Saturday", Weekday::Sat),
    ("sun", "Sunday", Weekday::Sun),
];

fn hours_key() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| Regex::new(r"(\w{3})_(\d+)_(open|close)").expect("static regex"))
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Slot {
    open: String,
    close: String,
}

/// Slots per day abbreviation, ordered by slot index.
fn group_by_day(hours: &serde_json::Map<String, Value>) -> BTreeMap<String, BTreeMap<u32, Slot>> {
    let mut days: BTreeMap<String, BTreeMap<u32, Slot>> = BTreeMap::new();

    for (key, value) in hours {
        let Some(caps) = hours_key().captures(key) else {
            continue;
        };
        let Ok(index) = caps[2].parse::<u32>() else {
            continue;
        };
        let time = value.as_str().unwrap_or_default().to_string();
        let slot = days
            .entry(caps[1].to_ascii_lowercase())
            .or_default()
            .entry(index)
            .or_default();
        match &caps[3] {
            "open" => slot.open = time,
            _ => slot.close = time,
        }
    }

    days
}

pub struct BusinessHoursRenderer;

impl Renderer for BusinessHoursRenderer {
    fn render(&self, content: &Value, options: &RenderOptions, ctx: &RenderContext) -> String {
        let Some(hours) = content
            .get("hours")
            .and_then(Value::as_object)
            .filter(|h| !h.is_empty())
        else {
            return empty_state(options, NO_ENTRIES_TEXT);
        };

        let days = group_by_day(hours);
        let today = ctx.now.weekday();

        let rows: Vec<String> = DAYS
            .iter()
            .filter_map(|(abbr, name, weekday)| {
                let slots = days.get(*abbr)?;
                let class = if *weekday == today {
                    "social-plugin-metadata-days social-plugin-metadata-today"
                } else {
                    "social-plugin-metadata-days"
                };
                let times: String = slots
                    .values()
                    .map(|slot| format!("<div>{} - {}</div>", escape(&slot.open), escape(&slot.close)))
                    .collect();
                Some(format!(
                    r#"<div class="{class}"><div>{name}</div><div class="social-plugin-metadata-hours-times">{times}</div></div>"#
                ))
            })
            .collect();

        if rows.is_empty() {
            return empty_state(options, NO_ENTRIES_TEXT);
        }

        format!(
            r#"<div class="social-plugin-metadata-hours">{}</div>"#,
            rows.concat()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::{render, test_support::ctx};
    use super::*;
    use crate::content::ContentKind;
    use serde_json::json;

    fn render_hours(hours: Value) -> String {
        render(
            ContentKind::BusinessHours,
            Some(&json!({ "hours": hours, "id": "1" })),
            &RenderOptions::default(),
            &ctx(),
        )
    }

    #[test]
    fn single_monday_slot() {
        let html = render_hours(json!({"mon_1_open": "09:00", "mon_1_close": "17:00"}));

        assert_eq!(
            html,
            r#"<div class="social-plugin-metadata-hours"><div class="social-plugin-metadata-days"><div>Monday</div><div class="social-plugin-metadata-hours-times"><div>09:00 - 17:00</div></div></div></div>"#
        );
    }

    #[test]
    fn days_are_ordered_monday_first_and_slots_by_index() {
        let html = render_hours(json!({
            "sun_1_open": "10:00", "sun_1_close": "14:00",
            "wed_2_open": "15:00", "wed_2_close": "18:00",
            "wed_1_open": "08:00", "wed_1_close": "12:00",
            "mon_1_open": "09:00", "mon_1_close": "17:00"
        }));

        let monday = html.find("Monday").unwrap();
        let wednesday = html.find("Wednesday").unwrap();
        let sunday = html.find("Sunday").unwrap();
        assert!(monday < wednesday && wednesday < sunday);
        assert!(html.find("08:00 - 12:00").unwrap() < html.find("15:00 - 18:00").unwrap());
        assert!(!html.contains("Tuesday"));
    }

    #[test]
    fn current_weekday_is_highlighted() {
        // ctx() is a Sunday
        let html = render_hours(json!({
            "sat_1_open": "10:00", "sat_1_close": "14:00",
            "sun_1_open": "11:00", "sun_1_close": "13:00"
        }));

        assert!(html.contains(
            r#"<div class="social-plugin-metadata-days social-plugin-metadata-today"><div>Sunday</div>"#
        ));
        assert!(html.contains(r#"<div class="social-plugin-metadata-days"><div>Saturday</div>"#));
    }

    #[test]
    fn missing_half_of_a_slot_renders_blank() {
        let html = render_hours(json!({"fri_1_open": "09:00"}));
        assert!(html.contains("<div>09:00 - </div>"));
    }

    #[test]
    fn empty_or_unparseable_hours_show_empty_state() {
        assert!(render_hours(json!({})).contains(NO_ENTRIES_TEXT));
        assert!(render_hours(json!({"holiday": "closed"})).contains(NO_ENTRIES_TEXT));

        let custom = render(
            ContentKind::BusinessHours,
            Some(&json!({"id": "1"})),
            &RenderOptions {
                empty_message: Some("Call us".into()),
                ..Default::default()
            },
            &ctx(),
        );
        assert!(custom.contains(">Call us<"));
    }
}

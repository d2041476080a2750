//! Date formatting with PHP-style format strings (`Y-m-d H:i`, `D, j M`, ...).
//!
//! Site owners write event date formats in the letter syntax they already
//! know from their publishing platform; each letter maps to one field and a
//! backslash emits the next character literally. Letters without a meaning
//! are copied through.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};

pub const DEFAULT_DATE_FORMAT: &str = "Y-m-d H:i";

/// Parses a Graph API timestamp such as `2026-10-20T19:00:00+0200`.
///
/// Zone-less values are read as UTC.
pub fn parse_graph_time(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(value, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
        })
}

fn english_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn zone_name<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    if dt.offset().fix().local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        dt.format("%:z").to_string()
    }
}

/// Formats `dt` according to the PHP-style `format`.
pub fn format_php<Tz: TimeZone>(dt: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        let piece = match c {
            '\\' => {
                if let Some(literal) = chars.next() {
                    out.push(literal);
                }
                continue;
            }
            // Day
            'd' => format!("{:02}", dt.day()),
            'D' => dt.format("%a").to_string(),
            'j' => dt.day().to_string(),
            'l' => dt.format("%A").to_string(),
            'N' => dt.weekday().number_from_monday().to_string(),
            'S' => english_suffix(dt.day()).to_string(),
            'w' => dt.weekday().num_days_from_sunday().to_string(),
            'z' => dt.ordinal0().to_string(),
            // Week
            'W' => format!("{:02}", dt.iso_week().week()),
            // Month
            'F' => dt.format("%B").to_string(),
            'm' => format!("{:02}", dt.month()),
            'M' => dt.format("%b").to_string(),
            'n' => dt.month().to_string(),
            't' => days_in_month(dt.year(), dt.month()).to_string(),
            // Year
            'L' => u8::from(is_leap_year(dt.year())).to_string(),
            'o' => dt.iso_week().year().to_string(),
            'Y' => dt.year().to_string(),
            'y' => format!("{:02}", dt.year().rem_euclid(100)),
            // Time
            'a' => (if dt.hour() < 12 { "am" } else { "pm" }).to_string(),
            'A' => (if dt.hour() < 12 { "AM" } else { "PM" }).to_string(),
            'g' => dt.hour12().1.to_string(),
            'G' => dt.hour().to_string(),
            'h' => format!("{:02}", dt.hour12().1),
            'H' => format!("{:02}", dt.hour()),
            'i' => format!("{:02}", dt.minute()),
            's' => format!("{:02}", dt.second()),
            'v' => format!("{:03}", dt.timestamp_subsec_millis()),
            // Timezone
            'e' | 'T' => zone_name(dt),
            'O' => dt.format("%z").to_string(),
            'P' => dt.format("%:z").to_string(),
            'Z' => dt.offset().fix().local_minus_utc().to_string(),
            // Full date/time
            'c' => dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            'r' => dt.format("%a, %d %b %Y %H:%M:%S %z").to_string(),
            'U' => dt.timestamp().to_string(),
            other => {
                out.push(other);
                continue;
            }
        };
        out.push_str(&piece);
    }

    out
}

/// Long English date, e.g. `October 18, 2026`.
pub fn long_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%B %-d, %Y").to_string()
}

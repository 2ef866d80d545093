//! Formatting and arithmetic helpers shared by sources, metrics and reports.
//!
//! Report texts are Dutch, so dates and durations are rendered with Dutch
//! month names and units.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};

/// Dutch month names, indexed by month number minus one.
pub const MONTHS: [&str; 12] = [
    "januari",
    "februari",
    "maart",
    "april",
    "mei",
    "juni",
    "juli",
    "augustus",
    "september",
    "oktober",
    "november",
    "december",
];

/// Returns `numerator / denominator * 100`, rounded.
///
/// A zero denominator yields 100, unless the numerator is zero as well and
/// `zero_divided_by_zero_is_zero` is set.
pub fn percentage(numerator: f64, denominator: f64, zero_divided_by_zero_is_zero: bool) -> i64 {
    if denominator == 0.0 {
        return if numerator == 0.0 && zero_divided_by_zero_is_zero {
            0
        } else {
            100
        };
    }
    (numerator / denominator * 100.0).round() as i64
}

/// Formats a date as "5 april" or, with `year`, "5 april 2013".
pub fn format_date(date: Option<NaiveDate>, year: bool) -> String {
    let Some(date) = date else {
        return "onbekende datum".to_string();
    };
    let month = MONTHS[date.month0() as usize];
    if year {
        format!("{} {month} {}", date.day(), date.year())
    } else {
        format!("{} {month}", date.day())
    }
}

/// Formats the largest nonzero unit of a duration, e.g. "3 dagen" or "een uur".
pub fn format_timedelta(delta: TimeDelta) -> String {
    let days = delta.num_days();
    let seconds = delta.num_seconds() - days * 86_400;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    for (amount, singular, plural) in [
        (days, "dag", "dagen"),
        (hours, "uur", "uur"),
        (minutes, "minuut", "minuten"),
    ] {
        if amount > 1 {
            return format!("{amount} {plural}");
        }
        if amount == 1 {
            return format!("een {singular}");
        }
    }
    "minder dan een minuut".to_string()
}

/// Counts working days between two moments, ignoring the time of day.
pub fn count_working_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let days = (end.date() - start.date()).num_days();
    let weeks = days.div_euclid(7);
    let weekday = |moment: NaiveDateTime| {
        let day = i64::from(moment.weekday().num_days_from_monday());
        if day < 5 { day } else { 0 }
    };
    let mut diff = weekday(end) - weekday(start);
    if diff < 0 {
        diff += 5;
    }
    weeks * 5 + diff
}

/// Escapes the characters that are special in HTML.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '>' => escaped.push_str("&gt;"),
            '<' => escaped.push_str("&lt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Prefixes a unit with a space, except for "%" and empty units.
pub fn space_unit(unit: &str) -> String {
    if unit.is_empty() || unit == "%" || unit.starts_with(' ') {
        unit.to_string()
    } else {
        format!(" {unit}")
    }
}

/// Joins url parts with single slashes, keeping a trailing slash of the last part.
pub fn url_join(parts: &[&str]) -> String {
    let mut joined = parts
        .iter()
        .map(|part| part.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/");
    if parts.last().is_some_and(|part| part.ends_with('/')) {
        joined.push('/');
    }
    joined
}

/// Converts up to three version parts into a single comparable number.
pub fn version_number_to_numerical(parts: &[u32]) -> i64 {
    parts
        .iter()
        .take(3)
        .zip([10_000_i64, 100, 1])
        .map(|(part, weight)| i64::from(*part) * weight)
        .sum()
}

/// Splits a version string like "7.9.1 (build 123)" into its numeric parts.
pub fn version_parts(version: &str) -> Vec<u32> {
    version
        .split(|ch: char| !ch.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect()
}

/// Formats a number without a fractional part when it has none.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

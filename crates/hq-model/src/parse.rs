//! Date and time parsing for the formats external systems report.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Parses a US-style date time such as "Apr 5, 2013 10:04:10 AM".
pub fn parse_us_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), "%b %d, %Y %I:%M:%S %p").ok()
}

/// Parses an ISO date such as "2013-04-05".
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Parses an ISO date time, ignoring fractional seconds and the zone suffix.
///
/// Accepts "2013-04-05T10:04:10", "2013-04-05T10:04:10.123Z" and
/// "2013-04-05T10:04:10+0200".
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let head = text.get(..19)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Parses a SQL date time such as "2013-04-05 10:04:10".
pub fn parse_sql_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S").ok()
}

/// Month number of an English or Dutch abbreviated month name.
fn abbreviated_month(name: &str) -> Option<u32> {
    let month = match name.trim_end_matches('.').to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" | "mrt" => 3,
        "apr" => 4,
        "may" | "mei" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" | "okt" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parses a day-first date time with an abbreviated month, such as
/// "5-mei-2013 10:04:10" or "5 okt. 2013 10:04:10".
pub fn parse_abbreviated_datetime(text: &str) -> Option<NaiveDateTime> {
    let (date, time) = text.trim().rsplit_once(' ')?;
    let mut parts = date.split(['-', ' ']).filter(|part| !part.is_empty());
    let day = parts.next()?.parse().ok()?;
    let month = abbreviated_month(parts.next()?)?;
    let year = parts.next()?.parse().ok()?;
    let time = chrono::NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.and_time(time))
}

/// Converts a Unix timestamp in seconds to local time.
pub fn from_timestamp_secs(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|moment| moment.with_timezone(&Local).naive_local())
}

/// Converts a Unix timestamp in milliseconds to local time.
pub fn from_timestamp_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|moment| moment.with_timezone(&Local).naive_local())
}

/// The current local time.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

//! Japanese calendar-date rendering for ISO-8601 timestamps.

use chrono::{DateTime, Datelike, Duration};

/// Sentinel rendered when a value is absent.
pub const NO_INFO: &str = "情報なし";
/// Sentinel rendered when a timestamp cannot be parsed.
pub const INVALID_DATE: &str = "無効な日付";

/// Renders an ISO-8601 timestamp as a zero-padded JST calendar date.
///
/// Absent or blank input renders as 情報なし, unparsable input as
/// 無効な日付. Valid timestamps are shifted to UTC+9 before the date is
/// taken, so an evening UTC timestamp can land on the following day.
pub fn format_date_ja(value: Option<&str>) -> String {
    let Some(raw) = value else {
        return NO_INFO.to_string();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NO_INFO.to_string();
    }

    match DateTime::parse_from_rfc3339(trimmed) {
        Ok(parsed) => {
            let jst = parsed.naive_utc() + Duration::hours(9);
            format!("{:04}年{:02}月{:02}日", jst.year(), jst.month(), jst.day())
        }
        Err(_) => INVALID_DATE.to_string(),
    }
}

/// Calendar-date rendering used for the document's application-period line.
///
/// The application period printed on the document keeps the calendar date
/// exactly as written in the timestamp (no timezone shift, no zero
/// padding), matching how subsidy notices state their windows.
pub fn period_date(value: Option<&str>) -> Option<String> {
    let raw = value?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(format!("{}年{}月{}日", parsed.year(), parsed.month(), parsed.day()))
}

//! Sold-date interpretation.
//!
//! Marketplace date text arrives in several shapes: relative ("3d
//! ago", "14h ago"), absolute ("Sold Oct 3, 2024"), year-less
//! ("Sold Oct 3"), or not at all. Interpretation never fails:
//! unparseable text defaults to `now`.
//! Known accuracy limitation: that fallback can inject false
//! "most recent" sales into the trend computation.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use regex::Regex;

static RELATIVE_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*d(?:ays?)?\s+ago\b").unwrap());
static RELATIVE_HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*h(?:ours?|rs?)?\s+ago\b").unwrap());
static SIGNAL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:sold|ended)\b[\s:]*").unwrap());

const ABSOLUTE_FORMATS: &[&str] = &["%b %d, %Y", "%d %b %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Strip a leading "Sold"/"Ended" marker from date text.
pub fn strip_signal_prefix(text: &str) -> String {
    SIGNAL_PREFIX_RE.replace(text.trim(), "").trim().to_string()
}

/// Interpret marketplace date text relative to `now`.
///
/// "N d ago" and "N h ago" are offsets from `now`; anything else is
/// tried against the absolute formats; on total failure the result is
/// `now` itself (a listing is never discarded over its date).
pub fn interpret(text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = strip_signal_prefix(text);

    if let Some(caps) = RELATIVE_DAYS_RE.captures(&text) {
        if let Ok(days) = caps[1].parse::<i64>() {
            return now - Duration::days(days);
        }
    }
    if let Some(caps) = RELATIVE_HOURS_RE.captures(&text) {
        if let Ok(hours) = caps[1].parse::<i64>() {
            return now - Duration::hours(hours);
        }
    }

    for format in ABSOLUTE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return midnight.and_utc();
            }
        }
    }

    if let Some(parsed) = interpret_yearless(&text, now) {
        return parsed;
    }

    now
}

/// Parse a year-less caption date ("Oct 3") against the current year.
///
/// A sold date cannot be in the future, so a result past `now` belongs
/// to the previous year.
fn interpret_yearless(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let candidate = format!("{} {}", text, now.year());
    let date = NaiveDate::parse_from_str(&candidate, "%b %d %Y").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
    if midnight > now {
        return date
            .with_year(now.year() - 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|d| d.and_utc());
    }
    Some(midnight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn relative_days() {
        assert_eq!(interpret("3d ago", now()), now() - Duration::days(3));
        assert_eq!(interpret("10 days ago", now()), now() - Duration::days(10));
    }

    #[test]
    fn relative_hours() {
        assert_eq!(interpret("14h ago", now()), now() - Duration::hours(14));
        assert_eq!(interpret("2 hours ago", now()), now() - Duration::hours(2));
    }

    #[test]
    fn absolute_with_sold_prefix() {
        let parsed = interpret("Sold Oct 3, 2024", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 10, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn absolute_with_ended_prefix() {
        let parsed = interpret("Ended  Sep 28, 2024", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 9, 28, 0, 0, 0).unwrap());
    }

    #[test]
    fn iso_date() {
        let parsed = interpret("2024-08-15", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 8, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn yearless_assumes_current_year() {
        let parsed = interpret("Sold Oct 3", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 10, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn yearless_future_date_belongs_to_last_year() {
        // now() is Oct 20, 2024; a December sale can only be 2023's.
        let parsed = interpret("Dec 30", now());
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_defaults_to_now() {
        assert_eq!(interpret("see description", now()), now());
        assert_eq!(interpret("", now()), now());
    }

    #[test]
    fn prefix_stripping() {
        assert_eq!(strip_signal_prefix("Sold Oct 3, 2024"), "Oct 3, 2024");
        assert_eq!(strip_signal_prefix("ENDED: yesterday"), "yesterday");
        assert_eq!(strip_signal_prefix("Oct 3, 2024"), "Oct 3, 2024");
    }
}

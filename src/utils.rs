use chrono::{Datelike, Local, NaiveDate, Utc};

pub fn format_currency(v: f64) -> String {
    format!("{v:.2}")
}

pub fn format_kwh(v: f64) -> String {
    format!("{v:.3}")
}

/// Round to `places` decimals, for JSON output
pub fn round_to(v: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (v * factor).round() / factor
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp id that sorts after every id in `existing`.
///
/// Two items created in the same millisecond would otherwise collide.
/// `None` once an existing id is `i64::MAX`.
pub fn next_id(now_ms: i64, existing: impl IntoIterator<Item = i64>) -> Option<i64> {
    match existing.into_iter().max() {
        Some(max) if max >= now_ms => max.checked_add(1),
        _ => Some(now_ms),
    }
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Parse `YYYY-MM` into the first day of that month
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").ok()
}

pub fn month_label(d: NaiveDate) -> String {
    d.format("%Y-%m").to_string()
}

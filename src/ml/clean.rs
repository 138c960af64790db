//! Parse-or-reject coercion of loosely typed upload rows.
//!
//! Rows come from JSON bodies or CSV uploads, so dates are strings and
//! numbers may be either JSON numbers or numeric-looking strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::forecast::{Observation, DEFAULT_HORIZON, MAX_HORIZON};

/// Columns that may carry the observed amount, in lookup order.
const VALUE_FIELDS: [&str; 3] = ["sales", "spend", "value"];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Keep every row that yields a valid observation; drop the rest silently.
pub fn observations(rows: &[Value]) -> Vec<Observation> {
    rows.iter().filter_map(observation).collect()
}

pub fn observation(row: &Value) -> Option<Observation> {
    let record = row.as_object()?;
    let date = record.get("date").and_then(Value::as_str).and_then(parse_date)?;
    let value = VALUE_FIELDS
        .iter()
        .find_map(|field| record.get(*field))
        .and_then(coerce_number)?;

    Some(Observation { date, value })
}

/// Calendar day of a date or date-time string. Offsets are normalised to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// A finite number from a JSON number or a numeric string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Requested horizon in days. Anything non-numeric falls back to the
/// default; numeric requests are floored and clamped into `1..=MAX_HORIZON`.
pub fn horizon(requested: Option<&Value>) -> usize {
    let days = match requested {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match days {
        Some(d) if d.is_nan() => DEFAULT_HORIZON,
        Some(d) if d >= MAX_HORIZON as f64 => MAX_HORIZON,
        Some(d) if d < 1.0 => 1,
        Some(d) => d.floor() as usize,
        None => DEFAULT_HORIZON,
    }
}

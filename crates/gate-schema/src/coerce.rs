//! Primitive coercion and format checks.
//!
//! Every function returns the normalised value or the [`Reason`] the value
//! was rejected. Normalisation is idempotent: feeding an output back in
//! yields the same output.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use regex::Regex;
use serde_json::{Number, Value};

use crate::report::Reason;

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Strings, numbers and booleans to their text form.
pub(crate) fn to_string(value: &Value) -> Result<String, Reason> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Reason::InvalidType),
    }
}

/// Numbers, and strings holding a finite decimal number.
pub(crate) fn to_number(value: &Value, integer: bool) -> Result<Value, Reason> {
    let parsed = match value {
        Value::Number(n) => {
            let f = n.as_f64().ok_or(Reason::InvalidType)?;
            if integer && f.fract() != 0.0 {
                return Err(Reason::NotInteger);
            }
            return Ok(value.clone());
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(Reason::InvalidType);
            }
            trimmed.parse::<f64>().map_err(|_| Reason::InvalidType)?
        }
        _ => return Err(Reason::InvalidType),
    };

    if !parsed.is_finite() {
        return Err(Reason::InvalidType);
    }
    if integer && parsed.fract() != 0.0 {
        return Err(Reason::NotInteger);
    }
    number_value(parsed)
}

fn number_value(f: f64) -> Result<Value, Reason> {
    if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER {
        return Ok(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number).ok_or(Reason::InvalidType)
}

/// Booleans, and strings: case-insensitive `"true"` is true, anything else
/// false.
pub(crate) fn to_bool(value: &Value) -> Result<bool, Reason> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => Ok(s.trim().eq_ignore_ascii_case("true")),
        _ => Err(Reason::InvalidType),
    }
}

/// RFC 3339 date-time, full-date (midnight UTC), or epoch milliseconds.
/// Output is RFC 3339 in UTC.
pub(crate) fn date_time(value: &Value) -> Result<String, Reason> {
    let parsed: DateTime<Utc> = match value {
        Value::String(s) => {
            let s = s.trim();
            match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(_) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
                    .ok_or(Reason::InvalidDate)?,
            }
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .ok_or(Reason::InvalidDate)?,
        _ => return Err(Reason::InvalidDate),
    };
    Ok(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// `YYYY-MM-DD`.
pub(crate) fn date(text: &str) -> Result<String, Reason> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| Reason::InvalidDate)
}

/// `local@domain.tld`, no whitespace.
pub(crate) fn email(text: &str) -> Result<String, Reason> {
    let Some((local, domain)) = text.split_once('@') else {
        return Err(Reason::InvalidFormat);
    };
    let valid = !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !text.chars().any(char::is_whitespace);
    if valid {
        Ok(text.to_string())
    } else {
        Err(Reason::InvalidFormat)
    }
}

/// Absolute URL.
pub(crate) fn url(text: &str) -> Result<String, Reason> {
    url::Url::parse(text)
        .map(|_| text.to_string())
        .map_err(|_| Reason::InvalidFormat)
}

/// UUID, normalised to lowercase hyphenated form.
pub(crate) fn uuid(text: &str) -> Result<String, Reason> {
    uuid::Uuid::parse_str(text.trim())
        .map(|u| u.hyphenated().to_string())
        .map_err(|_| Reason::InvalidFormat)
}

/// Compile `pattern` as a full-value match.
pub(crate) fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

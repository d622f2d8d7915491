//! Response normalization helpers.
//!
//! Missing numeric fields become `null` (`None`), never `0`, unless the
//! field is derived (see [`percent_change`]).

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Loose numeric parse of a number or numeric string.
///
/// Unparsable, non-finite and zero values are all `None`. Providers that
/// report prices as strings use `"0"` to mean "no data".
pub fn parse_number_or_null(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_float(s),
        _ => None,
    }?;
    (parsed.is_finite() && parsed != 0.0).then_some(parsed)
}

/// Parse the longest numeric prefix of `s` ("12.5abc" → 12.5).
fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        let c = bytes[end];
        match c {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }
    // Back off a dangling exponent or sign ("1e", "1e-").
    let mut candidate = &s[..end];
    while !candidate.is_empty() && candidate.parse::<f64>().is_err() {
        candidate = &candidate[..candidate.len() - 1];
    }
    candidate.parse().ok()
}

/// `(price - previous_close) / previous_close * 100`, or `0` when the
/// previous close is zero or not finite.
pub fn percent_change(price: f64, previous_close: f64) -> f64 {
    if previous_close == 0.0 || !previous_close.is_finite() || !price.is_finite() {
        return 0.0;
    }
    (price - previous_close) / previous_close * 100.0
}

/// Serde adapter for provider fields that may be a number or a numeric
/// string. Pairs with `#[serde(default, deserialize_with = ...)]`.
pub fn loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(parse_number_or_null(value.as_ref()))
}

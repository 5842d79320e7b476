//! Permissive numeric decoding
//!
//! Exchange payloads mix JSON numbers and numeric strings (`"50000.01"`,
//! `50000.01`, `"1e-7"`). Every helper here accepts either encoding and
//! falls back to zero instead of failing, so one odd field never rejects a
//! whole snapshot.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Coerce a JSON value into a `Decimal`; non-numeric input yields zero
pub fn to_decimal(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else if let Some(u) = n.as_u64() {
                Decimal::from(u)
            } else {
                n.as_f64()
                    .and_then(|f| Decimal::try_from(f).ok())
                    .unwrap_or(Decimal::ZERO)
            }
        }
        Value::String(s) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

/// Parse a decimal string, accepting scientific notation; invalid input yields zero
pub fn parse_decimal(s: &str) -> Decimal {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .unwrap_or(Decimal::ZERO)
}

/// Coerce a JSON value into an `i64`; fractional input is truncated
pub fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Coerce a JSON value into a `u64`; negative input yields zero
pub fn to_u64(value: &Value) -> u64 {
    u64::try_from(to_i64(value)).unwrap_or(0)
}

/// Look up `key` in an object and coerce it; missing keys yield zero
pub fn field_decimal(object: &Value, key: &str) -> Decimal {
    object.get(key).map(to_decimal).unwrap_or(Decimal::ZERO)
}

/// Look up `key` in an object and coerce it; missing keys yield zero
pub fn field_i64(object: &Value, key: &str) -> i64 {
    object.get(key).map(to_i64).unwrap_or(0)
}

/// Look up `key` in an object and coerce it; missing keys yield zero
pub fn field_u64(object: &Value, key: &str) -> u64 {
    object.get(key).map(to_u64).unwrap_or(0)
}

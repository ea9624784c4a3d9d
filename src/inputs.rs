//! Per-invocation input mapping and decimal coercion
//!
//! Callers supply a plain field-name → string-or-number map. Floats are
//! converted through their string form so `0.025` arrives as exactly 0.025
//! rather than the nearest binary fraction; strings tolerate the formatting
//! users actually type (`"$250,000"`, `"1_000"`, leading/trailing spaces).

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One raw input value as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Text(String),
}

/// The immutable input mapping for a single invocation.
pub type InputSet = BTreeMap<String, InputValue>;

impl InputValue {
    /// Coerce to a decimal. The error string is the human-readable reason,
    /// ready for the aggregated validation list.
    pub fn to_decimal(&self) -> Result<Decimal, String> {
        match self {
            InputValue::Number(n) => {
                if !n.is_finite() {
                    return Err("is not a valid number".to_string());
                }
                // String round-trip keeps user-entered decimals exact.
                Decimal::from_str(&n.to_string()).map_err(|_| "is not a valid number".to_string())
            }
            InputValue::Text(s) => {
                let cleaned = sanitize_numeric(s);
                if cleaned.is_empty() {
                    return Err("is not a valid number".to_string());
                }
                Decimal::from_str(&cleaned).map_err(|_| "is not a valid number".to_string())
            }
        }
    }

    /// Coerce to an integer (whole-valued decimals accepted).
    pub fn to_integer(&self) -> Result<i64, String> {
        let value = self.to_decimal()?;
        if value.fract() != Decimal::ZERO {
            return Err("must be a whole number".to_string());
        }
        value.to_i64().ok_or_else(|| "is not a valid number".to_string())
    }

    /// The value as trimmed, lowercased text (for enumerated codes).
    pub fn to_code(&self) -> String {
        match self {
            InputValue::Number(n) => n.to_string(),
            InputValue::Text(s) => s.trim().to_ascii_lowercase(),
        }
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Number(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Number(value as f64)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

/// Strip currency symbols, thousands separators and numeric underscores.
fn sanitize_numeric(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '£' | '€' | '¥' | ',' | '_' | ' '))
        .collect()
}

//! Calculation output mapping
//!
//! Results are a flat-or-nested map of named fields plus non-fatal warnings,
//! fully JSON-serializable so the web/CLI layer can return them verbatim.

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::math::{round_money, round_rate, to_f64};

/// Output of a successful calculation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalculationResult {
    #[serde(flatten)]
    fields: Map<String, Value>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl CalculationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A monetary amount, cent-rounded.
    pub fn set_money(&mut self, key: &str, amount: Decimal) {
        self.fields.insert(key.to_string(), Value::from(to_f64(round_money(amount))));
    }

    /// A rate or ratio at the given precision.
    pub fn set_rate(&mut self, key: &str, value: Decimal, places: u32) {
        self.fields.insert(key.to_string(), Value::from(to_f64(round_rate(value, places))));
    }

    pub fn set_number(&mut self, key: &str, value: f64) {
        self.fields.insert(key.to_string(), Value::from(value));
    }

    pub fn set_int(&mut self, key: &str, value: i64) {
        self.fields.insert(key.to_string(), Value::from(value));
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.fields.insert(key.to_string(), Value::from(value));
    }

    pub fn set_text(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), Value::from(value.into()));
    }

    /// A nested breakdown (amortization rows, bracket slices).
    pub fn set_rows<T: Serialize>(&mut self, key: &str, rows: &[T]) {
        match serde_json::to_value(rows) {
            Ok(value) => {
                self.fields.insert(key.to_string(), value);
            }
            Err(err) => {
                // Plain data rows cannot fail to serialize; keep the result
                // usable if a future row type breaks that assumption.
                log::error!("failed to serialize rows for '{key}': {err}");
                self.fields.insert(key.to_string(), Value::Array(Vec::new()));
            }
        }
    }

    /// Attach a non-fatal warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_fields_are_cent_rounded_numbers() {
        let mut result = CalculationResult::new();
        result.set_money("monthly_payment", dec!(1580.1687));

        let value = result.to_value();
        assert_eq!(value["monthly_payment"], serde_json::json!(1580.17));
    }

    #[test]
    fn test_warnings_omitted_when_empty() {
        let mut result = CalculationResult::new();
        result.set_int("units", 500);
        let value = result.to_value();
        assert!(value.get("warnings").is_none());

        result.warn("negative amortization");
        let value = result.to_value();
        assert_eq!(value["warnings"], serde_json::json!(["negative amortization"]));
    }

    #[test]
    fn test_nested_rows_serialize() {
        #[derive(Serialize)]
        struct Row {
            period: u32,
            #[serde(serialize_with = "crate::math::serialize_money")]
            payment: Decimal,
        }

        let mut result = CalculationResult::new();
        result.set_rows("amortization_sample", &[Row { period: 1, payment: dec!(1580.174) }]);
        let value = result.to_value();
        assert_eq!(value["amortization_sample"][0]["period"], 1);
        assert_eq!(value["amortization_sample"][0]["payment"], serde_json::json!(1580.17));
    }
}

//! Shared input-validation framework
//!
//! Every calculator parses its raw `InputSet` through a `FieldReader`, which
//! runs presence, coercion, range and enumerated-value checks while
//! collecting every violation. A user sees all of their mistakes in one
//! pass, never one at a time.
//!
//! Reader methods return a usable value even on failure (zero / default /
//! empty string) so parsing can continue; callers must check `finish()`
//! before trusting any returned value.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::inputs::{InputSet, InputValue};

/// Ordered list of human-readable validation errors. Empty means "proceed
/// to calculate".
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// Aggregating field reader over one invocation's inputs.
pub struct FieldReader<'a> {
    inputs: &'a InputSet,
    errors: Vec<String>,
}

impl<'a> FieldReader<'a> {
    pub fn new(inputs: &'a InputSet) -> Self {
        Self { inputs, errors: Vec::new() }
    }

    /// A decimal field that must be present.
    pub fn decimal(&mut self, field: &str, min: Option<Decimal>, max: Option<Decimal>) -> Decimal {
        match self.inputs.get(field) {
            None => {
                self.errors.push(format!("{field} is required"));
                Decimal::ZERO
            }
            Some(raw) => self.check_decimal(field, raw, min, max),
        }
    }

    /// A decimal field with a default when absent. A present-but-malformed
    /// value is still an error, never silently replaced.
    pub fn decimal_or(
        &mut self,
        field: &str,
        default: Decimal,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> Decimal {
        match self.inputs.get(field) {
            None => default,
            Some(raw) => self.check_decimal(field, raw, min, max),
        }
    }

    /// An integer field that must be present.
    pub fn integer(&mut self, field: &str, min: Option<i64>, max: Option<i64>) -> i64 {
        match self.inputs.get(field) {
            None => {
                self.errors.push(format!("{field} is required"));
                0
            }
            Some(raw) => self.check_integer(field, raw, min, max),
        }
    }

    /// An integer field with a default when absent.
    pub fn integer_or(&mut self, field: &str, default: i64, min: Option<i64>, max: Option<i64>) -> i64 {
        match self.inputs.get(field) {
            None => default,
            Some(raw) => self.check_integer(field, raw, min, max),
        }
    }

    /// An enumerated code with a default when absent. Unknown codes report
    /// the allowed values as the fallback suggestion.
    pub fn code_or(&mut self, field: &str, default: &str, allowed: &[&str]) -> String {
        match self.inputs.get(field) {
            None => default.to_string(),
            Some(raw) => {
                let code = raw.to_code();
                if allowed.contains(&code.as_str()) {
                    code
                } else {
                    self.errors.push(format!(
                        "unknown {field} '{code}' (expected one of: {})",
                        allowed.join(", ")
                    ));
                    default.to_string()
                }
            }
        }
    }

    /// An enumerated code that must be present.
    pub fn code(&mut self, field: &str, allowed: &[&str]) -> String {
        if self.inputs.get(field).is_none() {
            self.errors.push(format!("{field} is required"));
            return allowed.first().copied().unwrap_or_default().to_string();
        }
        self.code_or(field, allowed.first().copied().unwrap_or_default(), allowed)
    }

    /// Whether a field was supplied at all (for conditional requirements).
    pub fn has(&self, field: &str) -> bool {
        self.inputs.contains_key(field)
    }

    /// Record a cross-field violation.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Consume the reader: `Ok(())` when no violations were recorded.
    pub fn finish(self) -> Result<(), Vec<String>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    fn check_decimal(
        &mut self,
        field: &str,
        raw: &InputValue,
        min: Option<Decimal>,
        max: Option<Decimal>,
    ) -> Decimal {
        match raw.to_decimal() {
            Err(reason) => {
                self.errors.push(format!("{field} {reason}"));
                Decimal::ZERO
            }
            Ok(value) => {
                if let Some(low) = min {
                    if value < low {
                        self.errors.push(format!("{field} must be at least {low}"));
                        return value;
                    }
                }
                if let Some(high) = max {
                    if value > high {
                        self.errors.push(format!("{field} must be at most {high}"));
                    }
                }
                value
            }
        }
    }

    fn check_integer(&mut self, field: &str, raw: &InputValue, min: Option<i64>, max: Option<i64>) -> i64 {
        match raw.to_integer() {
            Err(reason) => {
                self.errors.push(format!("{field} {reason}"));
                0
            }
            Ok(value) => {
                if let Some(low) = min {
                    if value < low {
                        self.errors.push(format!("{field} must be at least {low}"));
                        return value;
                    }
                }
                if let Some(high) = max {
                    if value > high {
                        self.errors.push(format!("{field} must be at most {high}"));
                    }
                }
                value
            }
        }
    }
}

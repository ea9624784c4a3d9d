//! Error taxonomy for the calculation engine
//!
//! Three failure classes with different propagation rules:
//! - `Validation`: user-correctable input problems, every violation listed
//! - `Configuration`: a requested code has no matching data table; surfaced
//!   to the caller like validation, with a fallback suggestion
//! - `Calculation`: an internal invariant was violated; fatal for the request

use thiserror::Error;

/// Engine-level error returned by calculators and the registry.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing, malformed, out-of-range or unknown-enum inputs.
    /// Carries every violation found in one validation pass.
    #[error("invalid input: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// No data table matches the requested code (calculator id,
    /// jurisdiction, filing status, region).
    #[error("unknown {kind} '{code}'")]
    Configuration {
        kind: &'static str,
        code: String,
        /// A known code the caller could fall back to.
        suggestion: Option<String>,
    },

    /// Internal invariant violation (non-convergent back-solve, schedule
    /// that failed to zero out). Never retried, never partially returned.
    #[error("calculation failed: {0}")]
    Calculation(String),
}

impl EngineError {
    /// Shorthand for a single-message calculation failure.
    pub fn calculation(message: impl Into<String>) -> Self {
        EngineError::Calculation(message.into())
    }

    /// Build a configuration error with a suggested fallback code.
    pub fn unknown_code(kind: &'static str, code: &str, suggestion: &str) -> Self {
        EngineError::Configuration {
            kind,
            code: code.to_string(),
            suggestion: Some(suggestion.to_string()),
        }
    }

    /// User-facing error lines for validation and configuration failures.
    /// Calculation errors return `None`: their detail stays internal.
    pub fn user_messages(&self) -> Option<Vec<String>> {
        match self {
            EngineError::Validation(errors) => Some(errors.clone()),
            EngineError::Configuration { kind, code, suggestion } => {
                let mut message = format!("unknown {kind} '{code}'");
                if let Some(fallback) = suggestion {
                    message.push_str(&format!(" (try '{fallback}')"));
                }
                Some(vec![message])
            }
            EngineError::Calculation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_message_includes_suggestion() {
        let err = EngineError::unknown_code("filing status", "widowed", "single");
        let messages = err.user_messages().unwrap();
        assert_eq!(messages, vec!["unknown filing status 'widowed' (try 'single')"]);
    }

    #[test]
    fn test_calculation_detail_not_user_facing() {
        let err = EngineError::calculation("bisection failed to converge");
        assert!(err.user_messages().is_none());
    }
}

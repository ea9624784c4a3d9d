//! Calculator contract, registry and dispatch boundary
//!
//! The registry is populated once at process start by an explicit
//! registration routine (`Registry::with_defaults`), is read-only
//! thereafter, and may be shared across arbitrarily many concurrent
//! callers. No import-time side effects, no reflection.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::result::CalculationResult;
use crate::validation::ValidationResult;

/// One declared input field of a calculator.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: &'static str, label: &'static str) -> Self {
        Self { name, label, required: true }
    }

    pub fn optional(name: &'static str, label: &'static str) -> Self {
        Self { name, label, required: false }
    }
}

/// Immutable metadata created once at registration.
#[derive(Debug, Clone, Serialize)]
pub struct CalculatorDescriptor {
    pub slug: &'static str,
    pub label: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl CalculatorDescriptor {
    pub fn new(slug: &'static str, label: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { slug, label, fields }
    }
}

/// The capability set every calculator implements.
///
/// `calculate` assumes validated inputs; implementations re-parse through
/// the same typed input struct, so a caller that skips `validate` still gets
/// the aggregated error list instead of garbage output.
pub trait Calculator: Send + Sync {
    fn descriptor(&self) -> &CalculatorDescriptor;

    /// Run every check and aggregate all violations.
    fn validate(&self, inputs: &InputSet) -> ValidationResult;

    /// Pure function over validated inputs. No side effects, no I/O.
    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError>;
}

/// Lookup table from calculator slug to implementation.
#[derive(Default)]
pub struct Registry {
    calculators: BTreeMap<&'static str, Box<dyn Calculator>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every known calculator.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::calculators::register_all(&mut registry);
        registry
    }

    /// Register a calculator at startup.
    ///
    /// # Panics
    /// On a duplicate slug. Registration happens once during single-threaded
    /// initialization; a duplicate is a configuration bug and fails fast.
    pub fn register(&mut self, calculator: Box<dyn Calculator>) {
        let slug = calculator.descriptor().slug;
        log::debug!("registering calculator '{slug}'");
        if self.calculators.insert(slug, calculator).is_some() {
            panic!("duplicate calculator slug '{slug}'");
        }
    }

    /// Resolve a calculator, or a configuration error carrying the closest
    /// registered slug as a fallback suggestion.
    pub fn get(&self, id: &str) -> Result<&dyn Calculator, EngineError> {
        match self.calculators.get(id) {
            Some(calculator) => Ok(calculator.as_ref()),
            None => Err(EngineError::Configuration {
                kind: "calculator",
                code: id.to_string(),
                suggestion: self.suggest(id),
            }),
        }
    }

    /// Lazy, restartable sequence of all registered descriptors, in stable
    /// slug order.
    pub fn list(&self) -> impl Iterator<Item = &CalculatorDescriptor> + '_ {
        self.calculators.values().map(|c| c.descriptor())
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// The registered slug sharing the longest common prefix with the
    /// requested id, falling back to the first slug.
    fn suggest(&self, id: &str) -> Option<String> {
        self.calculators
            .keys()
            .max_by_key(|slug| common_prefix_len(slug, id))
            .map(|slug| slug.to_string())
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

/// The core boundary contract consumed by the excluded web/CLI layer.
///
/// - success: the calculation result as a JSON map
/// - validation failure: `{"errors": [every violation]}`
/// - internal failure: `{"error": "<generic message>"}`, detail logged only
pub fn dispatch(registry: &Registry, id: &str, inputs: &InputSet) -> Value {
    let calculator = match registry.get(id) {
        Ok(calculator) => calculator,
        Err(err) => return error_envelope(id, err),
    };

    let validation = calculator.validate(inputs);
    if !validation.is_ok() {
        return json!({ "errors": validation.errors() });
    }

    match calculator.calculate(inputs) {
        Ok(result) => result.to_value(),
        Err(err) => error_envelope(id, err),
    }
}

fn error_envelope(id: &str, err: EngineError) -> Value {
    match err.user_messages() {
        Some(messages) => json!({ "errors": messages }),
        None => {
            log::error!("calculator '{id}': {err}");
            json!({ "error": "internal calculation error" })
        }
    }
}

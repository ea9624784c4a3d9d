//! Financial calculation engine
//!
//! A registry of financial calculators behind a single JSON boundary:
//! loans and amortization, progressive and threshold taxes, savings and
//! investment projections, small-business math and everyday arithmetic.
//! Monetary amounts are decimal end to end; floats appear only for
//! physical quantities and solved rates.
//!
//! The intended call path is `Registry::with_defaults()` once at startup,
//! then `dispatch` per request. Calculators are pure functions over their
//! inputs: same inputs, same output, no I/O.

pub mod calculators;
pub mod error;
pub mod inputs;
pub mod math;
pub mod regions;
pub mod registry;
pub mod result;
pub mod validation;

pub use error::EngineError;
pub use inputs::{InputSet, InputValue};
pub use registry::{dispatch, Calculator, CalculatorDescriptor, FieldSpec, Registry};
pub use result::CalculationResult;
pub use validation::ValidationResult;

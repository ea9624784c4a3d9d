//! Investment goal seeking: required return and time to target
//!
//! Two back-solves over the same monthly growth model. The required annual
//! return is found by bisection on the annual rate; years-to-target walks
//! the balance forward month by month. Both solvers run in f64 and fail
//! explicitly when the goal is unreachable, never by returning a bound.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, to_f64};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

const RATE_LOW: f64 = -0.99;
const RATE_HIGH: f64 = 10.0;
const MAX_ITERATIONS: u32 = 200;
const TOLERANCE: f64 = 1e-7;
/// Cap for the years-needed walk (100 years of months).
const MAX_MONTHS: u32 = 1200;

struct InvestmentInputs {
    current_value: f64,
    monthly_contribution: f64,
    target_value: f64,
    mode: String,
    years: u32,
    annual_return: f64,
}

impl InvestmentInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let current = reader.decimal("current_value", Some(Decimal::ZERO), Some(dec!(1000000000)));
        let contribution =
            reader.decimal_or("monthly_contribution", Decimal::ZERO, Some(Decimal::ZERO), None);
        let target = reader.decimal("target_value", Some(dec!(0.01)), Some(dec!(10000000000)));
        let mode = reader.code_or("mode", "required-return", &["required-return", "years-needed"]);

        let mut years = 0;
        let mut annual_return = Decimal::ZERO;
        match mode.as_str() {
            "required-return" => {
                years = reader.integer("years", Some(1), Some(100));
            }
            _ => {
                annual_return = reader.decimal("annual_return_percent", Some(dec!(-99)), Some(dec!(100)));
            }
        }

        if current == Decimal::ZERO && contribution == Decimal::ZERO {
            reader.reject("current_value and monthly_contribution cannot both be zero");
        }
        reader.finish()?;

        Ok(Self {
            current_value: to_f64(current),
            monthly_contribution: to_f64(contribution),
            target_value: to_f64(target),
            mode,
            years: years as u32,
            annual_return: to_f64(percent_to_ratio(annual_return)),
        })
    }
}

pub struct InvestmentCalculator {
    descriptor: CalculatorDescriptor,
}

impl InvestmentCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "investment-goal",
                "Investment Goal",
                vec![
                    FieldSpec::required("current_value", "Current portfolio value"),
                    FieldSpec::required("target_value", "Target value"),
                    FieldSpec::optional("mode", "required-return or years-needed"),
                    FieldSpec::optional("monthly_contribution", "Monthly contribution"),
                    FieldSpec::optional("years", "Years to target (required in required-return mode)"),
                    FieldSpec::optional(
                        "annual_return_percent",
                        "Annual return % (required in years-needed mode)",
                    ),
                ],
            ),
        }
    }
}

impl Default for InvestmentCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for InvestmentCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match InvestmentInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = InvestmentInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

/// Future value after `months` at an annual rate, contributions at month end.
fn future_value(current: f64, contribution: f64, annual_rate: f64, months: u32) -> f64 {
    let monthly = annual_rate / 12.0;
    let mut balance = current;
    for _ in 0..months {
        balance = balance * (1.0 + monthly) + contribution;
    }
    balance
}

/// Bisection on the annual rate; the future value is monotonic in rate.
fn solve_required_return(inputs: &InvestmentInputs) -> Result<f64, EngineError> {
    let months = inputs.years * 12;
    let shortfall = |rate: f64| future_value(
        inputs.current_value,
        inputs.monthly_contribution,
        rate,
        months,
    ) - inputs.target_value;

    if shortfall(0.0) >= 0.0 {
        // Contributions alone reach the target
        return Ok(0.0_f64.max(bisect(&shortfall, RATE_LOW, 0.0)?));
    }
    if shortfall(RATE_HIGH) < 0.0 {
        return Err(EngineError::calculation(
            "target is unreachable within the rate search bounds",
        ));
    }
    bisect(&shortfall, 0.0, RATE_HIGH)
}

fn bisect(f: &dyn Fn(f64) -> f64, mut low: f64, mut high: f64) -> Result<f64, EngineError> {
    if f(low) * f(high) > 0.0 {
        // No sign change: the root sits at or past a bound
        return Ok(if f(low).abs() < f(high).abs() { low } else { high });
    }
    for _ in 0..MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let value = f(mid);
        if value.abs() < TOLERANCE || (high - low) / 2.0 < TOLERANCE {
            return Ok(mid);
        }
        if value * f(low) < 0.0 {
            high = mid;
        } else {
            low = mid;
        }
    }
    Err(EngineError::calculation("rate solver did not converge"))
}

fn solve_years_needed(inputs: &InvestmentInputs) -> Result<u32, EngineError> {
    if inputs.current_value >= inputs.target_value {
        return Ok(0);
    }
    let monthly = inputs.annual_return / 12.0;
    let mut balance = inputs.current_value;
    for month in 1..=MAX_MONTHS {
        balance = balance * (1.0 + monthly) + inputs.monthly_contribution;
        if balance >= inputs.target_value {
            return Ok(month);
        }
    }
    Err(EngineError::calculation(
        "target not reached within 100 years at this return",
    ))
}

fn compute(inputs: &InvestmentInputs) -> Result<CalculationResult, EngineError> {
    let mut result = CalculationResult::new();
    result.set_text("mode", inputs.mode.clone());

    match inputs.mode.as_str() {
        "years-needed" => {
            let months = solve_years_needed(inputs)?;
            result.set_int("months_needed", months as i64);
            result.set_number("years_needed", f64::from(months) / 12.0);
        }
        _ => {
            let rate = solve_required_return(inputs)?;
            result.set_number("required_annual_return_percent", (rate * 1000000.0).round() / 10000.0);
            let end = future_value(
                inputs.current_value,
                inputs.monthly_contribution,
                rate,
                inputs.years * 12,
            );
            result.set_number("projected_value_at_rate", (end * 100.0).round() / 100.0);
            if rate == 0.0 {
                result.warn("contributions alone reach the target; no growth required");
            }
        }
    }
    Ok(result)
}

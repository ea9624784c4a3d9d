//! Compound interest with periodic contributions
//!
//! Lump-sum growth and the contribution annuity both use closed forms on
//! the per-period rate; contributions can land at the start or the end of
//! each compounding period. An inflation rate only adds a real-value view
//! of the final balance, it never changes the nominal arithmetic.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, pow_u32};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

const COMPOUNDING: &[(&str, u32)] =
    &[("annually", 1), ("quarterly", 4), ("monthly", 12), ("daily", 365)];

struct CompoundInputs {
    principal: Decimal,
    annual_rate: Decimal,
    years: u32,
    periods_per_year: u32,
    contribution: Decimal,
    contribute_at_start: bool,
    inflation_rate: Option<Decimal>,
}

impl CompoundInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let principal = reader.decimal("principal", Some(Decimal::ZERO), Some(dec!(1000000000)));
        let annual_rate = reader.decimal("annual_rate", Some(Decimal::ZERO), Some(dec!(100)));
        let years = reader.integer("years", Some(1), Some(100));
        let frequency_codes: Vec<&str> = COMPOUNDING.iter().map(|(name, _)| *name).collect();
        let frequency = reader.code_or("compounding", "monthly", &frequency_codes);
        let contribution =
            reader.decimal_or("periodic_contribution", Decimal::ZERO, Some(Decimal::ZERO), None);
        let timing = reader.code_or("contribution_timing", "end", &["start", "end"]);
        let inflation = if reader.has("inflation_rate") {
            Some(reader.decimal("inflation_rate", Some(Decimal::ZERO), Some(dec!(100))))
        } else {
            None
        };
        reader.finish()?;

        let periods_per_year = COMPOUNDING
            .iter()
            .find(|(name, _)| *name == frequency)
            .map(|(_, n)| *n)
            .unwrap_or(12);

        Ok(Self {
            principal,
            annual_rate: percent_to_ratio(annual_rate),
            years: years as u32,
            periods_per_year,
            contribution,
            contribute_at_start: timing == "start",
            inflation_rate: inflation.map(percent_to_ratio),
        })
    }
}

pub struct CompoundCalculator {
    descriptor: CalculatorDescriptor,
}

impl CompoundCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "compound-interest",
                "Compound Interest",
                vec![
                    FieldSpec::required("principal", "Starting principal"),
                    FieldSpec::required("annual_rate", "Annual interest rate (%)"),
                    FieldSpec::required("years", "Years"),
                    FieldSpec::optional("compounding", "Compounding frequency"),
                    FieldSpec::optional("periodic_contribution", "Contribution per period"),
                    FieldSpec::optional("contribution_timing", "start or end of period"),
                    FieldSpec::optional("inflation_rate", "Annual inflation rate (%)"),
                ],
            ),
        }
    }
}

impl Default for CompoundCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for CompoundCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match CompoundInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = CompoundInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

/// Future value of a level contribution stream at a per-period rate.
pub(crate) fn annuity_future_value(
    contribution: Decimal,
    rate: Decimal,
    periods: u32,
    at_start: bool,
) -> Result<Decimal, EngineError> {
    if contribution.is_zero() || periods == 0 {
        return Ok(Decimal::ZERO);
    }
    if rate.is_zero() {
        return Ok(contribution * Decimal::from(periods));
    }
    let factor = pow_u32(Decimal::ONE + rate, periods)?;
    let mut value = contribution * (factor - Decimal::ONE) / rate;
    if at_start {
        value *= Decimal::ONE + rate;
    }
    Ok(value)
}

fn compute(inputs: &CompoundInputs) -> Result<CalculationResult, EngineError> {
    let periods = inputs.periods_per_year * inputs.years;
    let rate = inputs.annual_rate / Decimal::from(inputs.periods_per_year);

    let growth = pow_u32(Decimal::ONE + rate, periods)?;
    let lump_sum = inputs.principal * growth;
    let contributed = annuity_future_value(inputs.contribution, rate, periods, inputs.contribute_at_start)?;

    let final_balance = lump_sum + contributed;
    let total_contributions = inputs.principal + inputs.contribution * Decimal::from(periods);
    let interest_earned = final_balance - total_contributions;

    let mut result = CalculationResult::new();
    result.set_money("final_balance", final_balance);
    result.set_money("total_contributions", total_contributions);
    result.set_money("interest_earned", interest_earned);
    result.set_int("compounding_periods", periods as i64);

    if let Some(inflation) = inputs.inflation_rate {
        let deflator = pow_u32(Decimal::ONE + inflation, inputs.years)?;
        let real = final_balance
            .checked_div(deflator)
            .ok_or_else(|| EngineError::calculation("degenerate inflation deflator"))?;
        result.set_money("real_final_balance", real);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(json: serde_json::Value) -> InputSet {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_annual_compounding_doubles_roughly_per_rule_of_72() {
        let calc = CompoundCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "principal": 10000,
                "annual_rate": 7.2,
                "years": 10,
                "compounding": "annually",
            })))
            .unwrap();

        let balance = result.get("final_balance").unwrap().as_f64().unwrap();
        assert!((balance - 20042.32).abs() < 0.02);
    }

    #[test]
    fn test_monthly_compounding_beats_annual() {
        let calc = CompoundCalculator::new();
        let annual = calc
            .calculate(&inputs(serde_json::json!({
                "principal": 10000, "annual_rate": 6, "years": 5, "compounding": "annually",
            })))
            .unwrap();
        let monthly = calc
            .calculate(&inputs(serde_json::json!({
                "principal": 10000, "annual_rate": 6, "years": 5, "compounding": "monthly",
            })))
            .unwrap();

        let a = annual.get("final_balance").unwrap().as_f64().unwrap();
        let m = monthly.get("final_balance").unwrap().as_f64().unwrap();
        assert!(m > a);
    }

    #[test]
    fn test_start_of_period_contributions_earn_more() {
        let calc = CompoundCalculator::new();
        let base = serde_json::json!({
            "principal": 0,
            "annual_rate": 6,
            "years": 10,
            "periodic_contribution": 500,
        });

        let mut start = base.clone();
        start["contribution_timing"] = serde_json::json!("start");
        let end_result = calc.calculate(&inputs(base)).unwrap();
        let start_result = calc.calculate(&inputs(start)).unwrap();

        let end_balance = end_result.get("final_balance").unwrap().as_f64().unwrap();
        let start_balance = start_result.get("final_balance").unwrap().as_f64().unwrap();
        assert!(start_balance > end_balance);

        // Start timing is exactly one extra period of growth
        assert!((start_balance - end_balance * (1.0 + 0.06 / 12.0)).abs() < 0.01);
    }

    #[test]
    fn test_zero_rate_is_plain_accumulation() {
        let calc = CompoundCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "principal": 1000,
                "annual_rate": 0,
                "years": 2,
                "periodic_contribution": 100,
            })))
            .unwrap();

        // 1,000 + 24 * 100
        assert_eq!(result.get("final_balance").unwrap(), &serde_json::json!(3400.0));
        assert_eq!(result.get("interest_earned").unwrap(), &serde_json::json!(0.0));
    }

    #[test]
    fn test_inflation_only_adds_real_view() {
        let calc = CompoundCalculator::new();
        let nominal = calc
            .calculate(&inputs(serde_json::json!({
                "principal": 10000, "annual_rate": 7, "years": 10,
            })))
            .unwrap();
        let with_inflation = calc
            .calculate(&inputs(serde_json::json!({
                "principal": 10000, "annual_rate": 7, "years": 10, "inflation_rate": 3,
            })))
            .unwrap();

        assert_eq!(
            nominal.get("final_balance").unwrap(),
            with_inflation.get("final_balance").unwrap()
        );
        let real = with_inflation.get("real_final_balance").unwrap().as_f64().unwrap();
        let nominal_balance = nominal.get("final_balance").unwrap().as_f64().unwrap();
        assert!(real < nominal_balance);
    }
}

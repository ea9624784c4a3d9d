//! Systematic investment plan with annual step-up
//!
//! Month-by-month accumulation. The contribution for month `m` (1-based)
//! uses the step-up factor for year `(m - 1) / 12`, so the increase lands
//! exactly at each year boundary and never mid-year.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct SipInputs {
    monthly_investment: Decimal,
    monthly_rate: Decimal,
    years: u32,
    step_up: Decimal,
}

impl SipInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let monthly = reader.decimal("monthly_investment", Some(dec!(0.01)), Some(dec!(100000000)));
        let annual_rate = reader.decimal("annual_return_percent", Some(Decimal::ZERO), Some(dec!(100)));
        let years = reader.integer("years", Some(1), Some(100));
        let step_up = reader.decimal_or("annual_step_up_percent", Decimal::ZERO, Some(Decimal::ZERO), Some(dec!(100)));
        reader.finish()?;

        Ok(Self {
            monthly_investment: monthly,
            monthly_rate: percent_to_ratio(annual_rate) / dec!(12),
            years: years as u32,
            step_up: percent_to_ratio(step_up),
        })
    }
}

pub struct SipCalculator {
    descriptor: CalculatorDescriptor,
}

impl SipCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "sip",
                "Systematic Investment Plan",
                vec![
                    FieldSpec::required("monthly_investment", "Monthly investment"),
                    FieldSpec::required("annual_return_percent", "Expected annual return (%)"),
                    FieldSpec::required("years", "Investment horizon (years)"),
                    FieldSpec::optional("annual_step_up_percent", "Annual contribution step-up (%)"),
                ],
            ),
        }
    }
}

impl Default for SipCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for SipCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match SipInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = SipInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &SipInputs) -> Result<CalculationResult, EngineError> {
    let months = inputs.years * 12;
    let mut balance = Decimal::ZERO;
    let mut invested = Decimal::ZERO;
    let mut contribution = inputs.monthly_investment;
    let mut current_year = 0u32;

    for month in 1..=months {
        let year = (month - 1) / 12;
        if year != current_year {
            // Step-up applies from the first month of each new year
            contribution = round_money(contribution * (Decimal::ONE + inputs.step_up));
            current_year = year;
        }
        balance = balance * (Decimal::ONE + inputs.monthly_rate) + contribution;
        invested += contribution;
    }

    let mut result = CalculationResult::new();
    result.set_money("final_value", balance);
    result.set_money("total_invested", invested);
    result.set_money("wealth_gained", balance - invested);
    result.set_money("final_monthly_contribution", contribution);
    if invested > Decimal::ZERO {
        result.set_rate("gain_percent", (balance - invested) / invested * dec!(100), 2);
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
    fn test_flat_sip_matches_annuity_form() {
        let calc = SipCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "monthly_investment": 500,
                "annual_return_percent": 12,
                "years": 10,
            })))
            .unwrap();

        // 500/month at 1% monthly over 120 months: 500 * ((1.01^120 - 1)/0.01)
        let value = result.get("final_value").unwrap().as_f64().unwrap();
        assert!((value - 115019.34).abs() < 0.05, "got {value}");
        assert_eq!(result.get("total_invested").unwrap(), &serde_json::json!(60000.0));
    }

    #[test]
    fn test_step_up_applies_at_year_boundaries_only() {
        let calc = SipCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "monthly_investment": 1000,
                "annual_return_percent": 0,
                "years": 3,
                "annual_step_up_percent": 10,
            })))
            .unwrap();

        // Year 1: 12,000; year 2: 13,200; year 3: 14,520
        assert_eq!(result.get("total_invested").unwrap(), &serde_json::json!(39720.0));
        assert_eq!(
            result.get("final_monthly_contribution").unwrap(),
            &serde_json::json!(1210.0)
        );
    }

    #[test]
    fn test_step_up_grows_final_value() {
        let calc = SipCalculator::new();
        let flat = calc
            .calculate(&inputs(serde_json::json!({
                "monthly_investment": 500, "annual_return_percent": 8, "years": 15,
            })))
            .unwrap();
        let stepped = calc
            .calculate(&inputs(serde_json::json!({
                "monthly_investment": 500, "annual_return_percent": 8, "years": 15,
                "annual_step_up_percent": 5,
            })))
            .unwrap();

        let flat_value = flat.get("final_value").unwrap().as_f64().unwrap();
        let stepped_value = stepped.get("final_value").unwrap().as_f64().unwrap();
        assert!(stepped_value > flat_value);
    }
}

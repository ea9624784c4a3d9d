//! Freelance rate: gross revenue and hourly rate for a net income target
//!
//! Works backwards from take-home pay: gross revenue must cover expenses
//! and taxes, so `gross = (net + expenses) / (1 - tax_rate)`. A tax rate at
//! or above 100% or a zero-hour schedule makes the target unreachable and
//! is rejected during validation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct FreelanceInputs {
    desired_net: Decimal,
    annual_expenses: Decimal,
    tax_rate: Decimal,
    hours_per_week: Decimal,
    working_weeks: Decimal,
    profit_margin: Decimal,
}

impl FreelanceInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let net = reader.decimal("desired_annual_net", Some(dec!(0.01)), Some(dec!(100000000)));
        let expenses = reader.decimal_or("annual_expenses", Decimal::ZERO, Some(Decimal::ZERO), None);
        // 100% is excluded: the rate divisor must stay positive
        let tax_rate = reader.decimal("tax_rate_percent", Some(Decimal::ZERO), Some(dec!(99.99)));
        let hours = reader.decimal("billable_hours_per_week", Some(dec!(0.1)), Some(dec!(100)));
        let weeks = reader.decimal_or("working_weeks", dec!(48), Some(dec!(1)), Some(dec!(52)));
        let margin = reader.decimal_or("profit_margin_percent", Decimal::ZERO, Some(Decimal::ZERO), Some(dec!(100)));
        reader.finish()?;

        Ok(Self {
            desired_net: net,
            annual_expenses: expenses,
            tax_rate: percent_to_ratio(tax_rate),
            hours_per_week: hours,
            working_weeks: weeks,
            profit_margin: percent_to_ratio(margin),
        })
    }
}

pub struct FreelanceCalculator {
    descriptor: CalculatorDescriptor,
}

impl FreelanceCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "freelance-rate",
                "Freelance Rate",
                vec![
                    FieldSpec::required("desired_annual_net", "Desired annual net income"),
                    FieldSpec::required("tax_rate_percent", "Effective tax rate (%)"),
                    FieldSpec::required("billable_hours_per_week", "Billable hours per week"),
                    FieldSpec::optional("annual_expenses", "Annual business expenses"),
                    FieldSpec::optional("working_weeks", "Working weeks per year"),
                    FieldSpec::optional("profit_margin_percent", "Profit margin on the base rate (%)"),
                ],
            ),
        }
    }
}

impl Default for FreelanceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for FreelanceCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match FreelanceInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = FreelanceInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &FreelanceInputs) -> Result<CalculationResult, EngineError> {
    let divisor = Decimal::ONE - inputs.tax_rate;
    let gross = (inputs.desired_net + inputs.annual_expenses)
        .checked_div(divisor)
        .ok_or_else(|| EngineError::calculation("degenerate tax rate divisor"))?;

    let billable_hours = inputs.hours_per_week * inputs.working_weeks;
    let hourly = gross
        .checked_div(billable_hours)
        .ok_or_else(|| EngineError::calculation("zero billable hours"))?;
    let taxes = gross * inputs.tax_rate;

    let mut result = CalculationResult::new();
    result.set_money("required_gross_revenue", gross);
    result.set_money("estimated_taxes", taxes);
    result.set_money("annual_expenses", inputs.annual_expenses);
    result.set_number("annual_billable_hours", crate::math::to_f64(billable_hours));
    result.set_money("hourly_rate", hourly);
    result.set_money(
        "recommended_hourly_rate",
        hourly * (Decimal::ONE + inputs.profit_margin),
    );
    result.set_money("day_rate", round_money(hourly * dec!(8)));
    result.set_money("monthly_revenue_target", gross / dec!(12));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(json: serde_json::Value) -> InputSet {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_gross_covers_net_expenses_and_taxes() {
        let calc = FreelanceCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "desired_annual_net": 70000,
                "annual_expenses": 5000,
                "tax_rate_percent": 25,
                "billable_hours_per_week": 25,
                "working_weeks": 48,
            })))
            .unwrap();

        // (70,000 + 5,000) / 0.75 = 100,000
        assert_eq!(result.get("required_gross_revenue").unwrap(), &serde_json::json!(100000.0));
        assert_eq!(result.get("estimated_taxes").unwrap(), &serde_json::json!(25000.0));
        // 100,000 / (25 * 48) = 83.33
        assert_eq!(result.get("hourly_rate").unwrap(), &serde_json::json!(83.33));
    }

    #[test]
    fn test_profit_margin_marks_up_the_rate() {
        let calc = FreelanceCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "desired_annual_net": 70000,
                "annual_expenses": 5000,
                "tax_rate_percent": 25,
                "billable_hours_per_week": 25,
                "working_weeks": 48,
                "profit_margin_percent": 20,
            })))
            .unwrap();

        // 83.333... * 1.20 = 100.00
        assert_eq!(result.get("recommended_hourly_rate").unwrap(), &serde_json::json!(100.0));
    }

    #[test]
    fn test_gross_consistency() {
        let calc = FreelanceCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "desired_annual_net": 60000,
                "tax_rate_percent": 30,
                "billable_hours_per_week": 30,
            })))
            .unwrap();

        // gross - taxes - expenses recovers the net target
        let gross = result.get("required_gross_revenue").unwrap().as_f64().unwrap();
        let taxes = result.get("estimated_taxes").unwrap().as_f64().unwrap();
        assert!((gross - taxes - 60000.0).abs() < 0.01);
    }

    #[test]
    fn test_tax_rate_of_100_percent_rejected() {
        let calc = FreelanceCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "desired_annual_net": 50000,
            "tax_rate_percent": 100,
            "billable_hours_per_week": 20,
        })));
        assert!(!validation.is_ok());
        assert!(validation.errors()[0].contains("tax_rate_percent"));
    }

    #[test]
    fn test_zero_hours_rejected() {
        let calc = FreelanceCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "desired_annual_net": 50000,
            "tax_rate_percent": 25,
            "billable_hours_per_week": 0,
        })));
        assert!(!validation.is_ok());
        assert!(validation.errors()[0].contains("billable_hours_per_week"));
    }
}

//! Break-even analysis
//!
//! Break-even units are fixed costs over the contribution margin. A price
//! at or below variable cost has no margin and is rejected up front as an
//! input problem, not reported as infinity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{round_money, to_f64};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct BreakevenInputs {
    fixed_costs: Decimal,
    price_per_unit: Decimal,
    variable_cost_per_unit: Decimal,
    target_profit: Decimal,
}

impl BreakevenInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let fixed = reader.decimal("fixed_costs", Some(Decimal::ZERO), Some(dec!(1000000000)));
        let price = reader.decimal("price_per_unit", Some(dec!(0.01)), None);
        let variable = reader.decimal("variable_cost_per_unit", Some(Decimal::ZERO), None);
        let target = reader.decimal_or("target_profit", Decimal::ZERO, Some(Decimal::ZERO), None);

        if price <= variable && price > Decimal::ZERO {
            reader.reject("price_per_unit must exceed variable_cost_per_unit");
        }
        reader.finish()?;

        Ok(Self {
            fixed_costs: fixed,
            price_per_unit: price,
            variable_cost_per_unit: variable,
            target_profit: target,
        })
    }
}

pub struct BreakevenCalculator {
    descriptor: CalculatorDescriptor,
}

impl BreakevenCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "breakeven",
                "Break-Even Analysis",
                vec![
                    FieldSpec::required("fixed_costs", "Fixed costs"),
                    FieldSpec::required("price_per_unit", "Price per unit"),
                    FieldSpec::required("variable_cost_per_unit", "Variable cost per unit"),
                    FieldSpec::optional("target_profit", "Target profit"),
                ],
            ),
        }
    }
}

impl Default for BreakevenCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for BreakevenCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match BreakevenInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = BreakevenInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &BreakevenInputs) -> Result<CalculationResult, EngineError> {
    let margin = inputs.price_per_unit - inputs.variable_cost_per_unit;
    let margin_ratio = margin
        .checked_div(inputs.price_per_unit)
        .ok_or_else(|| EngineError::calculation("degenerate unit price"))?;

    let exact_units = (inputs.fixed_costs + inputs.target_profit)
        .checked_div(margin)
        .ok_or_else(|| EngineError::calculation("zero contribution margin"))?;
    // Whole units: partial units do not cover the last dollar of cost
    let units = exact_units.ceil();
    let revenue = units * inputs.price_per_unit;

    let mut result = CalculationResult::new();
    result.set_money("contribution_margin_per_unit", margin);
    result.set_rate("contribution_margin_percent", margin_ratio * dec!(100), 2);
    result.set_number("breakeven_units_exact", to_f64(exact_units));
    result.set_int("breakeven_units", to_f64(units) as i64);
    result.set_money("breakeven_revenue", revenue);
    if inputs.target_profit > Decimal::ZERO {
        result.set_money(
            "profit_at_breakeven_units",
            round_money(units * margin - inputs.fixed_costs),
        );
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
    fn test_breakeven_units_and_revenue() {
        let calc = BreakevenCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "fixed_costs": 50000,
                "price_per_unit": 25,
                "variable_cost_per_unit": 15,
            })))
            .unwrap();

        assert_eq!(result.get("breakeven_units").unwrap(), &serde_json::json!(5000));
        assert_eq!(result.get("breakeven_revenue").unwrap(), &serde_json::json!(125000.0));
        assert_eq!(
            result.get("contribution_margin_per_unit").unwrap(),
            &serde_json::json!(10.0)
        );
        assert_eq!(
            result.get("contribution_margin_percent").unwrap(),
            &serde_json::json!(40.0)
        );
    }

    #[test]
    fn test_fractional_breakeven_rounds_up() {
        let calc = BreakevenCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "fixed_costs": 1000,
                "price_per_unit": 9.99,
                "variable_cost_per_unit": 3.49,
            })))
            .unwrap();

        // 1000 / 6.50 = 153.846...; selling 153 still loses money
        let exact = result.get("breakeven_units_exact").unwrap().as_f64().unwrap();
        assert!((exact - 153.846).abs() < 0.01);
        assert_eq!(result.get("breakeven_units").unwrap(), &serde_json::json!(154));
    }

    #[test]
    fn test_target_profit_adds_units() {
        let calc = BreakevenCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "fixed_costs": 50000,
                "price_per_unit": 25,
                "variable_cost_per_unit": 15,
                "target_profit": 20000,
            })))
            .unwrap();

        assert_eq!(result.get("breakeven_units").unwrap(), &serde_json::json!(7000));
    }

    #[test]
    fn test_price_at_variable_cost_rejected() {
        let calc = BreakevenCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "fixed_costs": 1000,
            "price_per_unit": 10,
            "variable_cost_per_unit": 10,
        })));
        assert!(!validation.is_ok());
        assert!(validation.errors()[0].contains("price_per_unit"));
    }

    #[test]
    fn test_price_below_variable_cost_rejected() {
        let calc = BreakevenCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "fixed_costs": 1000,
            "price_per_unit": 8,
            "variable_cost_per_unit": 10,
        })));
        assert!(!validation.is_ok());
    }
}

//! Auto financing: loan vs. lease comparison
//!
//! Loan cost uses the shared amortization payment on the financed amount.
//! Lease cost is depreciation plus financed interest (money factor), not
//! full-principal amortization. Mileage-overage and wear-and-tear are
//! modeled as flat per-unit charges applied only at term end.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculators::loan::periodic_payment;
use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct AutoInputs {
    vehicle_price: Decimal,
    down_payment: Decimal,
    monthly_rate: Decimal,
    term_months: u32,
    residual_value: Decimal,
    money_factor: Decimal,
    miles_over: Decimal,
    per_mile_charge: Decimal,
    wear_charges: Decimal,
}

impl AutoInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let price = reader.decimal("vehicle_price", Some(dec!(0.01)), Some(dec!(10000000)));
        let down = reader.decimal_or("down_payment", Decimal::ZERO, Some(Decimal::ZERO), None);
        let annual_rate = reader.decimal("annual_rate", Some(Decimal::ZERO), Some(dec!(100)));
        let term = reader.integer("term_months", Some(1), Some(120));
        let residual = reader.decimal("residual_value", Some(Decimal::ZERO), None);
        // Lease convention: money factor ~= APR / 2400
        let default_mf = percent_to_ratio(annual_rate) / dec!(24);
        let money_factor = reader.decimal_or("money_factor", default_mf, Some(Decimal::ZERO), Some(dec!(1)));
        let miles_over = reader.decimal_or("expected_miles_over", Decimal::ZERO, Some(Decimal::ZERO), None);
        let per_mile = reader.decimal_or("per_mile_charge", dec!(0.25), Some(Decimal::ZERO), None);
        let wear = reader.decimal_or("wear_charges", Decimal::ZERO, Some(Decimal::ZERO), None);

        if residual >= price && price > Decimal::ZERO {
            reader.reject("residual_value must be less than vehicle_price");
        }
        if down >= price && price > Decimal::ZERO {
            reader.reject("down_payment must be less than vehicle_price");
        }
        reader.finish()?;

        Ok(Self {
            vehicle_price: price,
            down_payment: down,
            monthly_rate: percent_to_ratio(annual_rate) / dec!(12),
            term_months: term as u32,
            residual_value: residual,
            money_factor,
            miles_over,
            per_mile_charge: per_mile,
            wear_charges: wear,
        })
    }
}

pub struct AutoCalculator {
    descriptor: CalculatorDescriptor,
}

impl AutoCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "auto-lease",
                "Auto Loan vs. Lease",
                vec![
                    FieldSpec::required("vehicle_price", "Vehicle price"),
                    FieldSpec::required("annual_rate", "Annual interest rate (%)"),
                    FieldSpec::required("term_months", "Term (months)"),
                    FieldSpec::required("residual_value", "Lease residual value"),
                    FieldSpec::optional("down_payment", "Down payment"),
                    FieldSpec::optional("money_factor", "Lease money factor"),
                    FieldSpec::optional("expected_miles_over", "Expected miles over allowance"),
                    FieldSpec::optional("per_mile_charge", "Overage charge per mile"),
                    FieldSpec::optional("wear_charges", "Wear-and-tear charges"),
                ],
            ),
        }
    }
}

impl Default for AutoCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for AutoCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match AutoInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = AutoInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &AutoInputs) -> Result<CalculationResult, EngineError> {
    let term = Decimal::from(inputs.term_months);

    // Loan side: finance the full price net of down payment
    let financed = inputs.vehicle_price - inputs.down_payment;
    let loan_payment = round_money(periodic_payment(financed, inputs.monthly_rate, inputs.term_months)?);
    let loan_total = inputs.down_payment + loan_payment * term;

    // Lease side: pay only depreciation plus the money-factor fee
    let capitalized_cost = inputs.vehicle_price - inputs.down_payment;
    let monthly_depreciation = (capitalized_cost - inputs.residual_value) / term;
    let monthly_finance_fee = (capitalized_cost + inputs.residual_value) * inputs.money_factor;
    let lease_payment = round_money(monthly_depreciation + monthly_finance_fee);

    let end_of_term_charges = round_money(inputs.miles_over * inputs.per_mile_charge + inputs.wear_charges);
    let lease_total = inputs.down_payment + lease_payment * term + end_of_term_charges;

    let mut result = CalculationResult::new();
    result.set_money("loan_monthly_payment", loan_payment);
    result.set_money("loan_total_cost", loan_total);
    result.set_money("lease_monthly_payment", lease_payment);
    result.set_money("lease_end_of_term_charges", end_of_term_charges);
    result.set_money("lease_total_cost", lease_total);
    result.set_money("monthly_difference", loan_payment - lease_payment);
    result.set_money("total_difference", loan_total - lease_total);
    result.set_text(
        "lower_monthly_option",
        if lease_payment <= loan_payment { "lease" } else { "loan" },
    );
    // The loan buyer keeps the vehicle; compare total outlay net of that value
    result.set_money("loan_cost_net_of_vehicle", loan_total - inputs.residual_value);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(json: serde_json::Value) -> InputSet {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_lease_payment_is_depreciation_plus_fee() {
        let calc = AutoCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "vehicle_price": 36000,
                "down_payment": 2000,
                "annual_rate": 6.0,
                "term_months": 36,
                "residual_value": 20000,
                "money_factor": 0.0025,
            })))
            .unwrap();

        // Depreciation: (34000 - 20000)/36 = 388.89; fee: 54000 * 0.0025 = 135
        assert_eq!(result.get("lease_monthly_payment").unwrap(), &serde_json::json!(523.89));

        // Lease payment is well below the full-principal loan payment
        let loan = result.get("loan_monthly_payment").unwrap().as_f64().unwrap();
        assert!(loan > 1000.0);
        assert_eq!(result.get("lower_monthly_option").unwrap(), &serde_json::json!("lease"));
    }

    #[test]
    fn test_mileage_overage_charged_at_term_end() {
        let calc = AutoCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "vehicle_price": 30000,
                "annual_rate": 5.0,
                "term_months": 36,
                "residual_value": 17000,
                "expected_miles_over": 4000,
                "per_mile_charge": 0.25,
                "wear_charges": 300,
            })))
            .unwrap();

        assert_eq!(
            result.get("lease_end_of_term_charges").unwrap(),
            &serde_json::json!(1300.0)
        );
    }

    #[test]
    fn test_residual_must_be_below_price() {
        let calc = AutoCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "vehicle_price": 20000,
            "annual_rate": 5.0,
            "term_months": 36,
            "residual_value": 25000,
        })));
        assert!(!validation.is_ok());
    }
}

//! Mortgage calculator: full PITI payment with PMI and HOA
//!
//! Principal & interest from the shared amortization engine, plus monthly
//! shares of property tax and homeowners insurance, PMI while the loan is
//! above 80% of the purchase price, and HOA dues.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculators::loan::{amortization_schedule, periodic_payment, schedule_sample};
use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

/// PMI applies while loan-to-value exceeds this ratio.
const PMI_LTV_CUTOFF: Decimal = dec!(0.80);

struct MortgageInputs {
    home_price: Decimal,
    down_payment: Decimal,
    monthly_rate: Decimal,
    months: u32,
    property_tax_annual: Decimal,
    insurance_annual: Decimal,
    pmi_rate: Decimal,
    hoa_monthly: Decimal,
}

impl MortgageInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let home_price = reader.decimal("home_price", Some(dec!(0.01)), Some(dec!(1000000000)));
        let down_payment = reader.decimal("down_payment", Some(Decimal::ZERO), None);
        let annual_rate = reader.decimal("annual_rate", Some(Decimal::ZERO), Some(dec!(100)));
        let years = reader.integer("term_years", Some(1), Some(100));
        let property_tax = reader.decimal_or("property_tax_annual", Decimal::ZERO, Some(Decimal::ZERO), None);
        let insurance = reader.decimal_or("insurance_annual", Decimal::ZERO, Some(Decimal::ZERO), None);
        let pmi_rate = reader.decimal_or("pmi_annual_rate", dec!(0.5), Some(Decimal::ZERO), Some(dec!(5)));
        let hoa = reader.decimal_or("hoa_monthly", Decimal::ZERO, Some(Decimal::ZERO), None);

        if down_payment >= home_price && home_price > Decimal::ZERO {
            reader.reject("down_payment must be less than home_price");
        }
        reader.finish()?;

        Ok(Self {
            home_price,
            down_payment,
            monthly_rate: percent_to_ratio(annual_rate) / dec!(12),
            months: (years as u32) * 12,
            property_tax_annual: property_tax,
            insurance_annual: insurance,
            pmi_rate: percent_to_ratio(pmi_rate),
            hoa_monthly: hoa,
        })
    }
}

pub struct MortgageCalculator {
    descriptor: CalculatorDescriptor,
}

impl MortgageCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "mortgage",
                "Mortgage Payment (PITI)",
                vec![
                    FieldSpec::required("home_price", "Home price"),
                    FieldSpec::required("down_payment", "Down payment"),
                    FieldSpec::required("annual_rate", "Annual interest rate (%)"),
                    FieldSpec::required("term_years", "Term (years)"),
                    FieldSpec::optional("property_tax_annual", "Annual property tax"),
                    FieldSpec::optional("insurance_annual", "Annual homeowners insurance"),
                    FieldSpec::optional("pmi_annual_rate", "PMI annual rate (%)"),
                    FieldSpec::optional("hoa_monthly", "Monthly HOA dues"),
                ],
            ),
        }
    }
}

impl Default for MortgageCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for MortgageCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match MortgageInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = MortgageInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &MortgageInputs) -> Result<CalculationResult, EngineError> {
    let loan_amount = inputs.home_price - inputs.down_payment;
    let payment = round_money(periodic_payment(loan_amount, inputs.monthly_rate, inputs.months)?);
    let schedule = amortization_schedule(loan_amount, inputs.monthly_rate, inputs.months, payment)?;

    let ltv = loan_amount / inputs.home_price;
    let pmi_monthly = if ltv > PMI_LTV_CUTOFF {
        round_money(loan_amount * inputs.pmi_rate / dec!(12))
    } else {
        Decimal::ZERO
    };

    // Month after which the balance first reaches 80% of the purchase price
    let pmi_months = if pmi_monthly > Decimal::ZERO {
        let cutoff = inputs.home_price * PMI_LTV_CUTOFF;
        schedule
            .iter()
            .find(|row| row.balance <= cutoff)
            .map(|row| row.period as i64)
            .unwrap_or(schedule.len() as i64)
    } else {
        0
    };

    let tax_monthly = round_money(inputs.property_tax_annual / dec!(12));
    let insurance_monthly = round_money(inputs.insurance_annual / dec!(12));
    let total_monthly = payment + tax_monthly + insurance_monthly + pmi_monthly + inputs.hoa_monthly;
    let total_interest: Decimal = schedule.iter().map(|row| row.interest).sum();

    let mut result = CalculationResult::new();
    result.set_money("loan_amount", loan_amount);
    result.set_rate("loan_to_value_percent", ltv * dec!(100), 2);
    result.set_money("monthly_principal_interest", payment);
    result.set_money("monthly_property_tax", tax_monthly);
    result.set_money("monthly_insurance", insurance_monthly);
    result.set_money("monthly_pmi", pmi_monthly);
    result.set_money("monthly_hoa", inputs.hoa_monthly);
    result.set_money("total_monthly_payment", total_monthly);
    result.set_money("total_interest", total_interest);
    result.set_int("pmi_months", pmi_months);
    result.set_rows("amortization_sample", &schedule_sample(&schedule));

    if pmi_monthly > Decimal::ZERO {
        result.warn("down payment below 20%: PMI applies until the balance reaches 80% of the purchase price");
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
    fn test_piti_composition() {
        let calc = MortgageCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "home_price": 400000,
                "down_payment": 80000,
                "annual_rate": 6.0,
                "term_years": 30,
                "property_tax_annual": 4800,
                "insurance_annual": 1200,
                "hoa_monthly": 50,
            })))
            .unwrap();

        // 20% down: no PMI
        assert_eq!(result.get("monthly_pmi").unwrap(), &serde_json::json!(0.0));
        assert_eq!(result.get("monthly_property_tax").unwrap(), &serde_json::json!(400.0));
        assert_eq!(result.get("monthly_insurance").unwrap(), &serde_json::json!(100.0));

        let pi = result.get("monthly_principal_interest").unwrap().as_f64().unwrap();
        let total = result.get("total_monthly_payment").unwrap().as_f64().unwrap();
        assert!((total - (pi + 400.0 + 100.0 + 50.0)).abs() < 0.01);
    }

    #[test]
    fn test_pmi_applies_below_20_percent_down() {
        let calc = MortgageCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "home_price": 300000,
                "down_payment": 15000,
                "annual_rate": 6.5,
                "term_years": 30,
            })))
            .unwrap();

        // 285,000 * 0.5% / 12 = 118.75
        assert_eq!(result.get("monthly_pmi").unwrap(), &serde_json::json!(118.75));
        assert!(result.get("pmi_months").unwrap().as_i64().unwrap() > 0);
        assert_eq!(result.warnings().len(), 1);
    }

    #[test]
    fn test_down_payment_must_be_below_price() {
        let calc = MortgageCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "home_price": 200000,
            "down_payment": 250000,
            "annual_rate": 6.0,
            "term_years": 30,
        })));
        assert!(!validation.is_ok());
        assert!(validation.errors()[0].contains("down_payment"));
    }
}

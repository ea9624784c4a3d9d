//! Take-home paycheck: federal income tax plus payroll taxes per pay period
//!
//! Income tax applies after pre-tax deductions and the standard deduction.
//! Payroll taxes follow the region's payroll rules, including which wage
//! base they use; under US FICA pre-tax retirement deferrals do not reduce
//! Social Security wages.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::round_money;
use crate::regions::{FilingStatus, IncomeTaxTables, PayrollRules};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

const FREQUENCIES: &[(&str, u32)] =
    &[("weekly", 52), ("biweekly", 26), ("semimonthly", 24), ("monthly", 12)];

fn periods_per_year(code: &str) -> u32 {
    FREQUENCIES
        .iter()
        .find(|(name, _)| *name == code)
        .map(|(_, n)| *n)
        .unwrap_or(26)
}

struct PaycheckInputs {
    gross_annual: Decimal,
    status: FilingStatus,
    periods: u32,
    pre_tax_annual: Decimal,
    post_tax_annual: Decimal,
}

impl PaycheckInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let gross = reader.decimal("gross_annual_salary", Some(dec!(0.01)), Some(dec!(100000000)));
        let status_code = reader.code_or("filing_status", "single", &FilingStatus::CODES);
        let frequency_codes: Vec<&str> = FREQUENCIES.iter().map(|(name, _)| *name).collect();
        let frequency = reader.code_or("pay_frequency", "biweekly", &frequency_codes);
        let pretax = reader.decimal_or("pre_tax_deductions_annual", Decimal::ZERO, Some(Decimal::ZERO), None);
        let posttax = reader.decimal_or("post_tax_deductions_annual", Decimal::ZERO, Some(Decimal::ZERO), None);

        if pretax >= gross && gross > Decimal::ZERO {
            reader.reject("pre_tax_deductions_annual must be less than gross_annual_salary");
        }
        reader.finish()?;

        Ok(Self {
            gross_annual: gross,
            status: FilingStatus::parse(&status_code).unwrap_or(FilingStatus::Single),
            periods: periods_per_year(&frequency),
            pre_tax_annual: pretax,
            post_tax_annual: posttax,
        })
    }
}

pub struct PaycheckCalculator {
    descriptor: CalculatorDescriptor,
    tables: IncomeTaxTables,
}

impl PaycheckCalculator {
    pub fn new() -> Self {
        Self::with_tables(IncomeTaxTables::builtin())
    }

    /// Build against specific bracket tables (CSV overrides applied).
    pub fn with_tables(tables: IncomeTaxTables) -> Self {
        Self {
            tables,
            descriptor: CalculatorDescriptor::new(
                "paycheck",
                "Take-Home Paycheck",
                vec![
                    FieldSpec::required("gross_annual_salary", "Gross annual salary"),
                    FieldSpec::optional("filing_status", "Filing status"),
                    FieldSpec::optional("pay_frequency", "Pay frequency"),
                    FieldSpec::optional("pre_tax_deductions_annual", "Annual pre-tax deductions"),
                    FieldSpec::optional("post_tax_deductions_annual", "Annual post-tax deductions"),
                ],
            ),
        }
    }
}

impl Default for PaycheckCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for PaycheckCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match PaycheckInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = PaycheckInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed, &self.tables)
    }
}

fn compute(inputs: &PaycheckInputs, tables: &IncomeTaxTables) -> Result<CalculationResult, EngineError> {
    let (table, standard_deduction) = tables.get("us", inputs.status)?;

    let adjusted_gross = inputs.gross_annual - inputs.pre_tax_annual;
    let taxable = (adjusted_gross - standard_deduction).max(Decimal::ZERO);
    let income_tax = round_money(table.tax_for(taxable));

    let payroll = PayrollRules::us_fica().tax_for(inputs.gross_annual, inputs.pre_tax_annual);
    let social_security = round_money(payroll.capped);
    let medicare = round_money(payroll.uncapped);

    let net_annual = inputs.gross_annual
        - inputs.pre_tax_annual
        - income_tax
        - social_security
        - medicare
        - inputs.post_tax_annual;
    let periods = Decimal::from(inputs.periods);

    let mut result = CalculationResult::new();
    result.set_int("periods_per_year", inputs.periods as i64);
    result.set_money("gross_per_period", inputs.gross_annual / periods);
    result.set_money("federal_income_tax_annual", income_tax);
    result.set_money("social_security_annual", social_security);
    result.set_money("medicare_annual", medicare);
    result.set_money("net_annual", net_annual);
    result.set_money("net_per_period", net_annual / periods);
    result.set_rate(
        "effective_tax_rate_percent",
        (income_tax + social_security + medicare) / inputs.gross_annual * dec!(100),
        2,
    );

    if net_annual <= Decimal::ZERO {
        result.warn("deductions and taxes exceed gross pay");
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
    fn test_biweekly_take_home() {
        let calc = PaycheckCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "gross_annual_salary": 80000,
                "filing_status": "single",
            })))
            .unwrap();

        // Taxable: 80,000 - 14,600 = 65,400 -> tax 9,441.00
        // FICA: 4,960 SS + 1,160 Medicare
        assert_eq!(
            result.get("federal_income_tax_annual").unwrap(),
            &serde_json::json!(9441.0)
        );
        assert_eq!(result.get("social_security_annual").unwrap(), &serde_json::json!(4960.0));
        assert_eq!(result.get("medicare_annual").unwrap(), &serde_json::json!(1160.0));

        let net = result.get("net_annual").unwrap().as_f64().unwrap();
        assert!((net - 64439.0).abs() < 0.01);
        let per_period = result.get("net_per_period").unwrap().as_f64().unwrap();
        assert!((per_period - net / 26.0).abs() < 0.01);
    }

    #[test]
    fn test_pretax_deferral_reduces_income_tax_not_fica() {
        let calc = PaycheckCalculator::new();
        let with_401k = calc
            .calculate(&inputs(serde_json::json!({
                "gross_annual_salary": 80000,
                "pre_tax_deductions_annual": 10000,
            })))
            .unwrap();
        let without = calc
            .calculate(&inputs(serde_json::json!({ "gross_annual_salary": 80000 })))
            .unwrap();

        let tax_with = with_401k.get("federal_income_tax_annual").unwrap().as_f64().unwrap();
        let tax_without = without.get("federal_income_tax_annual").unwrap().as_f64().unwrap();
        assert!(tax_with < tax_without);

        // Social Security wages are not reduced by the deferral
        assert_eq!(
            with_401k.get("social_security_annual").unwrap(),
            without.get("social_security_annual").unwrap()
        );
    }

    #[test]
    fn test_frequency_changes_period_amount_only() {
        let calc = PaycheckCalculator::new();
        let weekly = calc
            .calculate(&inputs(serde_json::json!({
                "gross_annual_salary": 52000,
                "pay_frequency": "weekly",
            })))
            .unwrap();
        assert_eq!(weekly.get("periods_per_year").unwrap(), &serde_json::json!(52));
        assert_eq!(weekly.get("gross_per_period").unwrap(), &serde_json::json!(1000.0));
    }

    #[test]
    fn test_pretax_must_leave_wages() {
        let calc = PaycheckCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "gross_annual_salary": 50000,
            "pre_tax_deductions_annual": 60000,
        })));
        assert!(!validation.is_ok());
    }
}

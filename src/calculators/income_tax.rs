//! Federal income tax from the progressive bracket tables
//!
//! Taxable income is gross minus the larger of the standard deduction and
//! itemized deductions, floored at zero. Tax, marginal rate and the
//! per-bracket breakdown all come straight from the jurisdiction table.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::round_money;
use crate::regions::{FilingStatus, IncomeTaxTables};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct IncomeTaxInputs {
    gross_income: Decimal,
    status: FilingStatus,
    jurisdiction: String,
    itemized_deductions: Decimal,
    pre_tax_deductions: Decimal,
}

impl IncomeTaxInputs {
    fn parse(inputs: &InputSet, tables: &IncomeTaxTables) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let gross = reader.decimal("gross_income", Some(Decimal::ZERO), Some(dec!(1000000000)));
        let status_code = reader.code_or("filing_status", "single", &FilingStatus::CODES);
        let jurisdiction = reader.code_or("jurisdiction", "us", &tables.jurisdictions());
        let itemized = reader.decimal_or("itemized_deductions", Decimal::ZERO, Some(Decimal::ZERO), None);
        let pretax = reader.decimal_or("pre_tax_deductions", Decimal::ZERO, Some(Decimal::ZERO), None);
        reader.finish()?;

        // code_or guarantees a known status code here
        let status = FilingStatus::parse(&status_code).unwrap_or(FilingStatus::Single);
        Ok(Self {
            gross_income: gross,
            status,
            jurisdiction,
            itemized_deductions: itemized,
            pre_tax_deductions: pretax,
        })
    }
}

pub struct IncomeTaxCalculator {
    descriptor: CalculatorDescriptor,
    tables: IncomeTaxTables,
}

impl IncomeTaxCalculator {
    pub fn new() -> Self {
        Self::with_tables(IncomeTaxTables::builtin())
    }

    /// Build against specific bracket tables (CSV overrides applied).
    pub fn with_tables(tables: IncomeTaxTables) -> Self {
        Self {
            tables,
            descriptor: CalculatorDescriptor::new(
                "income-tax",
                "Income Tax",
                vec![
                    FieldSpec::required("gross_income", "Gross annual income"),
                    FieldSpec::optional("filing_status", "Filing status"),
                    FieldSpec::optional("jurisdiction", "Tax jurisdiction"),
                    FieldSpec::optional("itemized_deductions", "Itemized deductions"),
                    FieldSpec::optional("pre_tax_deductions", "Pre-tax deductions"),
                ],
            ),
        }
    }
}

impl Default for IncomeTaxCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for IncomeTaxCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match IncomeTaxInputs::parse(inputs, &self.tables) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = IncomeTaxInputs::parse(inputs, &self.tables).map_err(EngineError::Validation)?;
        compute(&parsed, &self.tables)
    }
}

fn compute(inputs: &IncomeTaxInputs, tables: &IncomeTaxTables) -> Result<CalculationResult, EngineError> {
    let (table, standard_deduction) = tables.get(&inputs.jurisdiction, inputs.status)?;

    let adjusted_gross = (inputs.gross_income - inputs.pre_tax_deductions).max(Decimal::ZERO);
    let deduction = standard_deduction.max(inputs.itemized_deductions);
    let taxable = (adjusted_gross - deduction).max(Decimal::ZERO);

    let tax = round_money(table.tax_for(taxable));
    let effective_rate = if inputs.gross_income > Decimal::ZERO {
        tax / inputs.gross_income * dec!(100)
    } else {
        Decimal::ZERO
    };

    let mut result = CalculationResult::new();
    result.set_text("filing_status", inputs.status.as_str());
    result.set_money("adjusted_gross_income", adjusted_gross);
    result.set_money("deduction_applied", deduction);
    result.set_bool("itemized", inputs.itemized_deductions > standard_deduction);
    result.set_money("taxable_income", taxable);
    result.set_money("federal_tax", tax);
    result.set_money("after_tax_income", inputs.gross_income - inputs.pre_tax_deductions - tax);
    result.set_rate("marginal_rate_percent", table.marginal_rate(taxable) * dec!(100), 2);
    result.set_rate("effective_rate_percent", effective_rate, 2);
    result.set_rows("bracket_breakdown", &table.breakdown(taxable));
    Ok(result)
}

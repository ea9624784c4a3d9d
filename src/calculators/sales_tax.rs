//! Sales tax / VAT / GST, forward and reverse
//!
//! "add" mode starts from a net price and adds the region's tax; "remove"
//! mode starts from a tax-inclusive gross and recovers the net. The rate
//! comes from the region table or, when supplied, a custom flat rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::regions::{SalesTaxRegion, SalesTaxTable};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct SalesTaxInputs {
    amount: Decimal,
    mode: String,
    region_code: Option<String>,
    custom_rate: Option<Decimal>,
}

impl SalesTaxInputs {
    fn parse(inputs: &InputSet, table: &SalesTaxTable) -> Result<Self, Vec<String>> {
        let region_codes = table.codes();

        let mut reader = FieldReader::new(inputs);
        let amount = reader.decimal("amount", Some(Decimal::ZERO), Some(dec!(1000000000)));
        let mode = reader.code_or("mode", "add", &["add", "remove"]);
        let region_code = if reader.has("region") {
            Some(reader.code("region", &region_codes))
        } else {
            None
        };
        let custom_rate = if reader.has("custom_rate_percent") {
            Some(reader.decimal("custom_rate_percent", Some(Decimal::ZERO), Some(dec!(100))))
        } else {
            None
        };

        if region_code.is_none() && custom_rate.is_none() {
            reader.reject("either region or custom_rate_percent is required");
        }
        if region_code.is_some() && custom_rate.is_some() {
            reader.reject("region and custom_rate_percent are mutually exclusive");
        }
        reader.finish()?;

        Ok(Self { amount, mode, region_code, custom_rate })
    }

    fn region(&self, table: &SalesTaxTable) -> Result<SalesTaxRegion, EngineError> {
        match (&self.region_code, self.custom_rate) {
            (Some(code), _) => Ok(table.get(code)?.clone()),
            (None, Some(rate)) => Ok(SalesTaxRegion {
                code: "custom".to_string(),
                label: "Custom rate".to_string(),
                components: vec![crate::regions::sales::TaxComponent {
                    name: "Sales tax".to_string(),
                    rate: percent_to_ratio(rate),
                }],
                compound: false,
            }),
            (None, None) => Err(EngineError::calculation("no sales tax rate resolved")),
        }
    }
}

pub struct SalesTaxCalculator {
    descriptor: CalculatorDescriptor,
    table: SalesTaxTable,
}

impl SalesTaxCalculator {
    pub fn new() -> Self {
        Self::with_table(SalesTaxTable::builtin())
    }

    /// Build against a specific region table (CSV overrides applied).
    pub fn with_table(table: SalesTaxTable) -> Self {
        Self {
            table,
            descriptor: CalculatorDescriptor::new(
                "sales-tax",
                "Sales Tax / VAT / GST",
                vec![
                    FieldSpec::required("amount", "Amount"),
                    FieldSpec::optional("mode", "add or remove"),
                    FieldSpec::optional("region", "Tax region code"),
                    FieldSpec::optional("custom_rate_percent", "Custom rate (%)"),
                ],
            ),
        }
    }
}

impl Default for SalesTaxCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for SalesTaxCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match SalesTaxInputs::parse(inputs, &self.table) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = SalesTaxInputs::parse(inputs, &self.table).map_err(EngineError::Validation)?;
        compute(&parsed, &self.table)
    }
}

fn compute(inputs: &SalesTaxInputs, table: &SalesTaxTable) -> Result<CalculationResult, EngineError> {
    let region = inputs.region(table)?;

    let (net, tax, components) = match inputs.mode.as_str() {
        "remove" => {
            let net = region.net_from_gross(inputs.amount)?;
            let (tax, components) = region.tax_on(net);
            (net, tax, components)
        }
        _ => {
            let (tax, components) = region.tax_on(inputs.amount);
            (inputs.amount, tax, components)
        }
    };

    let mut result = CalculationResult::new();
    result.set_text("region", region.label.clone());
    result.set_text("mode", inputs.mode.clone());
    result.set_rate("effective_rate_percent", region.effective_rate() * dec!(100), 3);
    result.set_money("net_amount", net);
    result.set_money("tax_amount", tax);
    result.set_money("gross_amount", net + tax);
    result.set_rows("components", &components);

    // Cent rounding of net + tax can disagree with a rounded gross by a cent
    if inputs.mode == "remove" {
        let drift = (round_money(net) + round_money(tax) - round_money(inputs.amount)).abs();
        if drift > dec!(0.01) {
            result.warn("reverse calculation does not reproduce the gross exactly");
        }
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
    fn test_add_uk_vat() {
        let calc = SalesTaxCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "amount": 250,
                "region": "uk",
            })))
            .unwrap();

        assert_eq!(result.get("tax_amount").unwrap(), &serde_json::json!(50.0));
        assert_eq!(result.get("gross_amount").unwrap(), &serde_json::json!(300.0));
    }

    #[test]
    fn test_remove_recovers_net() {
        let calc = SalesTaxCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "amount": 110,
                "mode": "remove",
                "region": "au",
            })))
            .unwrap();

        assert_eq!(result.get("net_amount").unwrap(), &serde_json::json!(100.0));
        assert_eq!(result.get("tax_amount").unwrap(), &serde_json::json!(10.0));
    }

    #[test]
    fn test_quebec_components_compound() {
        let calc = SalesTaxCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "amount": 100,
                "region": "ca-qc",
            })))
            .unwrap();

        let components = result.get("components").unwrap().as_array().unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0]["amount"], serde_json::json!(5.0));
        // QST on 105: 10.47375 -> 10.47
        assert_eq!(components[1]["amount"], serde_json::json!(10.47));
    }

    #[test]
    fn test_custom_rate() {
        let calc = SalesTaxCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "amount": 80,
                "custom_rate_percent": 8.25,
            })))
            .unwrap();
        assert_eq!(result.get("tax_amount").unwrap(), &serde_json::json!(6.6));
    }

    #[test]
    fn test_region_and_custom_rate_conflict() {
        let calc = SalesTaxCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "amount": 100,
            "region": "uk",
            "custom_rate_percent": 5,
        })));
        assert!(!validation.is_ok());
        assert!(validation.errors()[0].contains("mutually exclusive"));
    }

    #[test]
    fn test_registered_table_overrides_apply() {
        let mut table = SalesTaxTable::builtin();
        table.upsert(SalesTaxRegion {
            code: "nz".to_string(),
            label: "New Zealand (GST)".to_string(),
            components: vec![crate::regions::sales::TaxComponent {
                name: "GST".to_string(),
                rate: dec!(0.15),
            }],
            compound: false,
        });

        let calc = SalesTaxCalculator::with_table(table);
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "amount": 100,
                "region": "nz",
            })))
            .unwrap();
        assert_eq!(result.get("tax_amount").unwrap(), &serde_json::json!(15.0));
    }

    #[test]
    fn test_missing_rate_source_rejected() {
        let calc = SalesTaxCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({ "amount": 100 })));
        assert!(!validation.is_ok());
    }
}

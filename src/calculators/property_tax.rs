//! Property tax on assessed value
//!
//! Annual tax is the assessed value (after any homestead-style exemption)
//! times the levy rate, floored at zero.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

struct PropertyTaxInputs {
    assessed_value: Decimal,
    rate: Decimal,
    exemption: Decimal,
}

impl PropertyTaxInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let assessed = reader.decimal("assessed_value", Some(dec!(0.01)), Some(dec!(1000000000)));
        let rate = reader.decimal("tax_rate_percent", Some(Decimal::ZERO), Some(dec!(100)));
        let exemption = reader.decimal_or("exemption", Decimal::ZERO, Some(Decimal::ZERO), None);
        reader.finish()?;

        Ok(Self {
            assessed_value: assessed,
            rate: percent_to_ratio(rate),
            exemption,
        })
    }
}

pub struct PropertyTaxCalculator {
    descriptor: CalculatorDescriptor,
}

impl PropertyTaxCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "property-tax",
                "Property Tax",
                vec![
                    FieldSpec::required("assessed_value", "Assessed property value"),
                    FieldSpec::required("tax_rate_percent", "Annual levy rate (%)"),
                    FieldSpec::optional("exemption", "Assessed-value exemption"),
                ],
            ),
        }
    }
}

impl Default for PropertyTaxCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for PropertyTaxCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match PropertyTaxInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = PropertyTaxInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &PropertyTaxInputs) -> Result<CalculationResult, EngineError> {
    let taxable = (inputs.assessed_value - inputs.exemption).max(Decimal::ZERO);
    let annual = round_money(taxable * inputs.rate);

    let mut result = CalculationResult::new();
    result.set_money("taxable_value", taxable);
    result.set_money("annual_tax", annual);
    result.set_money("monthly_tax", annual / dec!(12));
    result.set_rate(
        "effective_rate_percent",
        if inputs.assessed_value > Decimal::ZERO {
            annual / inputs.assessed_value * dec!(100)
        } else {
            Decimal::ZERO
        },
        3,
    );

    if inputs.exemption >= inputs.assessed_value {
        result.warn("exemption covers the entire assessed value");
    }
    Ok(result)
}

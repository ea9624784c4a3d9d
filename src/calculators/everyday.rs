//! Everyday arithmetic: percentages, tips, BMI
//!
//! Small pure calculators with no regional data. Money still goes through
//! decimal arithmetic; BMI is a physical quantity and stays in f64.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money, to_f64};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

// ---------------------------------------------------------------------------
// Percentage

struct PercentageInputs {
    operation: String,
    value: Decimal,
    other: Decimal,
}

impl PercentageInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let operation = reader.code_or(
            "operation",
            "percent-of",
            &["percent-of", "what-percent", "percent-change"],
        );
        let value = reader.decimal("value", None, None);
        let other = reader.decimal("of", None, None);

        // The operand each mode divides by must be non-zero
        if operation == "what-percent" && reader.has("of") && other == Decimal::ZERO {
            reader.reject("of must be non-zero for what-percent");
        }
        if operation == "percent-change" && reader.has("value") && value == Decimal::ZERO {
            reader.reject("value must be non-zero for percent-change");
        }
        reader.finish()?;
        Ok(Self { operation, value, other })
    }
}

pub struct PercentageCalculator {
    descriptor: CalculatorDescriptor,
}

impl PercentageCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "percentage",
                "Percentage",
                vec![
                    FieldSpec::required("value", "First operand"),
                    FieldSpec::required("of", "Second operand"),
                    FieldSpec::optional("operation", "percent-of, what-percent or percent-change"),
                ],
            ),
        }
    }
}

impl Default for PercentageCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for PercentageCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match PercentageInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = PercentageInputs::parse(inputs).map_err(EngineError::Validation)?;
        let mut result = CalculationResult::new();
        result.set_text("operation", parsed.operation.clone());

        match parsed.operation.as_str() {
            // value% of other
            "percent-of" => {
                let answer = percent_to_ratio(parsed.value) * parsed.other;
                result.set_number("result", to_f64(answer));
            }
            // value is what percent of other
            "what-percent" => {
                let ratio = parsed
                    .value
                    .checked_div(parsed.other)
                    .ok_or_else(|| EngineError::calculation("percentage of a zero base"))?;
                result.set_rate("result_percent", ratio * dec!(100), 4);
            }
            // change from value to other
            _ => {
                let change = (parsed.other - parsed.value)
                    .checked_div(parsed.value)
                    .ok_or_else(|| EngineError::calculation("percent change from zero"))?;
                result.set_rate("result_percent", change * dec!(100), 4);
                result.set_text("direction", if change < Decimal::ZERO { "decrease" } else { "increase" });
            }
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tip

struct TipInputs {
    bill: Decimal,
    tip_percent: Decimal,
    split: i64,
}

impl TipInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let bill = reader.decimal("bill_amount", Some(dec!(0.01)), Some(dec!(1000000)));
        let tip_percent = reader.decimal_or("tip_percent", dec!(18), Some(Decimal::ZERO), Some(dec!(100)));
        let split = reader.integer_or("split", 1, Some(1), Some(100));
        reader.finish()?;
        Ok(Self { bill, tip_percent, split })
    }
}

pub struct TipCalculator {
    descriptor: CalculatorDescriptor,
}

impl TipCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "tip",
                "Tip",
                vec![
                    FieldSpec::required("bill_amount", "Bill amount"),
                    FieldSpec::optional("tip_percent", "Tip (%)"),
                    FieldSpec::optional("split", "Number of people"),
                ],
            ),
        }
    }
}

impl Default for TipCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for TipCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match TipInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = TipInputs::parse(inputs).map_err(EngineError::Validation)?;

        let tip = round_money(parsed.bill * percent_to_ratio(parsed.tip_percent));
        let total = parsed.bill + tip;
        let per_person = total
            .checked_div(Decimal::from(parsed.split))
            .ok_or_else(|| EngineError::calculation("zero-way split"))?;

        let mut result = CalculationResult::new();
        result.set_money("tip_amount", tip);
        result.set_money("total_with_tip", total);
        result.set_int("split", parsed.split);
        result.set_money("per_person", per_person);
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// BMI

const BMI_CATEGORIES: &[(f64, &str)] = &[
    (18.5, "underweight"),
    (25.0, "normal"),
    (30.0, "overweight"),
    (f64::INFINITY, "obese"),
];

fn bmi_category(bmi: f64) -> &'static str {
    BMI_CATEGORIES
        .iter()
        .find(|(upper, _)| bmi < *upper)
        .map(|(_, name)| *name)
        .unwrap_or("obese")
}

struct BmiInputs {
    weight_kg: f64,
    height_m: f64,
}

impl BmiInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let weight = reader.decimal("weight_kg", Some(dec!(1)), Some(dec!(700)));
        let height = reader.decimal("height_cm", Some(dec!(30)), Some(dec!(300)));
        reader.finish()?;
        Ok(Self {
            weight_kg: to_f64(weight),
            height_m: to_f64(height) / 100.0,
        })
    }
}

pub struct BmiCalculator {
    descriptor: CalculatorDescriptor,
}

impl BmiCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "bmi",
                "Body Mass Index",
                vec![
                    FieldSpec::required("weight_kg", "Weight (kg)"),
                    FieldSpec::required("height_cm", "Height (cm)"),
                ],
            ),
        }
    }
}

impl Default for BmiCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for BmiCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match BmiInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = BmiInputs::parse(inputs).map_err(EngineError::Validation)?;

        let bmi = parsed.weight_kg / (parsed.height_m * parsed.height_m);
        let mut result = CalculationResult::new();
        result.set_number("bmi", (bmi * 100.0).round() / 100.0);
        result.set_text("category", bmi_category(bmi));
        Ok(result)
    }
}

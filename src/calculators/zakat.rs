//! Zakat on zakatable wealth
//!
//! The nisab is a threshold, never a bracket: once net zakatable wealth
//! reaches it, the 2.5% rate applies to the full amount, not the excess.
//! The threshold comes from the gold or silver standard at the supplied
//! spot price per gram.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::round_money;
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

const ZAKAT_RATE: Decimal = dec!(0.025);
const NISAB_GOLD_GRAMS: Decimal = dec!(85);
const NISAB_SILVER_GRAMS: Decimal = dec!(595);

struct ZakatInputs {
    cash: Decimal,
    gold_value: Decimal,
    silver_value: Decimal,
    investments: Decimal,
    business_assets: Decimal,
    liabilities: Decimal,
    nisab_standard: String,
    metal_price_per_gram: Decimal,
}

impl ZakatInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let cash = reader.decimal_or("cash", Decimal::ZERO, Some(Decimal::ZERO), None);
        let gold = reader.decimal_or("gold_value", Decimal::ZERO, Some(Decimal::ZERO), None);
        let silver = reader.decimal_or("silver_value", Decimal::ZERO, Some(Decimal::ZERO), None);
        let investments = reader.decimal_or("investments", Decimal::ZERO, Some(Decimal::ZERO), None);
        let business = reader.decimal_or("business_assets", Decimal::ZERO, Some(Decimal::ZERO), None);
        let liabilities = reader.decimal_or("liabilities", Decimal::ZERO, Some(Decimal::ZERO), None);
        let standard = reader.code_or("nisab_standard", "gold", &["gold", "silver"]);
        let price = reader.decimal("metal_price_per_gram", Some(dec!(0.01)), None);

        if !reader.has("cash")
            && !reader.has("gold_value")
            && !reader.has("silver_value")
            && !reader.has("investments")
            && !reader.has("business_assets")
        {
            reader.reject("at least one asset field is required");
        }
        reader.finish()?;

        Ok(Self {
            cash,
            gold_value: gold,
            silver_value: silver,
            investments,
            business_assets: business,
            liabilities,
            nisab_standard: standard,
            metal_price_per_gram: price,
        })
    }
}

pub struct ZakatCalculator {
    descriptor: CalculatorDescriptor,
}

impl ZakatCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "zakat",
                "Zakat",
                vec![
                    FieldSpec::required("metal_price_per_gram", "Nisab metal spot price per gram"),
                    FieldSpec::optional("cash", "Cash and bank balances"),
                    FieldSpec::optional("gold_value", "Gold value"),
                    FieldSpec::optional("silver_value", "Silver value"),
                    FieldSpec::optional("investments", "Investments"),
                    FieldSpec::optional("business_assets", "Business assets"),
                    FieldSpec::optional("liabilities", "Short-term liabilities"),
                    FieldSpec::optional("nisab_standard", "gold or silver"),
                ],
            ),
        }
    }
}

impl Default for ZakatCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for ZakatCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match ZakatInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = ZakatInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &ZakatInputs) -> Result<CalculationResult, EngineError> {
    let assets = inputs.cash
        + inputs.gold_value
        + inputs.silver_value
        + inputs.investments
        + inputs.business_assets;
    let net_wealth = (assets - inputs.liabilities).max(Decimal::ZERO);

    let nisab_grams = match inputs.nisab_standard.as_str() {
        "silver" => NISAB_SILVER_GRAMS,
        _ => NISAB_GOLD_GRAMS,
    };
    let nisab = round_money(nisab_grams * inputs.metal_price_per_gram);

    let due = net_wealth >= nisab && net_wealth > Decimal::ZERO;
    let zakat = if due {
        round_money(net_wealth * ZAKAT_RATE)
    } else {
        Decimal::ZERO
    };

    let mut result = CalculationResult::new();
    result.set_money("total_assets", assets);
    result.set_money("net_zakatable_wealth", net_wealth);
    result.set_text("nisab_standard", inputs.nisab_standard.clone());
    result.set_money("nisab_threshold", nisab);
    result.set_bool("zakat_due", due);
    result.set_money("zakat_amount", zakat);
    result.set_rate("zakat_rate_percent", ZAKAT_RATE * dec!(100), 1);

    if !due && net_wealth > Decimal::ZERO {
        result.warn("net wealth is below the nisab; no zakat is due");
    }
    Ok(result)
}

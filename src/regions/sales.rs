//! Sales/VAT/GST region tables
//!
//! Each region is one or two rate components plus an explicit `compound`
//! flag. Compound jurisdictions (Quebec-style tax-on-tax) apply the second
//! component to net + first tax, never to net alone; that behavior is table
//! data, not an assumption buried in calculator code.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::EngineError;

/// One named rate component (e.g. GST, PST, VAT).
#[derive(Debug, Clone, Serialize)]
pub struct TaxComponent {
    pub name: String,
    /// Rate as a ratio (0.05 for 5%).
    pub rate: Decimal,
}

/// A sales-tax jurisdiction.
#[derive(Debug, Clone)]
pub struct SalesTaxRegion {
    pub code: String,
    pub label: String,
    pub components: Vec<TaxComponent>,
    /// When true, the second component taxes (net + first component).
    pub compound: bool,
}

/// One component's amount on a specific sale.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentAmount {
    pub name: String,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub amount: Decimal,
}

impl SalesTaxRegion {
    fn new(code: &str, label: &str, components: Vec<(&str, Decimal)>, compound: bool) -> Self {
        Self {
            code: code.to_string(),
            label: label.to_string(),
            components: components
                .into_iter()
                .map(|(name, rate)| TaxComponent { name: name.to_string(), rate })
                .collect(),
            compound,
        }
    }

    /// Combined effective rate as a ratio. For compound regions the second
    /// component's base includes the first: `r1 + r2 * (1 + r1)`.
    pub fn effective_rate(&self) -> Decimal {
        let mut effective = Decimal::ZERO;
        for (index, component) in self.components.iter().enumerate() {
            if self.compound && index > 0 {
                effective += component.rate * (Decimal::ONE + self.components[0].rate);
            } else {
                effective += component.rate;
            }
        }
        effective
    }

    /// Tax amounts per component on a net amount.
    pub fn tax_on(&self, net: Decimal) -> (Decimal, Vec<ComponentAmount>) {
        let mut total = Decimal::ZERO;
        let mut amounts = Vec::with_capacity(self.components.len());
        for (index, component) in self.components.iter().enumerate() {
            let base = if self.compound && index > 0 {
                net + net * self.components[0].rate
            } else {
                net
            };
            let amount = base * component.rate;
            total += amount;
            amounts.push(ComponentAmount { name: component.name.clone(), amount });
        }
        (total, amounts)
    }

    /// Reverse calculation: recover the net amount from a tax-inclusive
    /// gross, `net = gross / (1 + effective_rate)`.
    pub fn net_from_gross(&self, gross: Decimal) -> Result<Decimal, EngineError> {
        let divisor = Decimal::ONE + self.effective_rate();
        gross
            .checked_div(divisor)
            .ok_or_else(|| EngineError::calculation("degenerate sales tax rate"))
    }
}

/// Built-in sales-tax regions keyed by code.
#[derive(Debug, Clone)]
pub struct SalesTaxTable {
    regions: BTreeMap<String, SalesTaxRegion>,
}

impl SalesTaxTable {
    pub fn builtin() -> Self {
        let regions = vec![
            SalesTaxRegion::new("uk", "United Kingdom (VAT)", vec![("VAT", dec!(0.20))], false),
            SalesTaxRegion::new("au", "Australia (GST)", vec![("GST", dec!(0.10))], false),
            SalesTaxRegion::new("ca-ab", "Alberta (GST)", vec![("GST", dec!(0.05))], false),
            SalesTaxRegion::new(
                "ca-bc",
                "British Columbia (GST + PST)",
                vec![("GST", dec!(0.05)), ("PST", dec!(0.07))],
                false,
            ),
            SalesTaxRegion::new("ca-on", "Ontario (HST)", vec![("HST", dec!(0.13))], false),
            SalesTaxRegion::new("ca-ns", "Nova Scotia (HST)", vec![("HST", dec!(0.15))], false),
            // Quebec computes QST on the GST-inclusive amount.
            SalesTaxRegion::new(
                "ca-qc",
                "Quebec (GST + QST, compound)",
                vec![("GST", dec!(0.05)), ("QST", dec!(0.09975))],
                true,
            ),
        ];
        Self {
            regions: regions.into_iter().map(|r| (r.code.clone(), r)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> Result<&SalesTaxRegion, EngineError> {
        self.regions
            .get(code)
            .ok_or_else(|| EngineError::unknown_code("sales tax region", code, "uk"))
    }

    pub fn codes(&self) -> Vec<&str> {
        self.regions.keys().map(|k| k.as_str()).collect()
    }

    /// Replace or add a region (CSV overrides).
    pub fn upsert(&mut self, region: SalesTaxRegion) {
        self.regions.insert(region.code.clone(), region);
    }
}

impl Default for SalesTaxTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_component_rate() {
        let table = SalesTaxTable::builtin();
        let uk = table.get("uk").unwrap();
        assert_eq!(uk.effective_rate(), dec!(0.20));

        let (tax, parts) = uk.tax_on(dec!(100));
        assert_eq!(tax, dec!(20));
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_quebec_compounds_tax_on_tax() {
        let table = SalesTaxTable::builtin();
        let qc = table.get("ca-qc").unwrap();

        // QST applies to the GST-inclusive amount: 100 -> GST 5, QST on 105
        let (tax, parts) = qc.tax_on(dec!(100));
        assert_eq!(parts[0].amount, dec!(5));
        assert_eq!(parts[1].amount, dec!(105) * dec!(0.09975));
        assert_eq!(tax, dec!(5) + dec!(105) * dec!(0.09975));

        // Effective rate folds the compounding in
        assert_eq!(qc.effective_rate(), dec!(0.05) + dec!(0.09975) * dec!(1.05));
    }

    #[test]
    fn test_non_compound_two_components() {
        let table = SalesTaxTable::builtin();
        let bc = table.get("ca-bc").unwrap();
        let (tax, _) = bc.tax_on(dec!(200));
        assert_eq!(tax, dec!(200) * dec!(0.12));
    }

    #[test]
    fn test_reverse_recovers_net() {
        let table = SalesTaxTable::builtin();
        let au = table.get("au").unwrap();
        let net = au.net_from_gross(dec!(110)).unwrap();
        assert_eq!(net, dec!(100));

        // Compound reverse is consistent with forward
        let qc = table.get("ca-qc").unwrap();
        let gross = dec!(100) + qc.tax_on(dec!(100)).0;
        let recovered = qc.net_from_gross(gross).unwrap();
        assert!((recovered - dec!(100)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_unknown_region_is_configuration_error() {
        let table = SalesTaxTable::builtin();
        assert!(matches!(table.get("zz"), Err(EngineError::Configuration { .. })));
    }
}

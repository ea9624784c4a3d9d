//! Progressive tax bracket tables and payroll rules
//!
//! Calculation code reads purely from these tables; jurisdiction behavior is
//! data, never string comparisons scattered through calculator logic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::EngineError;
use crate::math::percent_to_ratio;

/// One marginal bracket. `upper == None` means the bracket is open-ended.
#[derive(Debug, Clone)]
pub struct TaxBracket {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

/// Ordered, contiguous marginal brackets covering `[0, +inf)`.
#[derive(Debug, Clone)]
pub struct TaxBracketTable {
    brackets: Vec<TaxBracket>,
}

/// One bracket's share of a specific income, for result breakdowns.
#[derive(Debug, Clone, Serialize)]
pub struct BracketSlice {
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub lower: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub upper: Decimal,
    pub rate_percent: f64,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub taxable: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub tax: Decimal,
}

impl TaxBracketTable {
    /// Build a table, enforcing the structural invariants at construction:
    /// first bracket starts at zero, brackets are contiguous and ascending,
    /// the last bracket is open-ended.
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, EngineError> {
        if brackets.is_empty() {
            return Err(EngineError::calculation("bracket table is empty"));
        }
        if brackets[0].lower != Decimal::ZERO {
            return Err(EngineError::calculation("first bracket must start at zero"));
        }
        for pair in brackets.windows(2) {
            match pair[0].upper {
                Some(upper) if upper == pair[1].lower => {}
                _ => return Err(EngineError::calculation("brackets must be contiguous")),
            }
        }
        if brackets[brackets.len() - 1].upper.is_some() {
            return Err(EngineError::calculation("last bracket must be open-ended"));
        }
        if brackets.iter().any(|b| b.rate < Decimal::ZERO) {
            return Err(EngineError::calculation("bracket rates must be non-negative"));
        }
        Ok(Self { brackets })
    }

    /// Total tax owed on `income`: sum over brackets of
    /// `rate_i * (min(income, upper_i) - lower_i)`. Monotonic in income.
    pub fn tax_for(&self, income: Decimal) -> Decimal {
        let income = income.max(Decimal::ZERO);
        let mut tax = Decimal::ZERO;
        for bracket in &self.brackets {
            if income <= bracket.lower {
                break;
            }
            let top = match bracket.upper {
                Some(upper) => income.min(upper),
                None => income,
            };
            tax += bracket.rate * (top - bracket.lower);
        }
        tax
    }

    /// The marginal rate that applies at `income`.
    pub fn marginal_rate(&self, income: Decimal) -> Decimal {
        let income = income.max(Decimal::ZERO);
        for bracket in &self.brackets {
            match bracket.upper {
                Some(upper) if income >= upper => continue,
                _ => return bracket.rate,
            }
        }
        Decimal::ZERO
    }

    /// Per-bracket breakdown of the tax on `income` (filled brackets only).
    pub fn breakdown(&self, income: Decimal) -> Vec<BracketSlice> {
        let income = income.max(Decimal::ZERO);
        let mut slices = Vec::new();
        for bracket in &self.brackets {
            if income <= bracket.lower {
                break;
            }
            let top = match bracket.upper {
                Some(upper) => income.min(upper),
                None => income,
            };
            let taxable = top - bracket.lower;
            slices.push(BracketSlice {
                lower: bracket.lower,
                upper: top,
                rate_percent: crate::math::to_f64(bracket.rate * dec!(100)),
                taxable,
                tax: bracket.rate * taxable,
            });
        }
        slices
    }
}

/// Filing status for jurisdictions that key brackets on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilingStatus {
    Single,
    MarriedJointly,
    MarriedSeparately,
    HeadOfHousehold,
}

impl FilingStatus {
    pub const CODES: [&'static str; 4] =
        ["single", "married_jointly", "married_separately", "head_of_household"];

    pub const ALL: [FilingStatus; 4] = [
        FilingStatus::Single,
        FilingStatus::MarriedJointly,
        FilingStatus::MarriedSeparately,
        FilingStatus::HeadOfHousehold,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "single" => Some(FilingStatus::Single),
            "married_jointly" => Some(FilingStatus::MarriedJointly),
            "married_separately" => Some(FilingStatus::MarriedSeparately),
            "head_of_household" => Some(FilingStatus::HeadOfHousehold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJointly => "married_jointly",
            FilingStatus::MarriedSeparately => "married_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }
}

fn bracket(lower: Decimal, upper: Option<Decimal>, rate_percent: Decimal) -> TaxBracket {
    TaxBracket { lower, upper, rate: percent_to_ratio(rate_percent) }
}

/// 2024 US federal brackets for a filing status.
pub fn us_federal_brackets(status: FilingStatus) -> TaxBracketTable {
    let rows = match status {
        FilingStatus::Single => vec![
            bracket(dec!(0), Some(dec!(11600)), dec!(10)),
            bracket(dec!(11600), Some(dec!(47150)), dec!(12)),
            bracket(dec!(47150), Some(dec!(100525)), dec!(22)),
            bracket(dec!(100525), Some(dec!(191950)), dec!(24)),
            bracket(dec!(191950), Some(dec!(243725)), dec!(32)),
            bracket(dec!(243725), Some(dec!(609350)), dec!(35)),
            bracket(dec!(609350), None, dec!(37)),
        ],
        FilingStatus::MarriedJointly => vec![
            bracket(dec!(0), Some(dec!(23200)), dec!(10)),
            bracket(dec!(23200), Some(dec!(94300)), dec!(12)),
            bracket(dec!(94300), Some(dec!(201050)), dec!(22)),
            bracket(dec!(201050), Some(dec!(383900)), dec!(24)),
            bracket(dec!(383900), Some(dec!(487450)), dec!(32)),
            bracket(dec!(487450), Some(dec!(731200)), dec!(35)),
            bracket(dec!(731200), None, dec!(37)),
        ],
        FilingStatus::MarriedSeparately => vec![
            bracket(dec!(0), Some(dec!(11600)), dec!(10)),
            bracket(dec!(11600), Some(dec!(47150)), dec!(12)),
            bracket(dec!(47150), Some(dec!(100525)), dec!(22)),
            bracket(dec!(100525), Some(dec!(191950)), dec!(24)),
            bracket(dec!(191950), Some(dec!(243725)), dec!(32)),
            bracket(dec!(243725), Some(dec!(365600)), dec!(35)),
            bracket(dec!(365600), None, dec!(37)),
        ],
        FilingStatus::HeadOfHousehold => vec![
            bracket(dec!(0), Some(dec!(16550)), dec!(10)),
            bracket(dec!(16550), Some(dec!(63100)), dec!(12)),
            bracket(dec!(63100), Some(dec!(100500)), dec!(22)),
            bracket(dec!(100500), Some(dec!(191950)), dec!(24)),
            bracket(dec!(191950), Some(dec!(243725)), dec!(32)),
            bracket(dec!(243725), Some(dec!(609350)), dec!(35)),
            bracket(dec!(609350), None, dec!(37)),
        ],
    };
    // Hardcoded tables satisfy the construction invariants by inspection;
    // a mistake here should abort at first use, not mid-request.
    TaxBracketTable::new(rows).expect("builtin bracket table is well-formed")
}

/// 2024 US standard deduction per filing status.
pub fn us_standard_deduction(status: FilingStatus) -> Decimal {
    match status {
        FilingStatus::Single | FilingStatus::MarriedSeparately => dec!(14600),
        FilingStatus::MarriedJointly => dec!(29200),
        FilingStatus::HeadOfHousehold => dec!(21900),
    }
}

/// Bracket tables and standard deductions keyed by jurisdiction and filing
/// status. Built from the hardcoded tables, with individual bracket tables
/// replaceable from CSV overrides at registration.
#[derive(Debug, Clone)]
pub struct IncomeTaxTables {
    entries: BTreeMap<String, (TaxBracketTable, Decimal)>,
}

impl IncomeTaxTables {
    fn key(jurisdiction: &str, status: FilingStatus) -> String {
        format!("{jurisdiction}/{}", status.as_str())
    }

    /// 2024 US federal tables for every filing status.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        for status in FilingStatus::ALL {
            entries.insert(
                Self::key("us", status),
                (us_federal_brackets(status), us_standard_deduction(status)),
            );
        }
        Self { entries }
    }

    /// Resolve the bracket table and standard deduction for a jurisdiction,
    /// or a configuration error suggesting the built-in fallback.
    pub fn get(
        &self,
        jurisdiction: &str,
        status: FilingStatus,
    ) -> Result<(&TaxBracketTable, Decimal), EngineError> {
        self.entries
            .get(&Self::key(jurisdiction, status))
            .map(|(table, deduction)| (table, *deduction))
            .ok_or_else(|| EngineError::unknown_code("jurisdiction", jurisdiction, "us"))
    }

    /// Known jurisdiction codes, stable order.
    pub fn jurisdictions(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .entries
            .keys()
            .filter_map(|key| key.split('/').next())
            .collect();
        codes.dedup();
        codes
    }

    /// Replace one status's bracket table (CSV overrides). The standard
    /// deduction keeps its existing value, zero for a new jurisdiction.
    pub fn set_brackets(
        &mut self,
        jurisdiction: &str,
        status: FilingStatus,
        table: TaxBracketTable,
    ) {
        let key = Self::key(jurisdiction, status);
        let deduction = self
            .entries
            .get(&key)
            .map(|(_, deduction)| *deduction)
            .unwrap_or(Decimal::ZERO);
        self.entries.insert(key, (table, deduction));
    }
}

impl Default for IncomeTaxTables {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Which wage base flat payroll taxes apply to. A region configuration
/// property, not hardcoded logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayrollBase {
    /// Payroll tax on gross wages (US FICA: pre-tax 401k does not reduce
    /// Social Security wages).
    Gross,
    /// Payroll tax on wages after pre-tax deductions.
    AfterPreTax,
}

/// Flat-rate payroll taxes: a capped component plus an uncapped component
/// with a surtax above a threshold.
#[derive(Debug, Clone)]
pub struct PayrollRules {
    pub capped_rate: Decimal,
    pub wage_cap: Decimal,
    pub uncapped_rate: Decimal,
    pub surtax_rate: Decimal,
    pub surtax_threshold: Decimal,
    pub base: PayrollBase,
}

/// Annual payroll tax amounts.
#[derive(Debug, Clone)]
pub struct PayrollTax {
    pub capped: Decimal,
    pub uncapped: Decimal,
    pub total: Decimal,
}

impl PayrollRules {
    /// 2024 US FICA: 6.2% Social Security to $168,600; 1.45% Medicare
    /// uncapped plus 0.9% additional over $200,000; applied on gross wages.
    pub fn us_fica() -> Self {
        Self {
            capped_rate: dec!(0.062),
            wage_cap: dec!(168600),
            uncapped_rate: dec!(0.0145),
            surtax_rate: dec!(0.009),
            surtax_threshold: dec!(200000),
            base: PayrollBase::Gross,
        }
    }

    /// Annual payroll tax for the given gross and pre-tax deduction totals.
    pub fn tax_for(&self, gross_annual: Decimal, pretax_annual: Decimal) -> PayrollTax {
        let wages = match self.base {
            PayrollBase::Gross => gross_annual,
            PayrollBase::AfterPreTax => (gross_annual - pretax_annual).max(Decimal::ZERO),
        };
        let capped = self.capped_rate * wages.min(self.wage_cap);
        let mut uncapped = self.uncapped_rate * wages;
        if wages > self.surtax_threshold {
            uncapped += self.surtax_rate * (wages - self.surtax_threshold);
        }
        PayrollTax { capped, uncapped, total: capped + uncapped }
    }
}

/// 2024 HHS poverty guideline (48 contiguous states) by family size.
pub fn poverty_guideline(family_size: i64) -> Decimal {
    let extra = Decimal::from(family_size.max(1) - 1);
    dec!(15060) + dec!(5380) * extra
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_invariants_enforced() {
        // Gap between brackets
        let gap = TaxBracketTable::new(vec![
            bracket(dec!(0), Some(dec!(100)), dec!(10)),
            bracket(dec!(200), None, dec!(20)),
        ]);
        assert!(gap.is_err());

        // First bracket not at zero
        let offset = TaxBracketTable::new(vec![bracket(dec!(5), None, dec!(10))]);
        assert!(offset.is_err());

        // Capped final bracket
        let capped = TaxBracketTable::new(vec![bracket(dec!(0), Some(dec!(100)), dec!(10))]);
        assert!(capped.is_err());
    }

    #[test]
    fn test_marginal_computation() {
        let table = us_federal_brackets(FilingStatus::Single);

        // 50,000: 10% of 11,600 + 12% of 35,550 + 22% of 2,850
        let tax = table.tax_for(dec!(50000));
        assert_eq!(tax, dec!(1160) + dec!(4266) + dec!(627));

        assert_eq!(table.marginal_rate(dec!(50000)), dec!(0.22));
        assert_eq!(table.marginal_rate(dec!(700000)), dec!(0.37));
    }

    #[test]
    fn test_tax_is_monotonic_in_income() {
        let table = us_federal_brackets(FilingStatus::HeadOfHousehold);
        let mut previous = Decimal::ZERO;
        for income in (0..400_000).step_by(7_500) {
            let tax = table.tax_for(Decimal::from(income));
            assert!(tax >= previous, "tax decreased at income {income}");
            previous = tax;
        }
    }

    #[test]
    fn test_negative_income_taxed_as_zero() {
        let table = us_federal_brackets(FilingStatus::Single);
        assert_eq!(table.tax_for(dec!(-1000)), Decimal::ZERO);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let table = us_federal_brackets(FilingStatus::MarriedJointly);
        let income = dec!(250000);
        let total: Decimal = table.breakdown(income).iter().map(|s| s.tax).sum();
        assert_eq!(total, table.tax_for(income));
    }

    #[test]
    fn test_fica_wage_cap_and_surtax() {
        let rules = PayrollRules::us_fica();

        let below = rules.tax_for(dec!(100000), Decimal::ZERO);
        assert_eq!(below.capped, dec!(6200));
        assert_eq!(below.uncapped, dec!(1450));

        let above = rules.tax_for(dec!(250000), Decimal::ZERO);
        assert_eq!(above.capped, dec!(0.062) * dec!(168600));
        assert_eq!(above.uncapped, dec!(0.0145) * dec!(250000) + dec!(0.009) * dec!(50000));
    }

    #[test]
    fn test_payroll_base_flag_changes_wages() {
        let mut rules = PayrollRules::us_fica();
        rules.base = PayrollBase::AfterPreTax;
        let taxed = rules.tax_for(dec!(100000), dec!(10000));
        assert_eq!(taxed.capped, dec!(0.062) * dec!(90000));
    }

    #[test]
    fn test_poverty_guideline_scales_with_family() {
        assert_eq!(poverty_guideline(1), dec!(15060));
        assert_eq!(poverty_guideline(4), dec!(15060) + dec!(5380) * dec!(3));
        // Nonsense size clamps to a single-person household
        assert_eq!(poverty_guideline(0), dec!(15060));
    }

    #[test]
    fn test_unknown_jurisdiction_suggests_fallback() {
        let tables = IncomeTaxTables::builtin();
        let err = tables.get("mars", FilingStatus::Single).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
        assert_eq!(tables.jurisdictions(), vec!["us"]);
    }

    #[test]
    fn test_bracket_override_keeps_deduction() {
        let mut tables = IncomeTaxTables::builtin();
        let flat = TaxBracketTable::new(vec![bracket(dec!(0), None, dec!(10))]).unwrap();
        tables.set_brackets("us", FilingStatus::Single, flat);

        let (table, deduction) = tables.get("us", FilingStatus::Single).unwrap();
        assert_eq!(table.marginal_rate(dec!(1000000)), dec!(0.10));
        assert_eq!(deduction, dec!(14600));

        // Other statuses are untouched
        let (joint, _) = tables.get("us", FilingStatus::MarriedJointly).unwrap();
        assert_eq!(joint.marginal_rate(dec!(1000000)), dec!(0.37));
    }
}

//! Calculator implementations
//!
//! Each module hosts one calculator family behind the `Calculator` trait.
//! Nothing here registers itself; `register_all` is the single explicit
//! wiring point called when building a registry with defaults.

pub mod auto;
pub mod breakeven;
pub mod compound;
pub mod everyday;
pub mod freelance;
pub mod income_tax;
pub mod investment;
pub mod loan;
pub mod mortgage;
pub mod paycheck;
pub mod property_tax;
pub mod retirement;
pub mod sales_tax;
pub mod sip;
pub mod student_loan;
pub mod zakat;

use crate::regions::{region_tables, RegionTables};
use crate::registry::Registry;

/// Register every built-in calculator. The tax calculators take the
/// regional tables resolved at startup, CSV overrides included.
pub fn register_all(registry: &mut Registry) {
    let RegionTables { income, sales } = region_tables();

    registry.register(Box::new(loan::LoanCalculator::new()));
    registry.register(Box::new(mortgage::MortgageCalculator::new()));
    registry.register(Box::new(auto::AutoCalculator::new()));
    registry.register(Box::new(student_loan::StudentLoanCalculator::new()));
    registry.register(Box::new(income_tax::IncomeTaxCalculator::with_tables(income.clone())));
    registry.register(Box::new(paycheck::PaycheckCalculator::with_tables(income)));
    registry.register(Box::new(sales_tax::SalesTaxCalculator::with_table(sales)));
    registry.register(Box::new(property_tax::PropertyTaxCalculator::new()));
    registry.register(Box::new(zakat::ZakatCalculator::new()));
    registry.register(Box::new(compound::CompoundCalculator::new()));
    registry.register(Box::new(retirement::RetirementCalculator::new()));
    registry.register(Box::new(investment::InvestmentCalculator::new()));
    registry.register(Box::new(sip::SipCalculator::new()));
    registry.register(Box::new(breakeven::BreakevenCalculator::new()));
    registry.register(Box::new(freelance::FreelanceCalculator::new()));
    registry.register(Box::new(everyday::PercentageCalculator::new()));
    registry.register(Box::new(everyday::TipCalculator::new()));
    registry.register(Box::new(everyday::BmiCalculator::new()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_calculators_register_cleanly() {
        let registry = Registry::with_defaults();
        assert_eq!(registry.len(), 18);
        assert!(registry.get("loan").is_ok());
        assert!(registry.get("bmi").is_ok());
    }
}

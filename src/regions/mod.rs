//! Regional and jurisdiction data tables
//!
//! Static reference data read by the calculators: progressive tax brackets,
//! payroll rules, sales-tax regions, poverty guidelines and display
//! configuration. All lookup, no computation; jurisdiction differences live
//! here as data rather than as branches in calculation code.

pub mod brackets;
pub mod config;
pub mod loader;
pub mod sales;

pub use brackets::{
    poverty_guideline, us_federal_brackets, us_standard_deduction, BracketSlice, FilingStatus,
    IncomeTaxTables, PayrollBase, PayrollRules, TaxBracket, TaxBracketTable,
};
pub use config::{config_for, RegionalConfig};
pub use loader::{region_tables, RegionTables};
pub use sales::{SalesTaxRegion, SalesTaxTable};

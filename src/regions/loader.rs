//! CSV overrides for regional tables
//!
//! Deployments with newer tax-year data can override the built-in tables
//! from CSV files in `data/regions/` without a rebuild: `sales_tax.csv`
//! replaces or adds sales regions, and `brackets_us_<status>.csv` replaces
//! the US bracket table for one filing status. `region_tables` applies any
//! overrides present at registration time. Loaders are generic over
//! `io::Read` so tests feed in-memory CSV.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context};
use rust_decimal::Decimal;

use crate::math::percent_to_ratio;
use crate::regions::brackets::{FilingStatus, IncomeTaxTables, TaxBracket, TaxBracketTable};
use crate::regions::sales::{SalesTaxRegion, SalesTaxTable, TaxComponent};

/// Default path to the regional override directory.
pub const DEFAULT_REGIONS_PATH: &str = "data/regions";

const SALES_FILE: &str = "sales_tax.csv";

fn bracket_file(status: FilingStatus) -> String {
    format!("brackets_us_{}.csv", status.as_str())
}

/// Every regional table the tax calculators consume.
#[derive(Debug, Clone)]
pub struct RegionTables {
    pub income: IncomeTaxTables,
    pub sales: SalesTaxTable,
}

impl RegionTables {
    pub fn builtin() -> Self {
        Self {
            income: IncomeTaxTables::builtin(),
            sales: SalesTaxTable::builtin(),
        }
    }
}

impl Default for RegionTables {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Apply the override files present in `dir` on top of `tables`. Missing
/// files are fine; a malformed file is an error.
pub fn apply_overrides(tables: &mut RegionTables, dir: &Path) -> anyhow::Result<()> {
    let sales_path = dir.join(SALES_FILE);
    if sales_path.is_file() {
        for region in load_sales_regions_path(&sales_path)? {
            tables.sales.upsert(region);
        }
    }
    for status in FilingStatus::ALL {
        let path = dir.join(bracket_file(status));
        if path.is_file() {
            let table = load_bracket_table_path(&path)?;
            tables.income.set_brackets("us", status, table);
        }
    }
    Ok(())
}

/// Built-in tables plus any overrides found under `data/regions/`. A
/// malformed override logs a warning and leaves every built-in table in
/// place rather than registering a half-overridden set.
pub fn region_tables() -> RegionTables {
    let mut tables = RegionTables::builtin();
    let dir = Path::new(DEFAULT_REGIONS_PATH);
    if dir.is_dir() {
        if let Err(err) = apply_overrides(&mut tables, dir) {
            log::warn!("ignoring regional overrides under {}: {err:#}", dir.display());
            return RegionTables::builtin();
        }
    }
    tables
}

/// Load a bracket table from CSV with columns `lower,upper,rate_percent`.
/// An empty `upper` marks the open-ended top bracket.
pub fn load_bracket_table<R: Read>(reader: R) -> anyhow::Result<TaxBracketTable> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut brackets = Vec::new();

    for (line, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("bracket row {}", line + 1))?;
        if record.len() < 3 {
            bail!("bracket row {} has {} columns, expected 3", line + 1, record.len());
        }
        let lower = Decimal::from_str(record[0].trim())
            .with_context(|| format!("bracket row {}: lower bound", line + 1))?;
        let upper = match record[1].trim() {
            "" => None,
            text => Some(
                Decimal::from_str(text)
                    .with_context(|| format!("bracket row {}: upper bound", line + 1))?,
            ),
        };
        let rate_percent = Decimal::from_str(record[2].trim())
            .with_context(|| format!("bracket row {}: rate", line + 1))?;
        brackets.push(TaxBracket { lower, upper, rate: percent_to_ratio(rate_percent) });
    }

    TaxBracketTable::new(brackets).map_err(|err| anyhow::anyhow!("{err}"))
}

/// Load a bracket table from a CSV file.
pub fn load_bracket_table_path(path: &Path) -> anyhow::Result<TaxBracketTable> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    load_bracket_table(file)
}

/// Load sales-tax regions from CSV with columns
/// `code,label,component,rate_percent,compound`. Consecutive rows sharing a
/// code form one region's component list.
pub fn load_sales_regions<R: Read>(reader: R) -> anyhow::Result<Vec<SalesTaxRegion>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut regions: Vec<SalesTaxRegion> = Vec::new();

    for (line, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("sales region row {}", line + 1))?;
        if record.len() < 5 {
            bail!("sales region row {} has {} columns, expected 5", line + 1, record.len());
        }
        let code = record[0].trim().to_string();
        let label = record[1].trim().to_string();
        let component = record[2].trim().to_string();
        let rate_percent = Decimal::from_str(record[3].trim())
            .with_context(|| format!("sales region row {}: rate", line + 1))?;
        let compound = matches!(record[4].trim(), "true" | "1" | "yes");

        match regions.last_mut() {
            Some(region) if region.code == code => {
                region.components.push(TaxComponent {
                    name: component,
                    rate: percent_to_ratio(rate_percent),
                });
                region.compound = region.compound || compound;
            }
            _ => regions.push(SalesTaxRegion {
                code,
                label,
                components: vec![TaxComponent {
                    name: component,
                    rate: percent_to_ratio(rate_percent),
                }],
                compound,
            }),
        }
    }

    Ok(regions)
}

/// Load sales-tax regions from a CSV file.
pub fn load_sales_regions_path(path: &Path) -> anyhow::Result<Vec<SalesTaxRegion>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    load_sales_regions(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_bracket_table() {
        let csv = "lower,upper,rate_percent\n0,10000,10\n10000,40000,20\n40000,,30\n";
        let table = load_bracket_table(csv.as_bytes()).unwrap();

        assert_eq!(table.tax_for(dec!(10000)), dec!(1000));
        assert_eq!(table.tax_for(dec!(50000)), dec!(1000) + dec!(6000) + dec!(3000));
        assert_eq!(table.marginal_rate(dec!(50000)), dec!(0.30));
    }

    #[test]
    fn test_malformed_brackets_rejected() {
        // Gap between 10000 and 20000
        let csv = "lower,upper,rate_percent\n0,10000,10\n20000,,30\n";
        assert!(load_bracket_table(csv.as_bytes()).is_err());

        let csv = "lower,upper,rate_percent\n0,abc,10\n";
        assert!(load_bracket_table(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_sales_regions_groups_components() {
        let csv = "code,label,component,rate_percent,compound\n\
                   ca-qc,Quebec,GST,5,true\n\
                   ca-qc,Quebec,QST,9.975,true\n\
                   uk,United Kingdom,VAT,20,false\n";
        let regions = load_sales_regions(csv.as_bytes()).unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].components.len(), 2);
        assert!(regions[0].compound);
        assert_eq!(regions[1].components[0].rate, dec!(0.20));
    }

    #[test]
    fn test_overrides_apply_from_directory() {
        let dir = std::env::temp_dir().join(format!("regions-override-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("sales_tax.csv"),
            "code,label,component,rate_percent,compound\nnz,New Zealand (GST),GST,15,false\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("brackets_us_single.csv"),
            "lower,upper,rate_percent\n0,,10\n",
        )
        .unwrap();

        let mut tables = RegionTables::builtin();
        let applied = apply_overrides(&mut tables, &dir);
        std::fs::remove_dir_all(&dir).ok();
        applied.unwrap();

        // New sales region added, built-ins intact
        assert_eq!(tables.sales.get("nz").unwrap().effective_rate(), dec!(0.15));
        assert!(tables.sales.get("uk").is_ok());

        // Single-filer brackets replaced, deduction and other statuses kept
        let (table, deduction) = tables.income.get("us", FilingStatus::Single).unwrap();
        assert_eq!(table.marginal_rate(dec!(1000000)), dec!(0.10));
        assert_eq!(deduction, dec!(14600));
        let (joint, _) = tables.income.get("us", FilingStatus::MarriedJointly).unwrap();
        assert_eq!(joint.marginal_rate(dec!(1000000)), dec!(0.37));
    }

    #[test]
    fn test_missing_override_directory_keeps_builtins() {
        let mut tables = RegionTables::builtin();
        let dir = std::env::temp_dir().join("regions-override-does-not-exist");
        apply_overrides(&mut tables, &dir).unwrap();
        assert!(tables.sales.get("uk").is_ok());
    }
}

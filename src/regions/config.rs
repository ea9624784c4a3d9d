//! Regional display configuration
//!
//! Currency and separator metadata consumed by calculators when attaching
//! formatted strings to results. Loaded once, never mutated.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::math::round_money;

/// Display configuration for one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionalConfig {
    pub code: &'static str,
    pub currency: &'static str,
    pub symbol: &'static str,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl RegionalConfig {
    /// Format a monetary amount with symbol and separators,
    /// e.g. `$1,580.17`.
    pub fn format_amount(&self, amount: Decimal) -> String {
        let rounded = round_money(amount);
        let negative = rounded.is_sign_negative();
        let text = rounded.abs().to_string();
        let (whole, cents) = match text.split_once('.') {
            Some((w, c)) => (w.to_string(), format!("{c:0<2}")),
            None => (text, "00".to_string()),
        };

        let mut grouped = String::new();
        for (index, digit) in whole.chars().enumerate() {
            if index > 0 && (whole.len() - index) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(digit);
        }

        let sign = if negative { "-" } else { "" };
        format!("{sign}{}{grouped}{}{cents}", self.symbol, self.decimal_separator)
    }
}

/// Built-in regional configurations keyed by region code.
pub fn builtin_configs() -> BTreeMap<&'static str, RegionalConfig> {
    let configs = [
        RegionalConfig {
            code: "us",
            currency: "USD",
            symbol: "$",
            thousands_separator: ',',
            decimal_separator: '.',
        },
        RegionalConfig {
            code: "uk",
            currency: "GBP",
            symbol: "£",
            thousands_separator: ',',
            decimal_separator: '.',
        },
        RegionalConfig {
            code: "ca",
            currency: "CAD",
            symbol: "$",
            thousands_separator: ',',
            decimal_separator: '.',
        },
        RegionalConfig {
            code: "au",
            currency: "AUD",
            symbol: "$",
            thousands_separator: ',',
            decimal_separator: '.',
        },
        RegionalConfig {
            code: "de",
            currency: "EUR",
            symbol: "€",
            thousands_separator: '.',
            decimal_separator: ',',
        },
    ];
    configs.into_iter().map(|c| (c.code, c)).collect()
}

/// The configuration for a region code, falling back to US defaults for
/// unknown codes (display metadata is never worth failing a calculation).
pub fn config_for(code: &str) -> RegionalConfig {
    let configs = builtin_configs();
    match configs.get(code) {
        Some(config) => config.clone(),
        None => {
            log::warn!("no regional config for '{code}', falling back to 'us'");
            configs["us"].clone()
        }
    }
}

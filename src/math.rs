//! Decimal arithmetic helpers shared by the calculation modules
//!
//! All monetary math runs on `rust_decimal::Decimal`. Floating point appears
//! only for non-monetary ratios (BMI, solved rates) and at the JSON boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serializer;

use crate::error::EngineError;

/// Round to whole cents, half-away-from-zero (banker's rounding would let
/// schedules drift against hand-checked statements).
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a rate or ratio to the given number of decimal places.
pub fn round_rate(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Integer power by repeated squaring over checked multiplication.
///
/// Loan and growth formulas need `(1 + r)^n` for n up to a few thousand
/// periods; overflow means the inputs were absurd, not that we should wrap.
pub fn pow_u32(base: Decimal, mut exponent: u32) -> Result<Decimal, EngineError> {
    let mut result = Decimal::ONE;
    let mut square = base;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result
                .checked_mul(square)
                .ok_or_else(|| EngineError::calculation("decimal overflow in power"))?;
        }
        exponent >>= 1;
        if exponent > 0 {
            square = square
                .checked_mul(square)
                .ok_or_else(|| EngineError::calculation("decimal overflow in power"))?;
        }
    }
    Ok(result)
}

/// Convert a percentage input (e.g. 6.5 meaning 6.5%) to a ratio.
pub fn percent_to_ratio(percent: Decimal) -> Decimal {
    percent / dec!(100)
}

/// Lossy conversion for the JSON boundary. Values reaching this point are
/// already rounded to display precision.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Serde helper: serialize a decimal amount as a cent-rounded JSON number.
pub fn serialize_money<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(to_f64(round_money(*value)))
}

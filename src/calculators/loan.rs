//! Generic loan calculator and the shared amortization engine
//!
//! The payment formula and schedule builder here are reused by the
//! mortgage, auto and student-loan calculators.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, pow_u32, round_money};
use crate::regions::config_for;
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

/// One row of an amortization schedule.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRecord {
    pub period: u32,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub payment: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub principal: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub interest: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    pub balance: Decimal,
}

/// Closed-form level payment: `P * r * (1+r)^n / ((1+r)^n - 1)`.
/// The zero-rate edge collapses to `P / n` rather than dividing by zero.
pub(crate) fn periodic_payment(
    principal: Decimal,
    rate: Decimal,
    periods: u32,
) -> Result<Decimal, EngineError> {
    if periods == 0 {
        return Err(EngineError::calculation("payment over zero periods"));
    }
    if rate < Decimal::ZERO {
        return Err(EngineError::calculation("negative periodic rate"));
    }
    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let factor = pow_u32(Decimal::ONE + rate, periods)?;
    let denominator = factor - Decimal::ONE;
    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .and_then(|v| v.checked_div(denominator))
        .ok_or_else(|| EngineError::calculation("payment formula overflow"))
}

/// Build the full schedule for a cent-rounded payment.
///
/// Per period: `interest = balance * rate` (cent-rounded), principal is the
/// remainder of the payment; the final period is clamped so the balance ends
/// exactly at zero, absorbing the rounding remainder into the last payment.
pub(crate) fn amortization_schedule(
    principal: Decimal,
    rate: Decimal,
    periods: u32,
    payment: Decimal,
) -> Result<Vec<PaymentRecord>, EngineError> {
    let mut balance = round_money(principal);
    let mut rows = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let interest = round_money(balance * rate);

        let (paid, principal_portion) = if period == periods {
            // Final period absorbs the rounding remainder
            (balance + interest, balance)
        } else {
            let portion = payment - interest;
            if portion <= Decimal::ZERO {
                return Err(EngineError::calculation(
                    "payment does not cover interest; schedule cannot amortize",
                ));
            }
            if portion >= balance {
                (balance + interest, balance)
            } else {
                (payment, portion)
            }
        };

        balance -= principal_portion;
        rows.push(PaymentRecord {
            period,
            payment: paid,
            principal: principal_portion,
            interest,
            balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    if !balance.is_zero() {
        return Err(EngineError::calculation("amortization schedule did not zero out"));
    }
    Ok(rows)
}

/// First 12 rows plus the final row, for result payloads.
pub(crate) fn schedule_sample(rows: &[PaymentRecord]) -> Vec<PaymentRecord> {
    let mut sample: Vec<PaymentRecord> = rows.iter().take(12).cloned().collect();
    if rows.len() > 12 {
        sample.push(rows[rows.len() - 1].clone());
    }
    sample
}

struct LoanInputs {
    principal: Decimal,
    monthly_rate: Decimal,
    months: u32,
    extra_payment: Decimal,
}

impl LoanInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let principal = reader.decimal("loan_amount", Some(dec!(0.01)), Some(dec!(1000000000)));
        let annual_rate = reader.decimal("annual_rate", Some(Decimal::ZERO), Some(dec!(100)));
        let years = reader.integer("term_years", Some(1), Some(100));
        let extra = reader.decimal_or("extra_monthly_payment", Decimal::ZERO, Some(Decimal::ZERO), None);
        reader.finish()?;

        Ok(Self {
            principal,
            monthly_rate: percent_to_ratio(annual_rate) / dec!(12),
            months: (years as u32) * 12,
            extra_payment: extra,
        })
    }
}

pub struct LoanCalculator {
    descriptor: CalculatorDescriptor,
}

impl LoanCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "loan",
                "Loan Payment",
                vec![
                    FieldSpec::required("loan_amount", "Loan amount"),
                    FieldSpec::required("annual_rate", "Annual interest rate (%)"),
                    FieldSpec::required("term_years", "Term (years)"),
                    FieldSpec::optional("extra_monthly_payment", "Extra monthly payment"),
                ],
            ),
        }
    }
}

impl Default for LoanCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for LoanCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match LoanInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = LoanInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &LoanInputs) -> Result<CalculationResult, EngineError> {
    let payment = round_money(periodic_payment(inputs.principal, inputs.monthly_rate, inputs.months)?);
    let schedule = amortization_schedule(inputs.principal, inputs.monthly_rate, inputs.months, payment)?;

    let total_paid: Decimal = schedule.iter().map(|row| row.payment).sum();
    let total_interest: Decimal = schedule.iter().map(|row| row.interest).sum();
    let config = config_for("us");

    let mut result = CalculationResult::new();
    result.set_money("monthly_payment", payment);
    result.set_text("monthly_payment_formatted", config.format_amount(payment));
    result.set_money("total_paid", total_paid);
    result.set_money("total_interest", total_interest);
    result.set_int("number_of_payments", schedule.len() as i64);
    result.set_rows("amortization_sample", &schedule_sample(&schedule));

    if inputs.extra_payment > Decimal::ZERO {
        let accelerated = amortization_schedule(
            inputs.principal,
            inputs.monthly_rate,
            inputs.months,
            payment + inputs.extra_payment,
        )?;
        let accelerated_interest: Decimal = accelerated.iter().map(|row| row.interest).sum();
        result.set_int("accelerated_payments", accelerated.len() as i64);
        result.set_int("months_saved", schedule.len() as i64 - accelerated.len() as i64);
        result.set_money("interest_saved", total_interest - accelerated_interest);
    }

    Ok(result)
}

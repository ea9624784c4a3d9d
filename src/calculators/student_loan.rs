//! Student loan repayment across federal plan variants
//!
//! Plans are declarative configuration rows: amortized plans carry a term,
//! income-driven plans carry a share of discretionary income, a poverty
//! multiplier, and explicit unpaid-interest handling (capitalization or
//! subsidy). Calculation code reads the row; it never branches on plan name.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculators::loan::periodic_payment;
use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, pow_u32, round_money};
use crate::regions::poverty_guideline;
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

/// How a repayment plan computes the monthly payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlanKind {
    /// Level amortization over the plan term.
    Amortized,
    /// Payments start low and step up at fixed intervals over the term.
    Graduated,
    /// Payment is a share of discretionary income, floored at zero.
    IncomeDriven,
}

/// Graduated plan: payments step up this much every step interval.
const GRADUATED_STEP_MONTHS: u32 = 24;
const GRADUATED_GROWTH: Decimal = dec!(0.10);

/// One repayment plan's configuration.
struct RepaymentPlan {
    code: &'static str,
    label: &'static str,
    kind: PlanKind,
    term_years: u32,
    /// Share of annual discretionary income paid per year (income-driven).
    income_share: Decimal,
    /// Poverty-guideline multiplier defining discretionary income.
    poverty_multiplier: Decimal,
    /// Whether unpaid interest is added to principal.
    unpaid_interest_capitalizes: bool,
    /// Share of unpaid interest the plan subsidizes (waives).
    subsidized_share: Decimal,
}

const PLANS: &[RepaymentPlan] = &[
    RepaymentPlan {
        code: "standard",
        label: "Standard (10-year)",
        kind: PlanKind::Amortized,
        term_years: 10,
        income_share: dec!(0),
        poverty_multiplier: dec!(0),
        unpaid_interest_capitalizes: false,
        subsidized_share: dec!(0),
    },
    RepaymentPlan {
        code: "graduated",
        label: "Graduated (10-year)",
        kind: PlanKind::Graduated,
        term_years: 10,
        income_share: dec!(0),
        poverty_multiplier: dec!(0),
        unpaid_interest_capitalizes: false,
        subsidized_share: dec!(0),
    },
    RepaymentPlan {
        code: "extended",
        label: "Extended (25-year)",
        kind: PlanKind::Amortized,
        term_years: 25,
        income_share: dec!(0),
        poverty_multiplier: dec!(0),
        unpaid_interest_capitalizes: false,
        subsidized_share: dec!(0),
    },
    RepaymentPlan {
        code: "ibr",
        label: "Income-Based Repayment (IBR)",
        kind: PlanKind::IncomeDriven,
        term_years: 25,
        income_share: dec!(0.15),
        poverty_multiplier: dec!(1.5),
        unpaid_interest_capitalizes: true,
        subsidized_share: dec!(0),
    },
    RepaymentPlan {
        code: "paye",
        label: "Pay As You Earn (PAYE)",
        kind: PlanKind::IncomeDriven,
        term_years: 20,
        income_share: dec!(0.10),
        poverty_multiplier: dec!(1.5),
        unpaid_interest_capitalizes: true,
        subsidized_share: dec!(0),
    },
    RepaymentPlan {
        code: "save",
        label: "Saving on a Valuable Education (SAVE)",
        kind: PlanKind::IncomeDriven,
        term_years: 20,
        income_share: dec!(0.10),
        poverty_multiplier: dec!(2.25),
        unpaid_interest_capitalizes: false,
        subsidized_share: dec!(1.0),
    },
    RepaymentPlan {
        code: "icr",
        label: "Income-Contingent Repayment (ICR)",
        kind: PlanKind::IncomeDriven,
        term_years: 25,
        income_share: dec!(0.20),
        poverty_multiplier: dec!(1.0),
        unpaid_interest_capitalizes: true,
        subsidized_share: dec!(0),
    },
];

fn plan_codes() -> Vec<&'static str> {
    PLANS.iter().map(|p| p.code).collect()
}

fn find_plan(code: &str) -> Option<&'static RepaymentPlan> {
    PLANS.iter().find(|p| p.code == code)
}

struct StudentLoanInputs {
    balance: Decimal,
    monthly_rate: Decimal,
    plan: &'static RepaymentPlan,
    agi: Decimal,
    family_size: i64,
}

impl StudentLoanInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let balance = reader.decimal("loan_balance", Some(dec!(0.01)), Some(dec!(10000000)));
        let annual_rate = reader.decimal("annual_rate", Some(Decimal::ZERO), Some(dec!(100)));
        let codes = plan_codes();
        let plan_code = reader.code_or("plan", "standard", &codes);
        let agi = reader.decimal_or("adjusted_gross_income", Decimal::ZERO, Some(Decimal::ZERO), None);
        let family_size = reader.integer_or("family_size", 1, Some(1), Some(20));

        // find_plan cannot fail after code_or validated against `codes`
        let plan = find_plan(&plan_code).unwrap_or(&PLANS[0]);
        if plan.kind == PlanKind::IncomeDriven && !reader.has("adjusted_gross_income") {
            reader.reject("adjusted_gross_income is required for income-driven plans");
        }
        reader.finish()?;

        Ok(Self {
            balance,
            monthly_rate: percent_to_ratio(annual_rate) / dec!(12),
            plan,
            agi,
            family_size,
        })
    }
}

pub struct StudentLoanCalculator {
    descriptor: CalculatorDescriptor,
}

impl StudentLoanCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "student-loan",
                "Student Loan Repayment",
                vec![
                    FieldSpec::required("loan_balance", "Loan balance"),
                    FieldSpec::required("annual_rate", "Annual interest rate (%)"),
                    FieldSpec::optional("plan", "Repayment plan"),
                    FieldSpec::optional("adjusted_gross_income", "Adjusted gross income"),
                    FieldSpec::optional("family_size", "Family size"),
                ],
            ),
        }
    }
}

impl Default for StudentLoanCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for StudentLoanCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match StudentLoanInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = StudentLoanInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &StudentLoanInputs) -> Result<CalculationResult, EngineError> {
    let plan = inputs.plan;
    let mut result = CalculationResult::new();
    result.set_text("plan", plan.label);
    result.set_int("term_years", plan.term_years as i64);

    match plan.kind {
        PlanKind::Amortized => {
            let months = plan.term_years * 12;
            let payment = round_money(periodic_payment(inputs.balance, inputs.monthly_rate, months)?);
            let total_paid = payment * Decimal::from(months);
            result.set_money("monthly_payment", payment);
            result.set_money("total_paid", total_paid);
            result.set_money("total_interest", total_paid - inputs.balance);
        }
        PlanKind::Graduated => {
            let months = plan.term_years * 12;
            let first = graduated_first_payment(inputs.balance, inputs.monthly_rate, months)?;
            let steps = months / GRADUATED_STEP_MONTHS;
            let growth = pow_u32(Decimal::ONE + GRADUATED_GROWTH, steps - 1)?;
            let last = round_money(first * growth);

            let mut total_paid = Decimal::ZERO;
            let mut step_payment = first;
            for _ in 0..steps {
                total_paid += step_payment * Decimal::from(GRADUATED_STEP_MONTHS);
                step_payment = round_money(step_payment * (Decimal::ONE + GRADUATED_GROWTH));
            }

            result.set_money("first_monthly_payment", first);
            result.set_money("last_monthly_payment", last);
            result.set_money("total_paid", total_paid);
            result.set_money("total_interest", total_paid - inputs.balance);

            let first_month_interest = round_money(inputs.balance * inputs.monthly_rate);
            if first < first_month_interest {
                result.warn("early payments do not cover interest; the balance grows before later steps catch up");
            }
        }
        PlanKind::IncomeDriven => {
            let guideline = poverty_guideline(inputs.family_size);
            let discretionary =
                (inputs.agi - guideline * plan.poverty_multiplier).max(Decimal::ZERO);
            let payment = round_money(discretionary * plan.income_share / dec!(12));
            let monthly_interest = round_money(inputs.balance * inputs.monthly_rate);

            result.set_money("discretionary_income", discretionary);
            result.set_money("monthly_payment", payment);
            result.set_money("monthly_interest", monthly_interest);

            if payment < monthly_interest {
                let unpaid = monthly_interest - payment;
                let waived = round_money(unpaid * plan.subsidized_share);
                let accruing = unpaid - waived;
                result.set_money("unpaid_interest_monthly", unpaid);
                result.set_money("subsidized_interest_monthly", waived);
                result.set_bool("unpaid_interest_capitalizes", plan.unpaid_interest_capitalizes);
                result.set_money(
                    "balance_after_one_year",
                    projected_balance_after_year(inputs.balance, payment, inputs.monthly_rate, plan),
                );
                if accruing > Decimal::ZERO {
                    result.warn("payment does not cover interest; the balance will grow");
                }
            } else {
                result.set_money("unpaid_interest_monthly", Decimal::ZERO);
                result.set_money(
                    "balance_after_one_year",
                    projected_balance_after_year(inputs.balance, payment, inputs.monthly_rate, plan),
                );
            }
        }
    }
    Ok(result)
}

/// Starting payment for a graduated schedule, from the present-value
/// identity: the principal equals the sum of each step's payment block
/// discounted to origination. Closed form, no iteration.
fn graduated_first_payment(
    principal: Decimal,
    monthly_rate: Decimal,
    months: u32,
) -> Result<Decimal, EngineError> {
    let steps = months / GRADUATED_STEP_MONTHS;
    if steps == 0 {
        return Err(EngineError::calculation("graduated term shorter than one step"));
    }

    // PV of one payment per month over a step, at origination of that step
    let block_pv = if monthly_rate.is_zero() {
        Decimal::from(GRADUATED_STEP_MONTHS)
    } else {
        let compounded = pow_u32(Decimal::ONE + monthly_rate, GRADUATED_STEP_MONTHS)?;
        let inverse = Decimal::ONE
            .checked_div(compounded)
            .ok_or_else(|| EngineError::calculation("degenerate discount factor"))?;
        (Decimal::ONE - inverse) / monthly_rate
    };

    let mut denominator = Decimal::ZERO;
    for step in 0..steps {
        let growth = pow_u32(Decimal::ONE + GRADUATED_GROWTH, step)?;
        let discount = if monthly_rate.is_zero() {
            Decimal::ONE
        } else {
            let compounded = pow_u32(Decimal::ONE + monthly_rate, step * GRADUATED_STEP_MONTHS)?;
            Decimal::ONE
                .checked_div(compounded)
                .ok_or_else(|| EngineError::calculation("degenerate discount factor"))?
        };
        denominator += growth * block_pv * discount;
    }

    let first = principal
        .checked_div(denominator)
        .ok_or_else(|| EngineError::calculation("graduated payment denominator is zero"))?;
    Ok(round_money(first))
}

/// Twelve-month balance projection under the plan's unpaid-interest rule.
fn projected_balance_after_year(
    balance: Decimal,
    payment: Decimal,
    monthly_rate: Decimal,
    plan: &RepaymentPlan,
) -> Decimal {
    let mut principal = balance;
    let mut accrued_unpaid = Decimal::ZERO;

    for _ in 0..12 {
        let interest = round_money(principal * monthly_rate);
        if payment >= interest {
            let principal_portion = (payment - interest).min(principal);
            principal -= principal_portion;
        } else {
            let unpaid = interest - payment;
            let accruing = unpaid - round_money(unpaid * plan.subsidized_share);
            if plan.unpaid_interest_capitalizes {
                principal += accruing;
            } else {
                accrued_unpaid += accruing;
            }
        }
    }
    principal + accrued_unpaid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(json: serde_json::Value) -> InputSet {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_standard_plan_amortizes_over_ten_years() {
        let calc = StudentLoanCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "loan_balance": 30000,
                "annual_rate": 5.0,
            })))
            .unwrap();

        // 30,000 at 5% over 120 months: ~318.20/month
        assert_eq!(result.get("monthly_payment").unwrap(), &serde_json::json!(318.20));
        assert_eq!(result.get("term_years").unwrap(), &serde_json::json!(10));
    }

    #[test]
    fn test_graduated_starts_low_and_steps_up() {
        let calc = StudentLoanCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "loan_balance": 30000,
                "annual_rate": 5.0,
                "plan": "graduated",
            })))
            .unwrap();

        let first = result.get("first_monthly_payment").unwrap().as_f64().unwrap();
        let last = result.get("last_monthly_payment").unwrap().as_f64().unwrap();
        // Brackets the standard plan's level 318.20 payment
        assert!(first < 318.20, "first payment {first}");
        assert!(last > 318.20, "last payment {last}");
        // Five steps of 10%: last = first * 1.1^4
        assert!((last - first * 1.1_f64.powi(4)).abs() < 0.02);

        // Lower early payments cost more interest than the standard plan
        let interest = result.get("total_interest").unwrap().as_f64().unwrap();
        assert!(interest > 8184.0);
    }

    #[test]
    fn test_income_driven_payment_from_discretionary_income() {
        let calc = StudentLoanCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "loan_balance": 40000,
                "annual_rate": 6.0,
                "plan": "paye",
                "adjusted_gross_income": 45000,
                "family_size": 1,
            })))
            .unwrap();

        // discretionary = 45000 - 15060*1.5 = 22410; 10%/12 = 186.75
        assert_eq!(result.get("discretionary_income").unwrap(), &serde_json::json!(22410.0));
        assert_eq!(result.get("monthly_payment").unwrap(), &serde_json::json!(186.75));
    }

    #[test]
    fn test_payment_floors_at_zero() {
        let calc = StudentLoanCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "loan_balance": 20000,
                "annual_rate": 5.0,
                "plan": "save",
                "adjusted_gross_income": 20000,
                "family_size": 3,
            })))
            .unwrap();

        // 20,000 AGI is far below 225% of the guideline for a family of 3
        assert_eq!(result.get("monthly_payment").unwrap(), &serde_json::json!(0.0));
    }

    #[test]
    fn test_save_subsidy_prevents_balance_growth() {
        let calc = StudentLoanCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "loan_balance": 50000,
                "annual_rate": 6.0,
                "plan": "save",
                "adjusted_gross_income": 30000,
                "family_size": 2,
            })))
            .unwrap();

        // SAVE waives all unpaid interest: balance cannot exceed the start
        let after = result.get("balance_after_one_year").unwrap().as_f64().unwrap();
        assert!(after <= 50000.0);
        assert_eq!(
            result.get("unpaid_interest_capitalizes").unwrap(),
            &serde_json::json!(false)
        );
    }

    #[test]
    fn test_ibr_capitalizes_unpaid_interest() {
        let calc = StudentLoanCalculator::new();
        let result = calc
            .calculate(&inputs(serde_json::json!({
                "loan_balance": 80000,
                "annual_rate": 7.0,
                "plan": "ibr",
                "adjusted_gross_income": 30000,
                "family_size": 1,
            })))
            .unwrap();

        let after = result.get("balance_after_one_year").unwrap().as_f64().unwrap();
        assert!(after > 80000.0);
        assert!(!result.warnings().is_empty());
    }

    #[test]
    fn test_income_driven_requires_agi() {
        let calc = StudentLoanCalculator::new();
        let validation = calc.validate(&inputs(serde_json::json!({
            "loan_balance": 30000,
            "annual_rate": 5.0,
            "plan": "ibr",
        })));
        assert!(!validation.is_ok());
        assert!(validation.errors()[0].contains("adjusted_gross_income"));
    }
}

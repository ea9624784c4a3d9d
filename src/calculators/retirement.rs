//! Retirement savings projection with employer matching
//!
//! Year-by-year simulation: salary grows annually, the employee defers a
//! fixed share, the employer matches a share of that deferral capped at a
//! percentage of salary, and the balance compounds at the assumed return.
//! Contributions land at year end, after the year's growth.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::EngineError;
use crate::inputs::InputSet;
use crate::math::{percent_to_ratio, round_money};
use crate::registry::{Calculator, CalculatorDescriptor, FieldSpec};
use crate::result::CalculationResult;
use crate::validation::{FieldReader, ValidationResult};

#[derive(Debug, Clone, Serialize)]
struct YearRow {
    age: i64,
    #[serde(serialize_with = "crate::math::serialize_money")]
    salary: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    employee_contribution: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    employer_match: Decimal,
    #[serde(serialize_with = "crate::math::serialize_money")]
    balance: Decimal,
}

struct RetirementInputs {
    current_age: i64,
    retirement_age: i64,
    current_balance: Decimal,
    annual_salary: Decimal,
    contribution_rate: Decimal,
    match_rate: Decimal,
    match_cap_rate: Decimal,
    salary_growth: Decimal,
    annual_return: Decimal,
}

impl RetirementInputs {
    fn parse(inputs: &InputSet) -> Result<Self, Vec<String>> {
        let mut reader = FieldReader::new(inputs);
        let current_age = reader.integer("current_age", Some(16), Some(100));
        let retirement_age = reader.integer("retirement_age", Some(17), Some(110));
        let balance = reader.decimal_or("current_balance", Decimal::ZERO, Some(Decimal::ZERO), None);
        let salary = reader.decimal("annual_salary", Some(dec!(0.01)), Some(dec!(100000000)));
        let contribution = reader.decimal("contribution_percent", Some(Decimal::ZERO), Some(dec!(100)));
        let match_rate = reader.decimal_or("employer_match_percent", Decimal::ZERO, Some(Decimal::ZERO), Some(dec!(200)));
        let match_cap = reader.decimal_or("employer_match_cap_percent", dec!(6), Some(Decimal::ZERO), Some(dec!(100)));
        let growth = reader.decimal_or("salary_growth_percent", Decimal::ZERO, Some(Decimal::ZERO), Some(dec!(50)));
        let annual_return = reader.decimal_or("annual_return_percent", dec!(7), Some(Decimal::ZERO), Some(dec!(100)));

        if retirement_age <= current_age {
            reader.reject("retirement_age must be greater than current_age");
        }
        reader.finish()?;

        Ok(Self {
            current_age,
            retirement_age,
            current_balance: balance,
            annual_salary: salary,
            contribution_rate: percent_to_ratio(contribution),
            match_rate: percent_to_ratio(match_rate),
            match_cap_rate: percent_to_ratio(match_cap),
            salary_growth: percent_to_ratio(growth),
            annual_return: percent_to_ratio(annual_return),
        })
    }
}

pub struct RetirementCalculator {
    descriptor: CalculatorDescriptor,
}

impl RetirementCalculator {
    pub fn new() -> Self {
        Self {
            descriptor: CalculatorDescriptor::new(
                "retirement",
                "Retirement Savings Projection",
                vec![
                    FieldSpec::required("current_age", "Current age"),
                    FieldSpec::required("retirement_age", "Retirement age"),
                    FieldSpec::required("annual_salary", "Annual salary"),
                    FieldSpec::required("contribution_percent", "Employee contribution (% of salary)"),
                    FieldSpec::optional("current_balance", "Current balance"),
                    FieldSpec::optional("employer_match_percent", "Employer match (% of deferral)"),
                    FieldSpec::optional("employer_match_cap_percent", "Match cap (% of salary)"),
                    FieldSpec::optional("salary_growth_percent", "Annual salary growth (%)"),
                    FieldSpec::optional("annual_return_percent", "Annual return (%)"),
                ],
            ),
        }
    }
}

impl Default for RetirementCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator for RetirementCalculator {
    fn descriptor(&self) -> &CalculatorDescriptor {
        &self.descriptor
    }

    fn validate(&self, inputs: &InputSet) -> ValidationResult {
        match RetirementInputs::parse(inputs) {
            Ok(_) => ValidationResult::ok(),
            Err(errors) => ValidationResult::from_errors(errors),
        }
    }

    fn calculate(&self, inputs: &InputSet) -> Result<CalculationResult, EngineError> {
        let parsed = RetirementInputs::parse(inputs).map_err(EngineError::Validation)?;
        compute(&parsed)
    }
}

fn compute(inputs: &RetirementInputs) -> Result<CalculationResult, EngineError> {
    let mut balance = inputs.current_balance;
    let mut salary = inputs.annual_salary;
    let mut total_employee = Decimal::ZERO;
    let mut total_employer = Decimal::ZERO;
    let mut rows = Vec::new();

    for age in inputs.current_age..inputs.retirement_age {
        let employee = round_money(salary * inputs.contribution_rate);
        // Match a share of the deferral, capped at a slice of salary
        let matchable = employee.min(salary * inputs.match_cap_rate);
        let employer = round_money(matchable * inputs.match_rate);

        balance = balance * (Decimal::ONE + inputs.annual_return) + employee + employer;
        total_employee += employee;
        total_employer += employer;

        rows.push(YearRow {
            age: age + 1,
            salary,
            employee_contribution: employee,
            employer_match: employer,
            balance,
        });
        salary *= Decimal::ONE + inputs.salary_growth;
    }

    let total_contributed = inputs.current_balance + total_employee + total_employer;

    let mut result = CalculationResult::new();
    result.set_int("years_to_retirement", inputs.retirement_age - inputs.current_age);
    result.set_money("projected_balance", balance);
    result.set_money("total_employee_contributions", total_employee);
    result.set_money("total_employer_match", total_employer);
    result.set_money("investment_growth", balance - total_contributed);

    // First five years and the final year are enough for a payload
    let sample: Vec<&YearRow> = if rows.len() > 6 {
        rows.iter().take(5).chain(rows.last()).collect()
    } else {
        rows.iter().collect()
    };
    result.set_rows("yearly_sample", &sample);

    if inputs.contribution_rate < inputs.match_cap_rate && inputs.match_rate > Decimal::ZERO {
        result.warn("contribution is below the employer match cap; some match is left unclaimed");
    }
    Ok(result)
}

//! Compound growth of a lump sum with regular contributions.
//!
//! ```text
//! FV = P(1 + i)^N + C · ((1 + i)^N − 1) / i
//! ```
//!
//! `i` is the rate per compounding period, `N` the number of periods and `C`
//! the contribution made at the end of each period. At `i = 0` the second term
//! is `C · N`.
//!
//! | Frequency  | Periods / year |
//! |------------|----------------|
//! | annually   | 1              |
//! | semiannual | 2              |
//! | quarterly  | 4              |
//! | monthly    | 12             |
//! | daily      | 365            |

use serde::{Deserialize, Serialize};

use crate::calculations::common::{ensure_non_negative, ensure_positive, ensure_whole};
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField,
};

const COMPOUND: &str = "compound-interest";

const COMPOUNDING: &[(&str, u32)] = &[
    ("monthly", 12),
    ("annually", 1),
    ("semiannual", 2),
    ("quarterly", 4),
    ("daily", 365),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthInput {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub years: f64,
    pub periods_per_year: u32,
    /// Contribution added at the end of every compounding period.
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthResult {
    pub future_value: f64,
    pub total_contributions: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthYear {
    pub year: u32,
    pub balance: f64,
    pub contributed: f64,
}

/// Future value after `periods` periods at periodic rate `rate`.
pub fn future_value(
    principal: f64,
    rate: f64,
    periods: f64,
    contribution: f64,
) -> f64 {
    let growth_less_one = (periods * rate.ln_1p()).exp_m1();
    let annuity = if rate == 0.0 || growth_less_one == 0.0 {
        contribution * periods
    } else {
        contribution * growth_less_one / rate
    };
    principal * (growth_less_one + 1.0) + annuity
}

/// # Errors
///
/// [`CalcError::Domain`] for negative amounts or a non-positive horizon.
pub fn calculate(input: &GrowthInput) -> CalcResult<GrowthResult> {
    ensure_non_negative(COMPOUND, "Initial deposit", input.principal)?;
    ensure_non_negative(COMPOUND, "Contribution", input.contribution)?;
    ensure_positive(COMPOUND, "Years", input.years)?;
    if input.periods_per_year == 0 {
        return Err(CalcError::domain(COMPOUND, "compounding frequency must be at least once a year"));
    }

    let periods_per_year = f64::from(input.periods_per_year);
    let rate = input.annual_rate_percent / 100.0 / periods_per_year;
    let periods = input.years * periods_per_year;

    let future = future_value(input.principal, rate, periods, input.contribution);
    let total_contributions = input.principal + input.contribution * periods;

    Ok(GrowthResult {
        future_value: future,
        total_contributions,
        total_interest: future - total_contributions,
    })
}

/// Balance at the end of each whole year.
pub fn yearly_balances(input: &GrowthInput) -> Vec<GrowthYear> {
    let periods_per_year = f64::from(input.periods_per_year.max(1));
    let rate = input.annual_rate_percent / 100.0 / periods_per_year;
    let whole_years = input.years.floor().max(0.0) as u32;

    (1..=whole_years)
        .map(|year| {
            let periods = f64::from(year) * periods_per_year;
            GrowthYear {
                year,
                balance: future_value(input.principal, rate, periods, input.contribution),
                contributed: input.principal + input.contribution * periods,
            }
        })
        .collect()
}

pub struct CompoundInterestCalculator;

impl Calculator for CompoundInterestCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: COMPOUND,
            title: "Compound Interest Calculator",
            category: Category::Finance,
            description: "Growth of savings with compounding and regular contributions.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        let frequencies: Vec<&str> = COMPOUNDING.iter().map(|(name, _)| *name).collect();
        vec![
            InputField::number("principal", "Initial deposit", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number("rate", "Annual interest rate", FieldConstraints::required().range(-100.0, 100.0))
                .with_unit("%"),
            InputField::number("years", "Years", FieldConstraints::required().range(0.0, 100.0))
                .with_unit("years"),
            InputField::choice("frequency", "Compounding", &frequencies),
            InputField::number(
                "contribution",
                "Contribution per period",
                FieldConstraints::optional().min(0.0),
            )
            .with_unit("$"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let frequency = request.text("frequency")?;
        let periods_per_year = COMPOUNDING
            .iter()
            .find(|(name, _)| *name == frequency)
            .map(|(_, n)| *n)
            .ok_or_else(|| CalcError::domain(COMPOUND, format!("unknown compounding '{frequency}'")))?;

        let input = GrowthInput {
            principal: request.number("principal")?,
            annual_rate_percent: request.number("rate")?,
            years: request.number("years")?,
            periods_per_year,
            contribution: request.optional_number("contribution").unwrap_or(0.0),
        };
        let result = calculate(&input)?;

        let chart = yearly_balances(&input).into_iter().fold(
            ChartSeries::new(ChartKind::Line),
            |chart, year| chart.point(format!("Year {}", year.year), year.balance),
        );

        Ok(CalculationResult::new(ResultField::currency("Future value", result.future_value))
            .field(ResultField::currency("Total contributions", result.total_contributions))
            .field(ResultField::currency("Interest earned", result.total_interest))
            .formula("FV = P(1 + i)^N + C × ((1 + i)^N − 1) ÷ i")
            .chart(chart))
    }
}

// =============================================================================
// Roth IRA
// =============================================================================

/// Annual contribution limit for savers under 50.
pub const ROTH_LIMIT: f64 = 7_000.0;
/// Limit including the catch-up contribution from age 50.
pub const ROTH_CATCH_UP_LIMIT: f64 = 8_000.0;
pub const CATCH_UP_AGE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RothInput {
    pub balance: f64,
    pub annual_contribution: f64,
    pub current_age: u32,
    pub retirement_age: u32,
    pub annual_return_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RothResult {
    pub balance_at_retirement: f64,
    pub total_contributions: f64,
    pub growth: f64,
    pub yearly: Vec<GrowthYear>,
}

/// Contribution allowed at `age`, capped at the IRS limit for that age.
pub fn capped_contribution(
    requested: f64,
    age: u32,
) -> f64 {
    let limit = if age >= CATCH_UP_AGE {
        ROTH_CATCH_UP_LIMIT
    } else {
        ROTH_LIMIT
    };
    requested.min(limit)
}

/// Projects a Roth IRA year by year. The balance compounds once a year and
/// the capped contribution lands at the end of the year (ordinary annuity).
pub fn project_roth(input: &RothInput) -> CalcResult<RothResult> {
    ensure_non_negative("roth-ira", "Current balance", input.balance)?;
    ensure_non_negative("roth-ira", "Annual contribution", input.annual_contribution)?;
    if input.retirement_age <= input.current_age {
        return Err(CalcError::domain(
            "roth-ira",
            "retirement age must be after current age",
        ));
    }

    let rate = input.annual_return_percent / 100.0;
    let mut balance = input.balance;
    let mut contributed = input.balance;
    let mut yearly = Vec::new();

    for (year, age) in (input.current_age..input.retirement_age).zip(1..) {
        let contribution = capped_contribution(input.annual_contribution, year);
        balance = balance * (1.0 + rate) + contribution;
        contributed += contribution;
        yearly.push(GrowthYear {
            year: age,
            balance,
            contributed,
        });
    }

    Ok(RothResult {
        balance_at_retirement: balance,
        total_contributions: contributed,
        growth: balance - contributed,
        yearly,
    })
}

pub struct RothIraCalculator;

impl Calculator for RothIraCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "roth-ira",
            title: "Roth IRA Calculator",
            category: Category::Finance,
            description: "Tax-free balance at retirement with annual contribution limits.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("balance", "Current balance", FieldConstraints::required().min(0.0))
                .with_unit("$")
                .with_default("0"),
            InputField::number(
                "contribution",
                "Annual contribution",
                FieldConstraints::required().min(0.0),
            )
            .with_unit("$")
            .with_default("7000"),
            InputField::number("current_age", "Current age", FieldConstraints::required().range(0.0, 120.0).step(1.0)),
            InputField::number(
                "retirement_age",
                "Retirement age",
                FieldConstraints::required().range(0.0, 120.0).step(1.0),
            )
            .with_default("65"),
            InputField::number(
                "return",
                "Expected annual return",
                FieldConstraints::required().range(-50.0, 50.0),
            )
            .with_unit("%")
            .with_default("6"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let current_age = request.number("current_age")?;
        let retirement_age = request.number("retirement_age")?;
        ensure_whole("roth-ira", "Current age", current_age)?;
        ensure_whole("roth-ira", "Retirement age", retirement_age)?;

        let result = project_roth(&RothInput {
            balance: request.number("balance")?,
            annual_contribution: request.number("contribution")?,
            current_age: current_age as u32,
            retirement_age: retirement_age as u32,
            annual_return_percent: request.number("return")?,
        })?;

        let chart = result.yearly.iter().fold(ChartSeries::new(ChartKind::Line), |chart, y| {
            chart.point(format!("Age {}", current_age as u32 + y.year), y.balance)
        });

        Ok(CalculationResult::new(ResultField::currency(
            "Balance at retirement",
            result.balance_at_retirement,
        ))
        .field(ResultField::currency("Total contributions", result.total_contributions))
        .field(ResultField::currency("Tax-free growth", result.growth))
        .formula("B(t+1) = B(t) × (1 + r) + min(C, limit)")
        .chart(chart))
    }
}

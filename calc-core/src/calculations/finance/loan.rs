//! Amortizing loan payments.
//!
//! The loan, mortgage, car loan and refinance pages all reduce to the same
//! annuity formula:
//!
//! ```text
//! M = P · r · (1 + r)^n / ((1 + r)^n − 1)
//! ```
//!
//! where `r` is the periodic rate (annual rate ÷ periods per year) and `n` the
//! total number of periods. At `r = 0` the payment is `P / n`. Total interest
//! is `M · n − P`.
//!
//! # Example
//!
//! ```
//! use calc_core::calculations::finance::loan::{LoanInput, calculate};
//!
//! let result = calculate(&LoanInput {
//!     principal: 200_000.0,
//!     annual_rate_percent: 6.0,
//!     term_years: 30.0,
//!     periods_per_year: 12,
//! })
//! .unwrap();
//!
//! assert!((result.periodic_payment - 1199.10).abs() < 0.01);
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::common::{ensure_non_negative, ensure_positive};
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField,
};

const LOAN: &str = "loan";

/// Payment frequencies offered on the form, with their periods per year.
const FREQUENCIES: &[(&str, u32)] = &[
    ("monthly", 12),
    ("biweekly", 26),
    ("weekly", 52),
    ("quarterly", 4),
    ("semiannual", 2),
    ("annual", 1),
];

fn periods_for(frequency: &str) -> CalcResult<u32> {
    FREQUENCIES
        .iter()
        .find(|(name, _)| *name == frequency)
        .map(|(_, periods)| *periods)
        .ok_or_else(|| CalcError::domain(LOAN, format!("unknown payment frequency '{frequency}'")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: f64,
    pub annual_rate_percent: f64,
    pub term_years: f64,
    pub periods_per_year: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub periodic_payment: f64,
    pub periodic_rate: f64,
    pub number_of_periods: u32,
    pub total_paid: f64,
    pub total_interest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: u32,
    pub interest: f64,
    pub principal: f64,
    pub end_balance: f64,
}

/// Payment per period for `principal` at periodic rate `rate` over `periods`.
///
/// Callers guarantee `periods > 0`. `(1 + r)^n − 1` goes through
/// `ln_1p`/`exp_m1` so rates too small to move `1 + r` still amortize to
/// `P / n` instead of dividing by zero.
pub fn periodic_payment(
    principal: f64,
    rate: f64,
    periods: f64,
) -> f64 {
    let growth_less_one = (periods * rate.ln_1p()).exp_m1();
    if rate == 0.0 || growth_less_one == 0.0 {
        return principal / periods;
    }
    principal * rate * (growth_less_one + 1.0) / growth_less_one
}

/// Calculates the amortized payment and totals.
///
/// # Errors
///
/// [`CalcError::Domain`] when the principal or term is not positive, the rate
/// is negative, or the term rounds to zero payments.
pub fn calculate(input: &LoanInput) -> CalcResult<LoanResult> {
    ensure_positive(LOAN, "Loan amount", input.principal)?;
    ensure_non_negative(LOAN, "Interest rate", input.annual_rate_percent)?;
    ensure_positive(LOAN, "Loan term", input.term_years)?;
    if input.periods_per_year == 0 {
        return Err(CalcError::domain(LOAN, "payments per year must be at least one"));
    }

    let periods = (input.term_years * f64::from(input.periods_per_year)).round();
    if periods < 1.0 {
        return Err(CalcError::domain(LOAN, "loan term is shorter than one payment"));
    }

    let rate = input.annual_rate_percent / 100.0 / f64::from(input.periods_per_year);
    let payment = periodic_payment(input.principal, rate, periods);
    let total_paid = payment * periods;

    Ok(LoanResult {
        periodic_payment: payment,
        periodic_rate: rate,
        number_of_periods: periods as u32,
        total_paid,
        total_interest: total_paid - input.principal,
    })
}

/// Period-by-period breakdown of an amortizing loan.
///
/// The final balance is clamped to zero to absorb floating-point drift.
pub fn schedule(
    principal: f64,
    rate: f64,
    periods: u32,
) -> Vec<AmortizationRow> {
    if periods == 0 {
        return Vec::new();
    }
    let payment = periodic_payment(principal, rate, f64::from(periods));
    let mut balance = principal;

    (1..=periods)
        .map(|period| {
            let interest = balance * rate;
            let principal_part = payment - interest;
            balance -= principal_part;
            if period == periods || balance.abs() < 1e-6 {
                balance = 0.0;
            }
            AmortizationRow {
                period,
                payment,
                interest,
                principal: principal_part,
                balance,
            }
        })
        .collect()
}

/// Groups a schedule into calendar years of `periods_per_year` rows.
pub fn yearly_summary(
    rows: &[AmortizationRow],
    periods_per_year: u32,
) -> Vec<YearSummary> {
    if periods_per_year == 0 {
        return Vec::new();
    }
    rows.chunks(periods_per_year as usize)
        .zip(1..)
        .map(|(chunk, year)| YearSummary {
            year,
            interest: chunk.iter().map(|r| r.interest).sum(),
            principal: chunk.iter().map(|r| r.principal).sum(),
            end_balance: chunk.last().map_or(0.0, |r| r.balance),
        })
        .collect()
}

fn payment_label(periods_per_year: u32) -> &'static str {
    match periods_per_year {
        12 => "Monthly payment",
        26 => "Biweekly payment",
        52 => "Weekly payment",
        4 => "Quarterly payment",
        2 => "Semiannual payment",
        1 => "Annual payment",
        _ => "Payment",
    }
}

fn rate_field() -> InputField {
    InputField::number(
        "rate",
        "Interest rate",
        FieldConstraints::required().range(0.0, 100.0).step(0.01),
    )
    .with_unit("%")
}

fn principal_interest_chart(
    principal: f64,
    interest: f64,
) -> ChartSeries {
    ChartSeries::new(ChartKind::Pie)
        .point("Principal", principal)
        .point("Interest", interest)
}

const ANNUITY_FORMULA: &str = "M = P × r × (1 + r)^n ÷ ((1 + r)^n − 1)";

// =============================================================================
// Calculators
// =============================================================================

pub struct LoanCalculator;

impl Calculator for LoanCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "loan",
            title: "Loan Calculator",
            category: Category::Finance,
            description: "Payment, total interest and amortization for a fixed-rate loan.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        let frequencies: Vec<&str> = FREQUENCIES.iter().map(|(name, _)| *name).collect();
        vec![
            InputField::number("principal", "Loan amount", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            rate_field(),
            InputField::number(
                "term_years",
                "Loan term",
                FieldConstraints::required().range(0.0, 50.0),
            )
            .with_unit("years"),
            InputField::choice("frequency", "Payment frequency", &frequencies),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let input = LoanInput {
            principal: request.number("principal")?,
            annual_rate_percent: request.number("rate")?,
            term_years: request.number("term_years")?,
            periods_per_year: periods_for(request.text("frequency")?)?,
        };
        let result = calculate(&input)?;

        Ok(CalculationResult::new(ResultField::currency(
            payment_label(input.periods_per_year),
            result.periodic_payment,
        ))
        .field(ResultField::currency("Total paid", result.total_paid))
        .field(ResultField::currency("Total interest", result.total_interest))
        .field(ResultField::number(
            "Number of payments",
            f64::from(result.number_of_periods),
        ))
        .field(ResultField::text(
            "Payoff time",
            describe_term(result.number_of_periods * 12 / input.periods_per_year),
        ))
        .formula(ANNUITY_FORMULA)
        .chart(principal_interest_chart(input.principal, result.total_interest)))
    }
}

pub struct MortgageCalculator;

impl Calculator for MortgageCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "mortgage",
            title: "Mortgage Calculator",
            category: Category::Finance,
            description: "Monthly mortgage payment including property tax and insurance.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("home_price", "Home price", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number("down_payment", "Down payment", FieldConstraints::required().min(0.0))
                .with_unit("$")
                .with_default("0"),
            rate_field(),
            InputField::number("term_years", "Loan term", FieldConstraints::required().range(1.0, 50.0))
                .with_unit("years")
                .with_default("30"),
            InputField::number(
                "property_tax",
                "Annual property tax",
                FieldConstraints::optional().min(0.0),
            )
            .with_unit("$"),
            InputField::number(
                "insurance",
                "Annual home insurance",
                FieldConstraints::optional().min(0.0),
            )
            .with_unit("$"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let price = request.number("home_price")?;
        let down = request.number("down_payment")?;
        if down >= price {
            return Err(CalcError::domain(
                "mortgage",
                "down payment must be less than the home price",
            ));
        }
        let loan = calculate(&LoanInput {
            principal: price - down,
            annual_rate_percent: request.number("rate")?,
            term_years: request.number("term_years")?,
            periods_per_year: 12,
        })?;

        let monthly_tax = request.optional_number("property_tax").unwrap_or(0.0) / 12.0;
        let monthly_insurance = request.optional_number("insurance").unwrap_or(0.0) / 12.0;
        let monthly_total = loan.periodic_payment + monthly_tax + monthly_insurance;
        let periods = f64::from(loan.number_of_periods);

        Ok(CalculationResult::new(ResultField::currency("Monthly payment", monthly_total))
            .field(ResultField::currency("Loan amount", price - down))
            .field(ResultField::percent("Down payment", down / price * 100.0))
            .field(ResultField::currency("Principal & interest", loan.periodic_payment))
            .field(ResultField::currency("Property tax", monthly_tax))
            .field(ResultField::currency("Home insurance", monthly_insurance))
            .field(ResultField::currency("Total interest", loan.total_interest))
            .field(ResultField::currency("Total cost of loan", monthly_total * periods))
            .formula(ANNUITY_FORMULA)
            .chart(
                ChartSeries::new(ChartKind::Pie)
                    .point("Principal", price - down)
                    .point("Interest", loan.total_interest)
                    .point("Property tax", monthly_tax * periods)
                    .point("Insurance", monthly_insurance * periods),
            ))
    }
}

pub struct CarLoanCalculator;

impl Calculator for CarLoanCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "car-loan",
            title: "Car Loan Calculator",
            category: Category::Finance,
            description: "Monthly car payment after down payment, trade-in and sales tax.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("price", "Vehicle price", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number("down_payment", "Down payment", FieldConstraints::optional().min(0.0))
                .with_unit("$"),
            InputField::number("trade_in", "Trade-in value", FieldConstraints::optional().min(0.0))
                .with_unit("$"),
            InputField::number(
                "sales_tax",
                "Sales tax",
                FieldConstraints::optional().range(0.0, 100.0),
            )
            .with_unit("%"),
            rate_field(),
            InputField::number(
                "term_months",
                "Loan term",
                FieldConstraints::required().range(1.0, 120.0),
            )
            .with_unit("months")
            .with_default("60"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let price = request.number("price")?;
        let down = request.optional_number("down_payment").unwrap_or(0.0);
        let trade_in = request.optional_number("trade_in").unwrap_or(0.0);
        let tax_rate = request.optional_number("sales_tax").unwrap_or(0.0) / 100.0;
        let months = request.number("term_months")?;

        // Sales tax is charged on the price net of the trade-in.
        let sales_tax = (price - trade_in).max(0.0) * tax_rate;
        let financed = price + sales_tax - down - trade_in;
        if financed <= 0.0 {
            return Err(CalcError::domain(
                "car-loan",
                "down payment and trade-in cover the full price; nothing to finance",
            ));
        }

        let loan = calculate(&LoanInput {
            principal: financed,
            annual_rate_percent: request.number("rate")?,
            term_years: months / 12.0,
            periods_per_year: 12,
        })?;

        Ok(CalculationResult::new(ResultField::currency("Monthly payment", loan.periodic_payment))
            .field(ResultField::currency("Amount financed", financed))
            .field(ResultField::currency("Sales tax", sales_tax))
            .field(ResultField::currency("Total interest", loan.total_interest))
            .field(ResultField::currency(
                "Total cost",
                loan.total_paid + down + trade_in,
            ))
            .formula(ANNUITY_FORMULA)
            .chart(principal_interest_chart(financed, loan.total_interest)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub balance: f64,
    pub current_rate_percent: f64,
    pub remaining_years: f64,
    pub new_rate_percent: f64,
    pub new_term_years: f64,
    pub closing_costs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceResult {
    pub current_payment: f64,
    pub new_payment: f64,
    pub monthly_savings: f64,
    /// `None` when the new loan never pays back its closing costs.
    pub break_even_months: Option<f64>,
    pub interest_difference: f64,
}

/// Compares the remaining current loan with a new loan on the same balance.
pub fn refinance(input: &RefinanceInput) -> CalcResult<RefinanceResult> {
    ensure_non_negative("refinance", "Closing costs", input.closing_costs)?;
    let current = calculate(&LoanInput {
        principal: input.balance,
        annual_rate_percent: input.current_rate_percent,
        term_years: input.remaining_years,
        periods_per_year: 12,
    })?;
    let new = calculate(&LoanInput {
        principal: input.balance,
        annual_rate_percent: input.new_rate_percent,
        term_years: input.new_term_years,
        periods_per_year: 12,
    })?;

    let monthly_savings = current.periodic_payment - new.periodic_payment;
    let break_even_months = if monthly_savings > 0.0 {
        Some((input.closing_costs / monthly_savings).ceil())
    } else {
        None
    };

    Ok(RefinanceResult {
        current_payment: current.periodic_payment,
        new_payment: new.periodic_payment,
        monthly_savings,
        break_even_months,
        interest_difference: current.total_interest - new.total_interest,
    })
}

pub struct RefinanceCalculator;

impl Calculator for RefinanceCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "refinance",
            title: "Refinance Calculator",
            category: Category::Finance,
            description: "Monthly savings and break-even point of refinancing a loan.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("balance", "Remaining balance", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number(
                "current_rate",
                "Current rate",
                FieldConstraints::required().range(0.0, 100.0),
            )
            .with_unit("%"),
            InputField::number(
                "remaining_years",
                "Years remaining",
                FieldConstraints::required().range(0.0, 50.0),
            )
            .with_unit("years"),
            InputField::number("new_rate", "New rate", FieldConstraints::required().range(0.0, 100.0))
                .with_unit("%"),
            InputField::number(
                "new_term_years",
                "New term",
                FieldConstraints::required().range(0.0, 50.0),
            )
            .with_unit("years"),
            InputField::number(
                "closing_costs",
                "Closing costs",
                FieldConstraints::required().min(0.0),
            )
            .with_unit("$")
            .with_default("0"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let result = refinance(&RefinanceInput {
            balance: request.number("balance")?,
            current_rate_percent: request.number("current_rate")?,
            remaining_years: request.number("remaining_years")?,
            new_rate_percent: request.number("new_rate")?,
            new_term_years: request.number("new_term_years")?,
            closing_costs: request.number("closing_costs")?,
        })?;

        let break_even = match result.break_even_months {
            Some(months) => ResultField::number("Break-even", months).with_unit("months"),
            None => ResultField::text("Break-even", "Never"),
        };

        Ok(CalculationResult::new(ResultField::currency(
            "Monthly savings",
            result.monthly_savings,
        ))
        .field(ResultField::currency("Current payment", result.current_payment))
        .field(ResultField::currency("New payment", result.new_payment))
        .field(break_even)
        .field(ResultField::currency(
            "Lifetime interest saved",
            result.interest_difference,
        ))
        .formula(format!(
            "{ANNUITY_FORMULA}; break-even = closing costs ÷ monthly savings"
        ))
        .chart(
            ChartSeries::new(ChartKind::Bar)
                .point("Current payment", result.current_payment)
                .point("New payment", result.new_payment),
        ))
    }
}

/// Human-readable payoff time for a number of monthly periods.
pub fn describe_term(months: u32) -> String {
    fn plural(
        n: u32,
        unit: &str,
    ) -> String {
        if n == 1 { format!("1 {unit}") } else { format!("{n} {unit}s") }
    }

    match (months / 12, months % 12) {
        (0, m) => plural(m, "month"),
        (y, 0) => plural(y, "year"),
        (y, m) => format!("{} {}", plural(y, "year"), plural(m, "month")),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn close(
        a: f64,
        b: f64,
        tolerance: f64,
    ) -> bool {
        (a - b).abs() <= tolerance
    }

    fn input(
        principal: f64,
        rate: f64,
        years: f64,
    ) -> LoanInput {
        LoanInput {
            principal,
            annual_rate_percent: rate,
            term_years: years,
            periods_per_year: 12,
        }
    }

    // =========================================================================
    // calculate tests
    // =========================================================================

    #[test]
    fn thirty_year_mortgage_payment() {
        let result = calculate(&input(200_000.0, 6.0, 30.0)).unwrap();

        assert!(close(result.periodic_payment, 1199.10, 0.005));
        assert_eq!(result.number_of_periods, 360);
    }

    #[test]
    fn total_interest_is_payments_minus_principal() {
        let result = calculate(&input(25_000.0, 7.5, 5.0)).unwrap();
        let n = f64::from(result.number_of_periods);

        assert!(close(result.periodic_payment * n - 25_000.0, result.total_interest, 1e-6));
    }

    #[test]
    fn payment_discounts_back_to_principal() {
        let p = 150_000.0;
        let result = calculate(&input(p, 4.25, 15.0)).unwrap();
        let r = result.periodic_rate;
        let n = f64::from(result.number_of_periods);
        let growth = (1.0 + r).powf(n);

        let present_value = result.periodic_payment * (growth - 1.0) / (r * growth);

        assert!(close(present_value, p, 1e-6 * p));
    }

    #[test]
    fn amortized_payment_degrades_to_even_split_at_zero_rate() {
        let result = calculate(&input(12_000.0, 0.0, 2.0)).unwrap();

        assert_eq!(result.periodic_payment, 12_000.0 / 24.0);
        assert_eq!(result.total_interest, 0.0);
    }

    #[test]
    fn rate_too_small_to_register_still_amortizes() {
        let result = calculate(&LoanInput {
            principal: 12_000.0,
            annual_rate_percent: 1e-15,
            term_years: 1.0,
            periods_per_year: 12,
        })
        .unwrap();

        assert!(result.periodic_payment.is_finite());
        assert!((result.periodic_payment - 1000.0).abs() < 1e-6);
        assert!(result.total_interest.abs() < 1e-6);
    }

    #[test]
    fn zero_term_is_domain_error() {
        let result = calculate(&input(10_000.0, 5.0, 0.0));

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }

    #[test]
    fn term_shorter_than_one_payment_is_domain_error() {
        let result = calculate(&LoanInput {
            principal: 1000.0,
            annual_rate_percent: 5.0,
            term_years: 0.01,
            periods_per_year: 12,
        });

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }

    #[test]
    fn calculate_is_idempotent() {
        let a = calculate(&input(99_999.0, 3.3, 17.0)).unwrap();
        let b = calculate(&input(99_999.0, 3.3, 17.0)).unwrap();

        assert_eq!(a.periodic_payment.to_bits(), b.periodic_payment.to_bits());
        assert_eq!(a, b);
    }

    // =========================================================================
    // schedule tests
    // =========================================================================

    #[test]
    fn schedule_pays_off_balance() {
        let rows = schedule(10_000.0, 0.05 / 12.0, 36);

        assert_eq!(rows.len(), 36);
        assert_eq!(rows.last().map(|r| r.balance), Some(0.0));
        let principal: f64 = rows.iter().map(|r| r.principal).sum();
        assert!(close(principal, 10_000.0, 1e-6));
    }

    #[test]
    fn first_row_interest_is_balance_times_rate() {
        let rows = schedule(10_000.0, 0.01, 12);

        assert!(close(rows[0].interest, 100.0, 1e-9));
    }

    #[test]
    fn yearly_summary_groups_by_year() {
        let rows = schedule(10_000.0, 0.05 / 12.0, 30);
        let years = yearly_summary(&rows, 12);

        assert_eq!(years.len(), 3);
        assert_eq!(years[2].end_balance, 0.0);
    }

    // =========================================================================
    // refinance tests
    // =========================================================================

    #[test]
    fn refinance_to_lower_rate_breaks_even() {
        let result = refinance(&RefinanceInput {
            balance: 200_000.0,
            current_rate_percent: 7.0,
            remaining_years: 25.0,
            new_rate_percent: 5.5,
            new_term_years: 25.0,
            closing_costs: 4000.0,
        })
        .unwrap();

        assert!(result.monthly_savings > 0.0);
        let months = result.break_even_months.unwrap();
        assert!(months * result.monthly_savings >= 4000.0);
    }

    #[test]
    fn refinance_to_higher_payment_never_breaks_even() {
        let result = refinance(&RefinanceInput {
            balance: 100_000.0,
            current_rate_percent: 4.0,
            remaining_years: 20.0,
            new_rate_percent: 6.0,
            new_term_years: 20.0,
            closing_costs: 1000.0,
        })
        .unwrap();

        assert_eq!(result.break_even_months, None);
    }

    #[test]
    fn describe_term_formats_years_and_months() {
        assert_eq!(describe_term(360), "30 years");
        assert_eq!(describe_term(14), "1 year 2 months");
        assert_eq!(describe_term(7), "7 months");
    }
}

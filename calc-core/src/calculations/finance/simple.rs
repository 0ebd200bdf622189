//! Single-step money arithmetic: simple interest, discounts, percentages and
//! tips.

use crate::calculations::common::{ensure_whole, format_number};
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField,
};

/// `I = P · r · t` with `r` as a percentage.
pub fn simple_interest(
    principal: f64,
    rate_percent: f64,
    years: f64,
) -> f64 {
    principal * rate_percent / 100.0 * years
}

/// Returns `(savings, final price)`.
pub fn apply_discount(
    price: f64,
    discount_percent: f64,
) -> (f64, f64) {
    let savings = price * discount_percent / 100.0;
    (savings, price - savings)
}

/// Relative change from `from` to `to`, in percent.
///
/// # Errors
///
/// [`CalcError::Domain`] when `from` is zero.
pub fn percent_change(
    from: f64,
    to: f64,
) -> CalcResult<f64> {
    if from == 0.0 {
        return Err(CalcError::domain(
            "percent-change",
            "percent change from zero is undefined",
        ));
    }
    Ok((to - from) / from.abs() * 100.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TipSplit {
    pub tip: f64,
    pub total: f64,
    pub per_person: f64,
    pub tip_per_person: f64,
}

pub fn split_tip(
    bill: f64,
    tip_percent: f64,
    people: u32,
) -> TipSplit {
    let tip = bill * tip_percent / 100.0;
    let total = bill + tip;
    let people = f64::from(people.max(1));
    TipSplit {
        tip,
        total,
        per_person: total / people,
        tip_per_person: tip / people,
    }
}

// =============================================================================
// Calculators
// =============================================================================

pub struct SimpleInterestCalculator;

impl Calculator for SimpleInterestCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "simple-interest",
            title: "Simple Interest Calculator",
            category: Category::Finance,
            description: "Interest on a principal without compounding.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("principal", "Principal", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number("rate", "Annual rate", FieldConstraints::required().range(0.0, 100.0))
                .with_unit("%"),
            InputField::number("years", "Time", FieldConstraints::required().range(0.0, 100.0))
                .with_unit("years"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let principal = request.number("principal")?;
        let interest = simple_interest(principal, request.number("rate")?, request.number("years")?);

        Ok(CalculationResult::new(ResultField::currency("Interest", interest))
            .field(ResultField::currency("Total amount", principal + interest))
            .formula("I = P × r × t")
            .chart(
                ChartSeries::new(ChartKind::Pie)
                    .point("Principal", principal)
                    .point("Interest", interest),
            ))
    }
}

pub struct DiscountCalculator;

impl Calculator for DiscountCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "discount",
            title: "Discount Calculator",
            category: Category::Everyday,
            description: "Sale price and savings after a percentage discount.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("price", "Original price", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number(
                "discount",
                "Discount",
                FieldConstraints::required().range(0.0, 100.0),
            )
            .with_unit("%"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let (savings, final_price) =
            apply_discount(request.number("price")?, request.number("discount")?);

        Ok(CalculationResult::new(ResultField::currency("Final price", final_price))
            .field(ResultField::currency("You save", savings))
            .formula("final = price × (1 − discount ÷ 100)"))
    }
}

pub struct PercentageCalculator;

impl Calculator for PercentageCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "percentage",
            title: "Percentage Calculator",
            category: Category::Everyday,
            description: "What is X% of Y, and what percent X is of Y.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("percent", "Percent", FieldConstraints::required()).with_unit("%"),
            InputField::number("value", "Of value", FieldConstraints::required()),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let percent = request.number("percent")?;
        let value = request.number("value")?;
        let part = percent / 100.0 * value;

        Ok(CalculationResult::new(ResultField::number("Result", part))
            .field(ResultField::number("Remainder", value - part))
            .formula(format!(
                "{} % × {} = {}",
                format_number(percent),
                format_number(value),
                format_number(part)
            )))
    }
}

pub struct PercentChangeCalculator;

impl Calculator for PercentChangeCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "percent-change",
            title: "Percent Change Calculator",
            category: Category::Everyday,
            description: "Percentage increase or decrease between two values.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("from", "From", FieldConstraints::required()),
            InputField::number("to", "To", FieldConstraints::required()),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let from = request.number("from")?;
        let to = request.number("to")?;
        let change = percent_change(from, to)?;
        let direction = if change > 0.0 {
            "Increase"
        } else if change < 0.0 {
            "Decrease"
        } else {
            "No change"
        };

        Ok(CalculationResult::new(ResultField::percent("Change", change))
            .field(ResultField::number("Difference", to - from))
            .field(ResultField::text("Direction", direction))
            .formula("change = (to − from) ÷ |from| × 100"))
    }
}

pub struct TipCalculator;

impl Calculator for TipCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "tip",
            title: "Tip Calculator",
            category: Category::Everyday,
            description: "Tip amount and per-person share of a bill.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("bill", "Bill amount", FieldConstraints::required().min(0.0))
                .with_unit("$"),
            InputField::number("tip", "Tip", FieldConstraints::required().range(0.0, 100.0))
                .with_unit("%")
                .with_default("15"),
            InputField::number(
                "people",
                "Number of people",
                FieldConstraints::required().range(1.0, 100.0).step(1.0),
            )
            .with_default("1"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let people = request.number("people")?;
        ensure_whole("tip", "Number of people", people)?;
        let split = split_tip(request.number("bill")?, request.number("tip")?, people as u32);

        Ok(CalculationResult::new(ResultField::currency("Total per person", split.per_person))
            .field(ResultField::currency("Tip amount", split.tip))
            .field(ResultField::currency("Total bill", split.total))
            .field(ResultField::currency("Tip per person", split.tip_per_person))
            .formula("per person = bill × (1 + tip ÷ 100) ÷ people"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::calculator::run;
    use crate::models::ResultValue;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn simple_interest_is_linear() {
        assert_eq!(simple_interest(1000.0, 5.0, 3.0), 150.0);
    }

    #[test]
    fn discount_of_twenty_percent() {
        assert_eq!(apply_discount(80.0, 25.0), (20.0, 60.0));
    }

    #[test]
    fn percent_change_handles_decrease() {
        assert_eq!(percent_change(200.0, 150.0).unwrap(), -25.0);
    }

    #[test]
    fn percent_change_from_negative_base_uses_magnitude() {
        assert_eq!(percent_change(-50.0, -25.0).unwrap(), 50.0);
    }

    #[test]
    fn percent_change_from_zero_is_domain_error() {
        assert!(matches!(percent_change(0.0, 5.0), Err(CalcError::Domain { .. })));
    }

    #[test]
    fn tip_splits_evenly() {
        let split = split_tip(100.0, 20.0, 4);

        assert_eq!(split.tip, 20.0);
        assert_eq!(split.per_person, 30.0);
        assert_eq!(split.tip_per_person, 5.0);
    }

    #[test]
    fn tip_rejects_fractional_people() {
        let result = run(&TipCalculator, &raw(&[("bill", "50"), ("people", "2.5")]));

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }

    #[test]
    fn discount_above_hundred_percent_is_validation_error() {
        let result = run(&DiscountCalculator, &raw(&[("price", "10"), ("discount", "150")]));

        assert!(matches!(result, Err(e) if e.is_validation()));
    }

    #[test]
    fn percentage_of_value() {
        let result = run(&PercentageCalculator, &raw(&[("percent", "15"), ("value", "80")])).unwrap();

        assert_eq!(result.primary.value, ResultValue::Number(12.0));
        assert_eq!(result.formula.as_deref(), Some("15 % × 80 = 12"));
    }
}

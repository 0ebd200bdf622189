use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, FieldConstraints, InputField, ResultField};

/// `log_base(x)`.
///
/// # Errors
///
/// [`CalcError::Domain`] unless `x > 0`, `base > 0` and `base != 1`.
pub fn log(
    x: f64,
    base: f64,
) -> CalcResult<f64> {
    if x <= 0.0 {
        return Err(CalcError::domain(
            "logarithm",
            "logarithm is only defined for positive numbers",
        ));
    }
    if base <= 0.0 || base == 1.0 {
        return Err(CalcError::domain(
            "logarithm",
            "base must be positive and not equal to 1",
        ));
    }
    Ok(x.ln() / base.ln())
}

pub struct LogarithmCalculator;

impl Calculator for LogarithmCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "logarithm",
            title: "Logarithm Calculator",
            category: Category::Math,
            description: "Logarithm of a number in any base, with ln and log10.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("x", "Number", FieldConstraints::required()),
            InputField::number("base", "Base", FieldConstraints::required()).with_default("10"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let x = request.number("x")?;
        let base = request.number("base")?;
        let value = log(x, base)?;

        Ok(CalculationResult::new(ResultField::number("Logarithm", value))
            .field(ResultField::number("Natural log (ln)", x.ln()))
            .field(ResultField::number("Common log (log₁₀)", x.log10()))
            .field(ResultField::number("Binary log (log₂)", x.log2()))
            .formula("log_b(x) = ln(x) ÷ ln(b)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_base_two() {
        assert!((log(8.0, 2.0).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn log_of_zero_is_domain_error() {
        assert!(matches!(log(0.0, 10.0), Err(CalcError::Domain { .. })));
    }

    #[test]
    fn base_one_is_domain_error() {
        assert!(matches!(log(5.0, 1.0), Err(CalcError::Domain { .. })));
    }
}

//! Shared helpers for formula modules: rounding, domain guards and number
//! formatting.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{CalcError, CalcResult};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a decimal to `f64` for presentation. Out-of-range values map to 0.
pub fn decimal_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

/// Converts a validated `f64` input to a decimal rounded to cents.
pub fn money_to_decimal(
    calculator: &str,
    value: f64,
) -> CalcResult<Decimal> {
    Decimal::try_from(value)
        .map(round_half_up)
        .map_err(|e| CalcError::domain(calculator, format!("{value} cannot be used as money: {e}")))
}

/// Fails with a domain error unless `value > 0`.
pub fn ensure_positive(
    calculator: &str,
    name: &str,
    value: f64,
) -> CalcResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(CalcError::domain(
            calculator,
            format!("{name} must be greater than zero"),
        ))
    }
}

/// Fails with a domain error unless `value >= 0`.
pub fn ensure_non_negative(
    calculator: &str,
    name: &str,
    value: f64,
) -> CalcResult<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(CalcError::domain(
            calculator,
            format!("{name} cannot be negative"),
        ))
    }
}

/// Fails with a domain error unless `value` is a whole number.
pub fn ensure_whole(
    calculator: &str,
    name: &str,
    value: f64,
) -> CalcResult<()> {
    if value.fract() == 0.0 {
        Ok(())
    } else {
        Err(CalcError::domain(
            calculator,
            format!("{name} must be a whole number"),
        ))
    }
}

/// Formats a number with at most four decimals, trimming trailing zeros.
///
/// Negative zero (and anything that rounds to it) prints as `0`.
///
/// ```
/// use calc_core::calculations::common::format_number;
///
/// assert_eq!(format_number(2.5), "2.5");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(1.0 / 3.0), "0.3333");
/// ```
pub fn format_number(value: f64) -> String {
    format_with_decimals(value, 4)
}

pub fn format_with_decimals(
    value: f64,
    decimals: usize,
) -> String {
    let text = format!("{value:.decimals$}");
    let text = if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    };
    if text == "-0" { "0".to_string() } else { text }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
    }

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(0.004)), dec!(0.00));
    }

    // =========================================================================
    // guard tests
    // =========================================================================

    #[test]
    fn ensure_positive_rejects_zero() {
        let result = ensure_positive("decay", "Half-life", 0.0);

        assert_eq!(
            result,
            Err(CalcError::domain("decay", "Half-life must be greater than zero"))
        );
    }

    #[test]
    fn ensure_whole_rejects_fractions() {
        assert!(ensure_whole("tip", "People", 2.5).is_err());
        assert!(ensure_whole("tip", "People", 3.0).is_ok());
    }

    #[test]
    fn money_to_decimal_rounds_to_cents() {
        assert_eq!(money_to_decimal("tax", 1234.567), Ok(dec!(1234.57)));
    }

    // =========================================================================
    // format_number tests
    // =========================================================================

    #[test]
    fn format_number_trims_trailing_zeros() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
    }

    #[test]
    fn format_number_normalizes_tiny_negatives() {
        assert_eq!(format_number(-0.00001), "0");
    }

    #[test]
    fn format_number_keeps_sign() {
        assert_eq!(format_number(-1.25), "-1.25");
    }
}

//! Exponential decay by half-life.
//!
//! ```text
//! remaining = initial × 0.5^(elapsed / half_life)
//! λ         = ln 2 / half_life
//! ```

use std::f64::consts::LN_2;

use serde::{Deserialize, Serialize};

use crate::calculations::common::{ensure_non_negative, ensure_positive};
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::CalcResult;
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField,
};

const HALF_LIFE: &str = "half-life";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayInput {
    pub initial: f64,
    pub half_life: f64,
    pub elapsed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayResult {
    pub remaining: f64,
    pub decayed: f64,
    pub percent_remaining: f64,
    pub half_lives: f64,
    pub decay_constant: f64,
}

/// # Errors
///
/// [`CalcError::Domain`](crate::CalcError::Domain) unless `initial > 0`,
/// `half_life > 0` and `elapsed >= 0`.
pub fn calculate(input: &DecayInput) -> CalcResult<DecayResult> {
    ensure_positive(HALF_LIFE, "Initial quantity", input.initial)?;
    ensure_positive(HALF_LIFE, "Half-life", input.half_life)?;
    ensure_non_negative(HALF_LIFE, "Elapsed time", input.elapsed)?;

    let half_lives = input.elapsed / input.half_life;
    let remaining = input.initial * 0.5_f64.powf(half_lives);

    Ok(DecayResult {
        remaining,
        decayed: input.initial - remaining,
        percent_remaining: remaining / input.initial * 100.0,
        half_lives,
        decay_constant: LN_2 / input.half_life,
    })
}

pub struct HalfLifeCalculator;

impl Calculator for HalfLifeCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: HALF_LIFE,
            title: "Half-Life Calculator",
            category: Category::Science,
            description: "Remaining quantity of a decaying substance after a given time.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("initial", "Initial quantity", FieldConstraints::required().min(0.0)),
            InputField::number("half_life", "Half-life", FieldConstraints::required().min(0.0)),
            InputField::number("elapsed", "Elapsed time", FieldConstraints::required().min(0.0)),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let input = DecayInput {
            initial: request.number("initial")?,
            half_life: request.number("half_life")?,
            elapsed: request.number("elapsed")?,
        };
        let result = calculate(&input)?;

        // Five half-life marks plus the elapsed point give the decay curve.
        let mut chart = ChartSeries::new(ChartKind::Line);
        for k in 0..=5 {
            let t = input.half_life * f64::from(k);
            chart = chart.point(format!("t = {t}"), input.initial * 0.5_f64.powi(k));
        }

        Ok(CalculationResult::new(ResultField::number("Remaining", result.remaining))
            .field(ResultField::number("Decayed", result.decayed))
            .field(ResultField::percent("Percent remaining", result.percent_remaining))
            .field(ResultField::number("Half-lives elapsed", result.half_lives))
            .field(ResultField::number("Decay constant (λ)", result.decay_constant))
            .formula("N = N₀ × 0.5^(t ÷ T½)")
            .chart(chart))
    }
}

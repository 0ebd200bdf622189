//! Body mass index.
//!
//! | System   | Formula              |
//! |----------|----------------------|
//! | metric   | `kg / m²`            |
//! | imperial | `703 × lb / in²`     |
//!
//! | BMI         | Category    |
//! |-------------|-------------|
//! | < 18.5      | Underweight |
//! | 18.5 – 24.9 | Normal      |
//! | 25 – 29.9   | Overweight  |
//! | ≥ 30        | Obese       |

use serde::{Deserialize, Serialize};

use crate::calculations::common::ensure_positive;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField,
};

pub const HEALTHY_MIN: f64 = 18.5;
pub const HEALTHY_MAX: f64 = 24.9;
const IMPERIAL_FACTOR: f64 = 703.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSystem {
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "metric" => Some(Self::Metric),
            "imperial" => Some(Self::Imperial),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn classify(bmi: f64) -> Self {
        if bmi < HEALTHY_MIN {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal weight",
            Self::Overweight => "Overweight",
            Self::Obese => "Obese",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
    pub bmi: f64,
    pub category: BmiCategory,
    /// Healthy weight range for the height, in the input's weight unit.
    pub healthy_range: (f64, f64),
}

/// `weight` in kg or lb and `height` in cm or in, per `system`.
pub fn calculate(
    weight: f64,
    height: f64,
    system: UnitSystem,
) -> CalcResult<BmiResult> {
    ensure_positive("bmi", "Weight", weight)?;
    ensure_positive("bmi", "Height", height)?;

    let (bmi, weight_for) = match system {
        UnitSystem::Metric => {
            let meters = height / 100.0;
            let squared = meters * meters;
            (weight / squared, squared)
        }
        UnitSystem::Imperial => {
            let squared = height * height;
            (IMPERIAL_FACTOR * weight / squared, squared / IMPERIAL_FACTOR)
        }
    };

    Ok(BmiResult {
        bmi,
        category: BmiCategory::classify(bmi),
        healthy_range: (HEALTHY_MIN * weight_for, HEALTHY_MAX * weight_for),
    })
}

pub struct BmiCalculator;

impl Calculator for BmiCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "bmi",
            title: "BMI Calculator",
            category: Category::Health,
            description: "Body mass index and healthy weight range.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::choice("system", "Units", &["metric", "imperial"]),
            InputField::number("weight", "Weight (kg or lb)", FieldConstraints::required().range(0.0, 1000.0)),
            InputField::number("height", "Height (cm or in)", FieldConstraints::required().range(0.0, 300.0)),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let name = request.text("system")?;
        let system = UnitSystem::parse(name)
            .ok_or_else(|| CalcError::domain("bmi", format!("unknown unit system '{name}'")))?;
        let result = calculate(request.number("weight")?, request.number("height")?, system)?;
        let (weight_unit, formula) = match system {
            UnitSystem::Metric => ("kg", "BMI = weight (kg) ÷ height (m)²"),
            UnitSystem::Imperial => ("lb", "BMI = 703 × weight (lb) ÷ height (in)²"),
        };

        Ok(CalculationResult::new(ResultField::number("BMI", result.bmi))
            .field(ResultField::text("Category", result.category.label()))
            .field(ResultField::number("Healthy weight from", result.healthy_range.0).with_unit(weight_unit))
            .field(ResultField::number("Healthy weight to", result.healthy_range.1).with_unit(weight_unit))
            .formula(formula)
            .chart(
                ChartSeries::new(ChartKind::Bar)
                    .point("Underweight", HEALTHY_MIN)
                    .point("Normal", 25.0)
                    .point("Overweight", 30.0)
                    .point("You", result.bmi),
            ))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::InputValue;

    #[test]
    fn metric_bmi() {
        let result = calculate(70.0, 175.0, UnitSystem::Metric).unwrap();

        assert!((result.bmi - 22.857).abs() < 0.001);
        assert_eq!(result.category, BmiCategory::Normal);
    }

    #[test]
    fn imperial_matches_metric() {
        // 154.324 lb, 68.898 in is 70 kg, 175 cm.
        let result = calculate(154.3236, 68.8976, UnitSystem::Imperial).unwrap();

        assert!((result.bmi - 22.86).abs() < 0.05);
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(BmiCategory::classify(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::classify(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::classify(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::classify(30.0), BmiCategory::Obese);
    }

    #[test]
    fn healthy_range_for_height() {
        let result = calculate(70.0, 180.0, UnitSystem::Metric).unwrap();

        assert!((result.healthy_range.0 - 59.94).abs() < 0.01);
        assert!((result.healthy_range.1 - 80.676).abs() < 0.01);
    }

    #[test]
    fn zero_height_is_domain_error() {
        assert!(calculate(70.0, 0.0, UnitSystem::Metric).is_err());
    }

    #[test]
    fn unknown_unit_system_is_domain_error() {
        let request = CalculationRequest::from_values([
            ("system", InputValue::Text("stone".to_string())),
            ("weight", InputValue::Number(70.0)),
            ("height", InputValue::Number(175.0)),
        ]);

        let result = BmiCalculator.compute(&request);

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }
}

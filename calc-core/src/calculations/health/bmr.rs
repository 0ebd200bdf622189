//! Basal metabolic rate and total daily energy expenditure.
//!
//! | Equation                 | Male                                   | Female                                  |
//! |--------------------------|----------------------------------------|-----------------------------------------|
//! | Mifflin-St Jeor          | `10W + 6.25H − 5A + 5`                 | `10W + 6.25H − 5A − 161`                |
//! | Harris-Benedict (revised)| `88.362 + 13.397W + 4.799H − 5.677A`   | `447.593 + 9.247W + 3.098H − 4.330A`    |
//!
//! `W` kg, `H` cm, `A` years. TDEE multiplies BMR by an activity factor.

use crate::calculations::common::ensure_positive;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmrEquation {
    MifflinStJeor,
    HarrisBenedict,
}

/// Activity levels and their TDEE multipliers.
pub const ACTIVITY_LEVELS: [(&str, f64); 5] = [
    ("sedentary", 1.2),
    ("light", 1.375),
    ("moderate", 1.55),
    ("active", 1.725),
    ("very-active", 1.9),
];

pub fn bmr(
    equation: BmrEquation,
    sex: Sex,
    weight_kg: f64,
    height_cm: f64,
    age_years: f64,
) -> CalcResult<f64> {
    ensure_positive("bmr", "Weight", weight_kg)?;
    ensure_positive("bmr", "Height", height_cm)?;
    ensure_positive("bmr", "Age", age_years)?;

    let (w, h, a) = (weight_kg, height_cm, age_years);
    Ok(match (equation, sex) {
        (BmrEquation::MifflinStJeor, Sex::Male) => 10.0 * w + 6.25 * h - 5.0 * a + 5.0,
        (BmrEquation::MifflinStJeor, Sex::Female) => 10.0 * w + 6.25 * h - 5.0 * a - 161.0,
        (BmrEquation::HarrisBenedict, Sex::Male) => 88.362 + 13.397 * w + 4.799 * h - 5.677 * a,
        (BmrEquation::HarrisBenedict, Sex::Female) => 447.593 + 9.247 * w + 3.098 * h - 4.330 * a,
    })
}

pub fn activity_multiplier(level: &str) -> Option<f64> {
    ACTIVITY_LEVELS
        .iter()
        .find(|(name, _)| *name == level)
        .map(|(_, m)| *m)
}

pub struct BmrCalculator;

impl Calculator for BmrCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "bmr",
            title: "BMR Calculator",
            category: Category::Health,
            description: "Basal metabolic rate and daily calorie needs.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        let levels: Vec<&str> = ACTIVITY_LEVELS.iter().map(|(name, _)| *name).collect();
        vec![
            InputField::choice("equation", "Equation", &["mifflin-st-jeor", "harris-benedict"]),
            InputField::choice("sex", "Sex", &["male", "female"]),
            InputField::number("weight", "Weight", FieldConstraints::required().range(0.0, 500.0)).with_unit("kg"),
            InputField::number("height", "Height", FieldConstraints::required().range(0.0, 300.0)).with_unit("cm"),
            InputField::number("age", "Age", FieldConstraints::required().range(0.0, 120.0)).with_unit("years"),
            InputField::choice("activity", "Activity level", &levels),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let equation = match request.text("equation")? {
            "mifflin-st-jeor" => BmrEquation::MifflinStJeor,
            "harris-benedict" => BmrEquation::HarrisBenedict,
            other => return Err(CalcError::domain("bmr", format!("unknown equation '{other}'"))),
        };
        let sex = match request.text("sex")? {
            "male" => Sex::Male,
            "female" => Sex::Female,
            other => return Err(CalcError::domain("bmr", format!("unknown sex '{other}'"))),
        };
        let activity = request.text("activity")?;
        let multiplier = activity_multiplier(activity)
            .ok_or_else(|| CalcError::domain("bmr", format!("unknown activity level '{activity}'")))?;

        let base = bmr(
            equation,
            sex,
            request.number("weight")?,
            request.number("height")?,
            request.number("age")?,
        )?;

        let chart = ACTIVITY_LEVELS
            .iter()
            .fold(ChartSeries::new(ChartKind::Bar), |chart, (name, m)| {
                chart.point(*name, base * m)
            });
        let formula = match (equation, sex) {
            (BmrEquation::MifflinStJeor, Sex::Male) => "BMR = 10W + 6.25H − 5A + 5",
            (BmrEquation::MifflinStJeor, Sex::Female) => "BMR = 10W + 6.25H − 5A − 161",
            (BmrEquation::HarrisBenedict, Sex::Male) => "BMR = 88.362 + 13.397W + 4.799H − 5.677A",
            (BmrEquation::HarrisBenedict, Sex::Female) => "BMR = 447.593 + 9.247W + 3.098H − 4.330A",
        };

        Ok(CalculationResult::new(ResultField::number("BMR", base).with_unit("kcal/day"))
            .field(ResultField::number("Daily calories (TDEE)", base * multiplier).with_unit("kcal/day"))
            .field(ResultField::number("Activity multiplier", multiplier))
            .formula(formula)
            .chart(chart))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::InputValue;

    #[test]
    fn mifflin_male() {
        let value = bmr(BmrEquation::MifflinStJeor, Sex::Male, 70.0, 175.0, 30.0).unwrap();

        assert_eq!(value, 1648.75);
    }

    #[test]
    fn mifflin_female_differs_by_166() {
        let male = bmr(BmrEquation::MifflinStJeor, Sex::Male, 60.0, 165.0, 40.0).unwrap();
        let female = bmr(BmrEquation::MifflinStJeor, Sex::Female, 60.0, 165.0, 40.0).unwrap();

        assert_eq!(male - female, 166.0);
    }

    #[test]
    fn harris_benedict_male() {
        let value = bmr(BmrEquation::HarrisBenedict, Sex::Male, 70.0, 175.0, 30.0).unwrap();

        assert!((value - 1695.667).abs() < 0.001);
    }

    #[test]
    fn activity_levels_are_known() {
        assert_eq!(activity_multiplier("moderate"), Some(1.55));
        assert_eq!(activity_multiplier("couch"), None);
    }

    #[test]
    fn unknown_equation_is_domain_error() {
        let request = CalculationRequest::from_values([
            ("equation", InputValue::Text("katch-mcardle".to_string())),
            ("sex", InputValue::Text("female".to_string())),
            ("weight", InputValue::Number(60.0)),
            ("height", InputValue::Number(165.0)),
            ("age", InputValue::Number(30.0)),
            ("activity", InputValue::Text("moderate".to_string())),
        ]);

        let result = BmrCalculator.compute(&request);

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }
}

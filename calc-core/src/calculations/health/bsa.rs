//! Body surface area, in m², from weight (kg) and height (cm).
//!
//! | Variant   | Formula                                 |
//! |-----------|-----------------------------------------|
//! | Mosteller | `√(H × W / 3600)`                       |
//! | Du Bois   | `0.007184 × W^0.425 × H^0.725`          |
//! | Haycock   | `0.024265 × W^0.5378 × H^0.3964`        |

use crate::calculations::common::ensure_positive;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, FieldConstraints, InputField, ResultField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BsaFormula {
    Mosteller,
    DuBois,
    Haycock,
}

impl BsaFormula {
    pub const OPTIONS: [&'static str; 3] = ["mosteller", "du-bois", "haycock"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mosteller" => Some(Self::Mosteller),
            "du-bois" => Some(Self::DuBois),
            "haycock" => Some(Self::Haycock),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mosteller => "Mosteller",
            Self::DuBois => "Du Bois",
            Self::Haycock => "Haycock",
        }
    }

    fn expression(&self) -> &'static str {
        match self {
            Self::Mosteller => "BSA = √(H × W ÷ 3600)",
            Self::DuBois => "BSA = 0.007184 × W^0.425 × H^0.725",
            Self::Haycock => "BSA = 0.024265 × W^0.5378 × H^0.3964",
        }
    }
}

pub fn body_surface_area(
    weight_kg: f64,
    height_cm: f64,
    formula: BsaFormula,
) -> CalcResult<f64> {
    ensure_positive("body-surface-area", "Weight", weight_kg)?;
    ensure_positive("body-surface-area", "Height", height_cm)?;

    Ok(match formula {
        BsaFormula::Mosteller => (height_cm * weight_kg / 3600.0).sqrt(),
        BsaFormula::DuBois => 0.007184 * weight_kg.powf(0.425) * height_cm.powf(0.725),
        BsaFormula::Haycock => 0.024265 * weight_kg.powf(0.5378) * height_cm.powf(0.3964),
    })
}

pub struct BodySurfaceAreaCalculator;

impl Calculator for BodySurfaceAreaCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "body-surface-area",
            title: "Body Surface Area Calculator",
            category: Category::Health,
            description: "BSA by the Mosteller, Du Bois or Haycock formula.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::choice("formula", "Formula", &BsaFormula::OPTIONS),
            InputField::number("weight", "Weight", FieldConstraints::required().range(0.0, 500.0)).with_unit("kg"),
            InputField::number("height", "Height", FieldConstraints::required().range(0.0, 300.0)).with_unit("cm"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let name = request.text("formula")?;
        let formula = BsaFormula::parse(name)
            .ok_or_else(|| CalcError::domain("body-surface-area", format!("unknown formula '{name}'")))?;
        let bsa = body_surface_area(request.number("weight")?, request.number("height")?, formula)?;

        Ok(CalculationResult::new(ResultField::number("Body surface area", bsa).with_unit("m²"))
            .field(ResultField::text("Formula", formula.label()))
            .formula(formula.expression()))
    }
}

//! Trigonometric and inverse trigonometric functions.
//!
//! Forward functions convert a degree input to radians (`× π/180`) before
//! evaluating; inverse functions convert their radian output back to degrees.

use std::f64::consts::PI;

use crate::calculations::common::format_number;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, FieldConstraints, InputField, ResultField};

const TRIG: &str = "trigonometry";
/// Below this, `cos` (or `sin`) is treated as zero and the reciprocal undefined.
const POLE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrigFunction {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sec,
    Csc,
    Cot,
}

impl TrigFunction {
    pub const NAMES: [&'static str; 9] = ["sin", "cos", "tan", "asin", "acos", "atan", "sec", "csc", "cot"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "asin" => Some(Self::Asin),
            "acos" => Some(Self::Acos),
            "atan" => Some(Self::Atan),
            "sec" => Some(Self::Sec),
            "csc" => Some(Self::Csc),
            "cot" => Some(Self::Cot),
            _ => None,
        }
    }

    pub fn is_inverse(&self) -> bool {
        matches!(self, Self::Asin | Self::Acos | Self::Atan)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sec => "sec",
            Self::Csc => "csc",
            Self::Cot => "cot",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    Degrees,
    Radians,
}

impl AngleUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "degrees" => Some(Self::Degrees),
            "radians" => Some(Self::Radians),
            _ => None,
        }
    }
}

pub fn to_radians(
    value: f64,
    unit: AngleUnit,
) -> f64 {
    match unit {
        AngleUnit::Degrees => value * PI / 180.0,
        AngleUnit::Radians => value,
    }
}

pub fn from_radians(
    value: f64,
    unit: AngleUnit,
) -> f64 {
    match unit {
        AngleUnit::Degrees => value * 180.0 / PI,
        AngleUnit::Radians => value,
    }
}

fn undefined(
    function: TrigFunction,
    value: f64,
) -> CalcError {
    CalcError::domain(
        TRIG,
        format!("{}({}) is undefined", function.name(), format_number(value)),
    )
}

/// Evaluates `function` at `value`, interpreting angles in `unit`.
///
/// # Errors
///
/// [`CalcError::Domain`] at poles (tan/sec where cos is 0, csc/cot where sin
/// is 0) and for asin/acos arguments outside `[-1, 1]`.
pub fn evaluate(
    function: TrigFunction,
    value: f64,
    unit: AngleUnit,
) -> CalcResult<f64> {
    let angle = to_radians(value, unit);
    let (sin, cos) = angle.sin_cos();

    match function {
        TrigFunction::Sin => Ok(sin),
        TrigFunction::Cos => Ok(cos),
        TrigFunction::Tan | TrigFunction::Sec if cos.abs() < POLE_EPSILON => {
            Err(undefined(function, value))
        }
        TrigFunction::Csc | TrigFunction::Cot if sin.abs() < POLE_EPSILON => {
            Err(undefined(function, value))
        }
        TrigFunction::Tan => Ok(sin / cos),
        TrigFunction::Sec => Ok(1.0 / cos),
        TrigFunction::Csc => Ok(1.0 / sin),
        TrigFunction::Cot => Ok(cos / sin),
        TrigFunction::Asin | TrigFunction::Acos if !(-1.0..=1.0).contains(&value) => {
            Err(CalcError::domain(
                TRIG,
                format!("{} is only defined on [-1, 1]", function.name()),
            ))
        }
        TrigFunction::Asin => Ok(from_radians(value.asin(), unit)),
        TrigFunction::Acos => Ok(from_radians(value.acos(), unit)),
        TrigFunction::Atan => Ok(from_radians(value.atan(), unit)),
    }
}

pub struct TrigonometryCalculator;

impl Calculator for TrigonometryCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "trigonometry",
            title: "Trigonometry Calculator",
            category: Category::Math,
            description: "Sine, cosine, tangent, their reciprocals and inverses.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::choice("function", "Function", &TrigFunction::NAMES),
            InputField::number("value", "Value", FieldConstraints::required()),
            InputField::choice("unit", "Angle unit", &["degrees", "radians"]),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let name = request.text("function")?;
        let function = TrigFunction::parse(name)
            .ok_or_else(|| CalcError::domain(TRIG, format!("unknown function '{name}'")))?;
        let unit_name = request.text("unit")?;
        let unit = AngleUnit::parse(unit_name)
            .ok_or_else(|| CalcError::domain(TRIG, format!("unknown angle unit '{unit_name}'")))?;
        let value = request.number("value")?;

        let result = evaluate(function, value, unit)?;
        let unit_label = match unit {
            AngleUnit::Degrees => "°",
            AngleUnit::Radians => "rad",
        };

        let mut primary = ResultField::number(&format!("{name}({})", format_number(value)), result);
        if function.is_inverse() {
            primary = primary.with_unit(unit_label);
        }

        let converted = if function.is_inverse() {
            ResultField::number("In radians", to_radians(result, unit))
        } else {
            ResultField::number("Angle in radians", to_radians(value, unit))
        };

        Ok(CalculationResult::new(primary)
            .field(converted)
            .formula("radians = degrees × π ÷ 180"))
    }
}

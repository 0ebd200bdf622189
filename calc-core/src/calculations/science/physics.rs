//! Ohm's law and kinetic energy.

use crate::calculations::common::{ensure_non_negative, ensure_positive};
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, FieldConstraints, InputField, ResultField};

const OHMS_LAW: &str = "ohms-law";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circuit {
    pub voltage: f64,
    pub current: f64,
    pub resistance: f64,
    pub power: f64,
}

/// Solves `V = I·R` for whichever quantity is missing.
///
/// # Errors
///
/// [`CalcError::Domain`] unless exactly two of the three are given, or when
/// solving would divide by zero.
pub fn solve_ohms_law(
    voltage: Option<f64>,
    current: Option<f64>,
    resistance: Option<f64>,
) -> CalcResult<Circuit> {
    let (voltage, current, resistance) = match (voltage, current, resistance) {
        (Some(v), Some(i), None) => {
            if i == 0.0 {
                return Err(CalcError::domain(OHMS_LAW, "current cannot be zero when solving for resistance"));
            }
            (v, i, v / i)
        }
        (Some(v), None, Some(r)) => {
            ensure_positive(OHMS_LAW, "Resistance", r)?;
            (v, v / r, r)
        }
        (None, Some(i), Some(r)) => {
            ensure_non_negative(OHMS_LAW, "Resistance", r)?;
            (i * r, i, r)
        }
        _ => {
            return Err(CalcError::domain(
                OHMS_LAW,
                "enter exactly two of voltage, current and resistance",
            ));
        }
    };

    Ok(Circuit {
        voltage,
        current,
        resistance,
        power: voltage * current,
    })
}

pub struct OhmsLawCalculator;

impl Calculator for OhmsLawCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: OHMS_LAW,
            title: "Ohm's Law Calculator",
            category: Category::Science,
            description: "Voltage, current, resistance and power from any two of them.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("voltage", "Voltage", FieldConstraints::optional()).with_unit("V"),
            InputField::number("current", "Current", FieldConstraints::optional()).with_unit("A"),
            InputField::number("resistance", "Resistance", FieldConstraints::optional().min(0.0))
                .with_unit("Ω"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let circuit = solve_ohms_law(
            request.optional_number("voltage"),
            request.optional_number("current"),
            request.optional_number("resistance"),
        )?;

        Ok(
            CalculationResult::new(ResultField::number("Power", circuit.power).with_unit("W"))
                .field(ResultField::number("Voltage", circuit.voltage).with_unit("V"))
                .field(ResultField::number("Current", circuit.current).with_unit("A"))
                .field(ResultField::number("Resistance", circuit.resistance).with_unit("Ω"))
                .formula("V = I × R, P = V × I"),
        )
    }
}

/// Returns `(kinetic energy J, momentum kg·m/s)`.
pub fn kinetic_energy(
    mass_kg: f64,
    velocity_mps: f64,
) -> CalcResult<(f64, f64)> {
    ensure_positive("kinetic-energy", "Mass", mass_kg)?;
    Ok((0.5 * mass_kg * velocity_mps * velocity_mps, mass_kg * velocity_mps))
}

pub struct KineticEnergyCalculator;

impl Calculator for KineticEnergyCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "kinetic-energy",
            title: "Kinetic Energy Calculator",
            category: Category::Science,
            description: "Kinetic energy and momentum of a moving mass.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("mass", "Mass", FieldConstraints::required().min(0.0)).with_unit("kg"),
            InputField::number("velocity", "Velocity", FieldConstraints::required()).with_unit("m/s"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let (energy, momentum) = kinetic_energy(request.number("mass")?, request.number("velocity")?)?;

        Ok(CalculationResult::new(ResultField::number("Kinetic energy", energy).with_unit("J"))
            .field(ResultField::number("In kilojoules", energy / 1000.0).with_unit("kJ"))
            .field(ResultField::number("Momentum", momentum).with_unit("kg·m/s"))
            .formula("KE = ½ × m × v²"))
    }
}

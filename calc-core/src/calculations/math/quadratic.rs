//! Roots of `ax² + bx + c = 0`.
//!
//! The discriminant `Δ = b² − 4ac` selects one of three cases:
//!
//! | Δ     | Roots                                       |
//! |-------|---------------------------------------------|
//! | > 0   | two real: `(−b ± √Δ) / 2a`                  |
//! | = 0   | one repeated real: `−b / 2a`                |
//! | < 0   | complex conjugates: `−b/2a ± (√−Δ / 2a)i`   |

use serde::{Deserialize, Serialize};

use crate::calculations::common::format_number;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, FieldConstraints, InputField, ResultField};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Roots {
    TwoReal { x1: f64, x2: f64 },
    Repeated { x: f64 },
    /// Already formatted as `"re + imi"` and `"re - imi"`.
    Complex { x1: String, x2: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticSolution {
    pub discriminant: f64,
    pub roots: Roots,
    pub vertex: (f64, f64),
}

/// Formats a complex number the way the result card shows it.
///
/// ```
/// use calc_core::calculations::math::quadratic::format_complex;
///
/// assert_eq!(format_complex(0.0, 1.0), "0 + 1i");
/// assert_eq!(format_complex(-0.5, -1.5), "-0.5 - 1.5i");
/// ```
pub fn format_complex(
    re: f64,
    im: f64,
) -> String {
    let sign = if im < 0.0 { '-' } else { '+' };
    format!("{} {sign} {}i", format_number(re), format_number(im.abs()))
}

/// # Errors
///
/// [`CalcError::Domain`] when `a` is zero (the equation is not quadratic).
pub fn solve(
    a: f64,
    b: f64,
    c: f64,
) -> CalcResult<QuadraticSolution> {
    if a == 0.0 {
        return Err(CalcError::domain(
            "quadratic",
            "coefficient a cannot be zero",
        ));
    }

    let discriminant = b * b - 4.0 * a * c;
    let two_a = 2.0 * a;

    let roots = if discriminant > 0.0 {
        let root = discriminant.sqrt();
        Roots::TwoReal {
            x1: (-b + root) / two_a,
            x2: (-b - root) / two_a,
        }
    } else if discriminant == 0.0 {
        Roots::Repeated { x: -b / two_a }
    } else {
        let re = -b / two_a;
        let im = (-discriminant).sqrt() / two_a.abs();
        Roots::Complex {
            x1: format_complex(re, im),
            x2: format_complex(re, -im),
        }
    };

    let vertex_x = -b / two_a;
    let vertex_y = a * vertex_x * vertex_x + b * vertex_x + c;

    Ok(QuadraticSolution {
        discriminant,
        roots,
        vertex: (vertex_x, vertex_y),
    })
}

pub struct QuadraticCalculator;

impl Calculator for QuadraticCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "quadratic",
            title: "Quadratic Equation Solver",
            category: Category::Math,
            description: "Real or complex roots of ax² + bx + c = 0.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("a", "a", FieldConstraints::required()),
            InputField::number("b", "b", FieldConstraints::required()),
            InputField::number("c", "c", FieldConstraints::required()),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let solution = solve(
            request.number("a")?,
            request.number("b")?,
            request.number("c")?,
        )?;

        let result = match &solution.roots {
            Roots::TwoReal { x1, x2 } => CalculationResult::new(ResultField::text(
                "Roots",
                format!("x₁ = {}, x₂ = {}", format_number(*x1), format_number(*x2)),
            ))
            .field(ResultField::number("x₁", *x1))
            .field(ResultField::number("x₂", *x2))
            .field(ResultField::text("Root type", "Two real roots")),
            Roots::Repeated { x } => {
                CalculationResult::new(ResultField::text("Root", format!("x = {}", format_number(*x))))
                    .field(ResultField::number("x", *x))
                    .field(ResultField::text("Root type", "One repeated real root"))
            }
            Roots::Complex { x1, x2 } => CalculationResult::new(ResultField::text(
                "Roots",
                format!("x₁ = {x1}, x₂ = {x2}"),
            ))
            .field(ResultField::text("x₁", x1.clone()))
            .field(ResultField::text("x₂", x2.clone()))
            .field(ResultField::text("Root type", "Two complex roots")),
        };

        let (vx, vy) = solution.vertex;
        Ok(result
            .field(ResultField::number("Discriminant", solution.discriminant))
            .field(ResultField::text(
                "Vertex",
                format!("({}, {})", format_number(vx), format_number(vy)),
            ))
            .field(ResultField::text("Axis of symmetry", format!("x = {}", format_number(vx))))
            .formula("x = (−b ± √(b² − 4ac)) ÷ 2a"))
    }
}

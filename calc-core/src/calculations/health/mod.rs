//! Anthropometric formulas. Each calculator applies exactly the variant the
//! user picked; variants are never averaged.

pub mod age;
pub mod bmi;
pub mod bmr;
pub mod bsa;

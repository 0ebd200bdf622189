//! Loans, savings growth and everyday money arithmetic.

pub mod compound;
pub mod loan;
pub mod simple;

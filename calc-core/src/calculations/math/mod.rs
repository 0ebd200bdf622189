pub mod logarithm;
pub mod quadratic;
pub mod statistics;
pub mod trig;

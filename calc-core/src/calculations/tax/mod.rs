//! Progressive band taxes.
//!
//! Rate tables live in `data/tax_bands.csv` and are compiled into the crate.
//! Each table covers a single tax year; there is no versioning across years.

pub mod bands;
pub mod calculators;
pub mod loader;

pub use bands::{BandBreakdown, BandSlice, accumulate};
pub use loader::{BandTable, BandTableError, BandTableLoader, BandTables, builtin_tables};

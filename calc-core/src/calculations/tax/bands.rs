//! Progressive band accumulation.
//!
//! Income is consumed band by band, lowest first:
//!
//! ```text
//! tax = Σ rate_k × min(remaining, width_k)
//! ```
//!
//! Each band covers `(min, max]`, so income exactly on a threshold is taxed
//! entirely at the lower band's rate.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use calc_core::calculations::tax::accumulate;
//! use calc_core::TaxBand;
//!
//! let band = |min, max, rate| TaxBand {
//!     table: "demo".to_string(),
//!     tax_year: "2024".to_string(),
//!     min,
//!     max,
//!     rate,
//! };
//! let bands = vec![
//!     band(dec!(0), Some(dec!(10000)), dec!(0)),
//!     band(dec!(10000), Some(dec!(40000)), dec!(0.20)),
//!     band(dec!(40000), None, dec!(0.40)),
//! ];
//!
//! let breakdown = accumulate(dec!(50000), &bands);
//! assert_eq!(breakdown.total, dec!(10000.00));
//! assert_eq!(breakdown.marginal_rate, dec!(0.40));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::round_half_up;
use crate::models::TaxBand;

/// The part of income that fell into one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSlice {
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandBreakdown {
    /// Total tax, rounded half-up to cents.
    pub total: Decimal,
    /// `total / income` as a fraction; zero for zero income.
    pub effective_rate: Decimal,
    /// Rate of the band the last unit of income fell into.
    pub marginal_rate: Decimal,
    /// Only bands that received income, in ascending order.
    pub slices: Vec<BandSlice>,
}

/// Accumulates tax over `bands`, which must be sorted and contiguous
/// (see [`BandTable`](super::BandTable)). Non-positive income owes nothing.
pub fn accumulate(
    income: Decimal,
    bands: &[TaxBand],
) -> BandBreakdown {
    let mut remaining = income.max(Decimal::ZERO);
    let mut total = Decimal::ZERO;
    let mut marginal_rate = bands.first().map_or(Decimal::ZERO, |b| b.rate);
    let mut slices = Vec::new();

    for band in bands {
        if remaining <= Decimal::ZERO {
            break;
        }
        let taxable = match band.width() {
            Some(width) => remaining.min(width),
            None => remaining,
        };
        if taxable <= Decimal::ZERO {
            continue;
        }
        let tax = taxable * band.rate;
        total += tax;
        remaining -= taxable;
        marginal_rate = band.rate;
        slices.push(BandSlice {
            min: band.min,
            max: band.max,
            rate: band.rate,
            taxable,
            tax: round_half_up(tax),
        });
    }

    let total = round_half_up(total);
    let effective_rate = if income > Decimal::ZERO {
        total / income
    } else {
        Decimal::ZERO
    };

    BandBreakdown {
        total,
        effective_rate,
        marginal_rate,
        slices,
    }
}

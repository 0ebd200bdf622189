use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of a progressive rate table.
///
/// `min` is exclusive and `max` inclusive, so a band covers `(min, max]`.
/// The top band has no `max`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBand {
    pub table: String,
    pub tax_year: String,
    pub min: Decimal,
    pub max: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBand {
    /// Width of the band, `None` for the open top band.
    pub fn width(&self) -> Option<Decimal> {
        self.max.map(|max| max - self.min)
    }
}

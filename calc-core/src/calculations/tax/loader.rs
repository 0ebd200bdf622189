use std::collections::BTreeMap;
use std::io::Read;
use std::sync::OnceLock;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::error::{CalcError, CalcResult};
use crate::models::TaxBand;

const BUILTIN_CSV: &str = include_str!("../../../data/tax_bands.csv");

/// Errors raised while reading or validating a band table.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BandTableError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("table '{0}' has no bands")]
    Empty(String),

    #[error("table '{table}' must start at 0, starts at {found}")]
    NotStartingAtZero { table: String, found: Decimal },

    #[error("table '{table}' has a gap or overlap: expected a band from {expected}, found {found}")]
    NotContiguous {
        table: String,
        expected: Decimal,
        found: Decimal,
    },

    #[error("table '{table}' has an empty or inverted band starting at {min}")]
    InvertedBand { table: String, min: Decimal },

    #[error("table '{0}' must end with exactly one open band")]
    OpenBandNotLast(String),

    #[error("table '{table}' has a negative rate {rate}")]
    NegativeRate { table: String, rate: Decimal },

    #[error("table '{0}' mixes tax years")]
    MixedTaxYears(String),

    #[error("unknown tax table '{0}'")]
    UnknownTable(String),
}

impl From<csv::Error> for BandTableError {
    fn from(err: csv::Error) -> Self {
        BandTableError::CsvParse(err.to_string())
    }
}

/// A single row of the band CSV.
///
/// - `table`: table name, e.g. `uk-income-tax`
/// - `tax_year`: free-form year label (`2024/25`, `2024`)
/// - `min`: lower bound (exclusive)
/// - `max`: upper bound (inclusive, empty for the open top band)
/// - `rate`: marginal rate as a fraction (`0.20` for 20%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct BandRecord {
    table: String,
    tax_year: String,
    min: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    max: Option<Decimal>,
    rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// A validated, ascending, contiguous band table.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    name: String,
    tax_year: String,
    bands: Vec<TaxBand>,
}

impl BandTable {
    /// Sorts and validates `bands` as one table.
    ///
    /// # Errors
    ///
    /// Any [`BandTableError`] describing why the bands do not form a
    /// progressive table starting at zero.
    pub fn new(
        name: &str,
        mut bands: Vec<TaxBand>,
    ) -> Result<Self, BandTableError> {
        bands.sort_by(|a, b| a.min.cmp(&b.min));

        let first = bands
            .first()
            .ok_or_else(|| BandTableError::Empty(name.to_string()))?;
        if !first.min.is_zero() {
            return Err(BandTableError::NotStartingAtZero {
                table: name.to_string(),
                found: first.min,
            });
        }
        let tax_year = first.tax_year.clone();

        let last_index = bands.len() - 1;
        for (i, band) in bands.iter().enumerate() {
            if band.tax_year != tax_year {
                return Err(BandTableError::MixedTaxYears(name.to_string()));
            }
            if band.rate.is_sign_negative() && !band.rate.is_zero() {
                return Err(BandTableError::NegativeRate {
                    table: name.to_string(),
                    rate: band.rate,
                });
            }
            match band.max {
                Some(max) if max <= band.min => {
                    return Err(BandTableError::InvertedBand {
                        table: name.to_string(),
                        min: band.min,
                    });
                }
                None if i != last_index => {
                    return Err(BandTableError::OpenBandNotLast(name.to_string()));
                }
                Some(_) if i == last_index => {
                    return Err(BandTableError::OpenBandNotLast(name.to_string()));
                }
                _ => {}
            }
            if let Some(next) = bands.get(i + 1) {
                let expected = band.max.unwrap_or(band.min);
                if next.min != expected {
                    return Err(BandTableError::NotContiguous {
                        table: name.to_string(),
                        expected,
                        found: next.min,
                    });
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            tax_year,
            bands,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tax_year(&self) -> &str {
        &self.tax_year
    }

    pub fn bands(&self) -> &[TaxBand] {
        &self.bands
    }

    /// Rate of the open top band.
    pub fn top_rate(&self) -> Decimal {
        self.bands.last().map_or(Decimal::ZERO, |b| b.rate)
    }
}

/// Every table parsed from one CSV source, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandTables {
    tables: BTreeMap<String, BandTable>,
}

impl BandTables {
    pub fn get(
        &self,
        name: &str,
    ) -> Result<&BandTable, BandTableError> {
        self.tables
            .get(name)
            .ok_or_else(|| BandTableError::UnknownTable(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Reads band tables from CSV.
pub struct BandTableLoader;

impl BandTableLoader {
    /// Parses CSV rows into bands, in file order.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxBand>, BandTableError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut bands = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BandRecord = result?;
            bands.push(TaxBand {
                table: record.table,
                tax_year: record.tax_year,
                min: record.min,
                max: record.max,
                rate: record.rate,
            });
        }

        Ok(bands)
    }

    /// Parses and validates every table in the CSV.
    pub fn load<R: Read>(reader: R) -> Result<BandTables, BandTableError> {
        let mut grouped: BTreeMap<String, Vec<TaxBand>> = BTreeMap::new();
        for band in Self::parse(reader)? {
            grouped.entry(band.table.clone()).or_default().push(band);
        }

        let tables = grouped
            .into_iter()
            .map(|(name, bands)| BandTable::new(&name, bands).map(|table| (name, table)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(BandTables { tables })
    }
}

static BUILTIN: OnceLock<Result<BandTables, BandTableError>> = OnceLock::new();

/// The tables compiled into the crate, parsed on first use.
pub fn builtin_tables() -> CalcResult<&'static BandTables> {
    BUILTIN
        .get_or_init(|| BandTableLoader::load(BUILTIN_CSV.as_bytes()))
        .as_ref()
        .map_err(|e| CalcError::domain("tax", e.to_string()))
}

/// Looks up one built-in table by name.
pub fn builtin_table(name: &str) -> CalcResult<&'static BandTable> {
    builtin_tables()?
        .get(name)
        .map_err(|e| CalcError::domain("tax", e.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = r#"table,tax_year,min,max,rate
demo,2024,0,10000,0.10
demo,2024,10000,,0.20
"#;

    #[test]
    fn parse_reads_open_top_band() {
        let bands = BandTableLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].max, Some(dec!(10000)));
        assert_eq!(bands[1].max, None);
        assert_eq!(bands[1].rate, dec!(0.20));
    }

    #[test]
    fn load_groups_by_table() {
        let tables = BandTableLoader::load(TEST_CSV.as_bytes()).unwrap();
        let demo = tables.get("demo").unwrap();

        assert_eq!(demo.tax_year(), "2024");
        assert_eq!(demo.top_rate(), dec!(0.20));
    }

    #[test]
    fn builtin_tables_are_all_valid() {
        let tables = builtin_tables().unwrap();

        assert_eq!(tables.len(), 7);
        assert!(tables.get("uk-income-tax").is_ok());
        assert!(tables.get("canada-federal").is_ok());
    }

    #[test]
    fn gap_between_bands_is_rejected() {
        let csv = "table,tax_year,min,max,rate\nx,2024,0,100,0.1\nx,2024,150,,0.2\n";

        let err = BandTableLoader::load(csv.as_bytes()).unwrap_err();

        assert_eq!(
            err,
            BandTableError::NotContiguous {
                table: "x".to_string(),
                expected: dec!(100),
                found: dec!(150),
            }
        );
    }

    #[test]
    fn table_must_start_at_zero() {
        let csv = "table,tax_year,min,max,rate\nx,2024,10,,0.1\n";

        let err = BandTableLoader::load(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, BandTableError::NotStartingAtZero { .. }));
    }

    #[test]
    fn closed_top_band_is_rejected() {
        let csv = "table,tax_year,min,max,rate\nx,2024,0,100,0.1\n";

        let err = BandTableLoader::load(csv.as_bytes()).unwrap_err();

        assert_eq!(err, BandTableError::OpenBandNotLast("x".to_string()));
    }

    #[test]
    fn negative_rate_is_rejected() {
        let csv = "table,tax_year,min,max,rate\nx,2024,0,,-0.1\n";

        let err = BandTableLoader::load(csv.as_bytes()).unwrap_err();

        assert!(matches!(err, BandTableError::NegativeRate { .. }));
    }

    #[test]
    fn unordered_rows_are_sorted() {
        let csv = "table,tax_year,min,max,rate\nx,2024,100,,0.2\nx,2024,0,100,0.1\n";

        let tables = BandTableLoader::load(csv.as_bytes()).unwrap();

        assert_eq!(tables.get("x").unwrap().bands()[0].min, dec!(0));
    }

    #[test]
    fn unknown_table_is_reported() {
        let tables = BandTableLoader::load(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(
            tables.get("nope").unwrap_err(),
            BandTableError::UnknownTable("nope".to_string())
        );
    }
}

//! Unit conversion through a common base unit.
//!
//! Every category names one base unit and lists each supported unit with its
//! factor, "units per 1 base unit". Converting `A → B` goes through the base:
//!
//! ```text
//! base   = value / factor[A]
//! result = base × factor[B]
//! ```
//!
//! Adding a unit means adding one row; no pairwise rates exist anywhere.
//! Temperature is affine rather than proportional and has its own converter.

use crate::calculations::common::format_number;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult, ValidationError};
use crate::models::{CalculationRequest, CalculationResult, FieldConstraints, InputField, ResultField};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub code: &'static str,
    pub label: &'static str,
    /// Units per 1 base unit.
    pub factor: f64,
}

const fn unit(
    code: &'static str,
    label: &'static str,
    factor: f64,
) -> Unit {
    Unit { code, label, factor }
}

#[derive(Debug, PartialEq)]
pub struct UnitCategory {
    pub slug: &'static str,
    pub title: &'static str,
    pub base: &'static str,
    pub units: &'static [Unit],
}

impl UnitCategory {
    pub fn unit(
        &self,
        code: &str,
    ) -> Option<&Unit> {
        self.units.iter().find(|u| u.code == code)
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.units.iter().map(|u| u.code).collect()
    }

    fn require(
        &self,
        code: &str,
        field: &str,
    ) -> Result<&Unit, ValidationError> {
        self.unit(code).ok_or_else(|| ValidationError::NotAllowed {
            field: field.to_string(),
            value: code.to_string(),
        })
    }

    /// Converts `value` from unit `from` to unit `to`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotAllowed`] when either code is not in this category.
    pub fn convert(
        &self,
        value: f64,
        from: &str,
        to: &str,
    ) -> Result<f64, ValidationError> {
        let from = self.require(from, "From")?;
        let to = self.require(to, "To")?;
        let base = value / from.factor;
        Ok(base * to.factor)
    }
}

static LENGTH: UnitCategory = UnitCategory {
    slug: "length-converter",
    title: "Length Converter",
    base: "m",
    units: &[
        unit("m", "Meters", 1.0),
        unit("km", "Kilometers", 0.001),
        unit("cm", "Centimeters", 100.0),
        unit("mm", "Millimeters", 1000.0),
        unit("um", "Micrometers", 1e6),
        unit("mi", "Miles", 1.0 / 1609.344),
        unit("yd", "Yards", 1.0 / 0.9144),
        unit("ft", "Feet", 1.0 / 0.3048),
        unit("in", "Inches", 1.0 / 0.0254),
        unit("nmi", "Nautical miles", 1.0 / 1852.0),
    ],
};

static MASS: UnitCategory = UnitCategory {
    slug: "weight-converter",
    title: "Weight Converter",
    base: "kg",
    units: &[
        unit("kg", "Kilograms", 1.0),
        unit("g", "Grams", 1000.0),
        unit("mg", "Milligrams", 1e6),
        unit("t", "Metric tons", 0.001),
        unit("lb", "Pounds", 1.0 / 0.45359237),
        unit("oz", "Ounces", 1.0 / 0.028349523125),
        unit("st", "Stones", 1.0 / 6.35029318),
        unit("ton", "US short tons", 1.0 / 907.18474),
    ],
};

static VOLUME: UnitCategory = UnitCategory {
    slug: "volume-converter",
    title: "Volume Converter",
    base: "l",
    units: &[
        unit("l", "Liters", 1.0),
        unit("ml", "Milliliters", 1000.0),
        unit("m3", "Cubic meters", 0.001),
        unit("gal", "US gallons", 1.0 / 3.785411784),
        unit("qt", "US quarts", 1.0 / 0.946352946),
        unit("pt", "US pints", 1.0 / 0.473176473),
        unit("cup", "US cups", 1.0 / 0.2365882365),
        unit("floz", "US fluid ounces", 1.0 / 0.0295735295625),
        unit("imp-gal", "Imperial gallons", 1.0 / 4.54609),
        unit("tbsp", "Tablespoons", 1.0 / 0.01478676478125),
        unit("tsp", "Teaspoons", 1.0 / 0.00492892159375),
    ],
};

static AREA: UnitCategory = UnitCategory {
    slug: "area-converter",
    title: "Area Converter",
    base: "m2",
    units: &[
        unit("m2", "Square meters", 1.0),
        unit("km2", "Square kilometers", 1e-6),
        unit("cm2", "Square centimeters", 1e4),
        unit("ha", "Hectares", 1e-4),
        unit("acre", "Acres", 1.0 / 4046.8564224),
        unit("ft2", "Square feet", 1.0 / 0.09290304),
        unit("yd2", "Square yards", 1.0 / 0.83612736),
        unit("in2", "Square inches", 1.0 / 0.00064516),
        unit("mi2", "Square miles", 1.0 / 2_589_988.110336),
    ],
};

static SPEED: UnitCategory = UnitCategory {
    slug: "speed-converter",
    title: "Speed Converter",
    base: "mps",
    units: &[
        unit("mps", "Meters per second", 1.0),
        unit("kph", "Kilometers per hour", 3.6),
        unit("mph", "Miles per hour", 1.0 / 0.44704),
        unit("knot", "Knots", 3600.0 / 1852.0),
        unit("fps", "Feet per second", 1.0 / 0.3048),
    ],
};

static TIME: UnitCategory = UnitCategory {
    slug: "time-converter",
    title: "Time Converter",
    base: "s",
    units: &[
        unit("s", "Seconds", 1.0),
        unit("ms", "Milliseconds", 1000.0),
        unit("min", "Minutes", 1.0 / 60.0),
        unit("h", "Hours", 1.0 / 3600.0),
        unit("d", "Days", 1.0 / 86_400.0),
        unit("wk", "Weeks", 1.0 / 604_800.0),
        // Julian year of 365.25 days.
        unit("yr", "Years", 1.0 / 31_557_600.0),
    ],
};

static DATA: UnitCategory = UnitCategory {
    slug: "data-storage-converter",
    title: "Data Storage Converter",
    base: "B",
    units: &[
        unit("B", "Bytes", 1.0),
        unit("bit", "Bits", 8.0),
        unit("KB", "Kilobytes", 1e-3),
        unit("MB", "Megabytes", 1e-6),
        unit("GB", "Gigabytes", 1e-9),
        unit("TB", "Terabytes", 1e-12),
        unit("KiB", "Kibibytes", 1.0 / 1024.0),
        unit("MiB", "Mebibytes", 1.0 / 1_048_576.0),
        unit("GiB", "Gibibytes", 1.0 / 1_073_741_824.0),
        unit("TiB", "Tebibytes", 1.0 / 1_099_511_627_776.0),
    ],
};

static ENERGY: UnitCategory = UnitCategory {
    slug: "energy-converter",
    title: "Energy Converter",
    base: "J",
    units: &[
        unit("J", "Joules", 1.0),
        unit("kJ", "Kilojoules", 1e-3),
        unit("cal", "Calories", 1.0 / 4.184),
        unit("kcal", "Kilocalories", 1.0 / 4184.0),
        unit("Wh", "Watt-hours", 1.0 / 3600.0),
        unit("kWh", "Kilowatt-hours", 1.0 / 3.6e6),
        unit("BTU", "British thermal units", 1.0 / 1055.05585262),
        unit("eV", "Electronvolts", 1.0 / 1.602176634e-19),
    ],
};

static PRESSURE: UnitCategory = UnitCategory {
    slug: "pressure-converter",
    title: "Pressure Converter",
    base: "Pa",
    units: &[
        unit("Pa", "Pascals", 1.0),
        unit("kPa", "Kilopascals", 1e-3),
        unit("bar", "Bar", 1e-5),
        unit("atm", "Atmospheres", 1.0 / 101_325.0),
        unit("psi", "Pounds per square inch", 1.0 / 6894.757293168),
        unit("mmHg", "Millimeters of mercury", 1.0 / 133.322387415),
    ],
};

static CATEGORIES: [&UnitCategory; 9] = [
    &LENGTH, &MASS, &VOLUME, &AREA, &SPEED, &TIME, &DATA, &ENERGY, &PRESSURE,
];

/// Every proportional unit category.
pub fn categories() -> impl Iterator<Item = &'static UnitCategory> {
    CATEGORIES.iter().copied()
}

/// Calculator page for one [`UnitCategory`].
pub struct ConversionCalculator {
    category: &'static UnitCategory,
}

impl ConversionCalculator {
    pub fn new(category: &'static UnitCategory) -> Self {
        Self { category }
    }
}

impl Calculator for ConversionCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: self.category.slug,
            title: self.category.title,
            category: Category::Conversion,
            description: "Convert between units through a common base unit.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        let codes = self.category.codes();
        let mut to = InputField::choice("to", "To", &codes);
        if let Some(second) = codes.get(1) {
            to = to.with_default(second);
        }
        vec![
            InputField::number("value", "Value", FieldConstraints::required()),
            InputField::choice("from", "From", &codes),
            to,
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let value = request.number("value")?;
        let from = request.text("from")?;
        let to = request.text("to")?;
        let converted = self.category.convert(value, from, to)?;
        let base = self.category.convert(value, from, self.category.base)?;
        let rate = self.category.convert(1.0, from, to)?;

        Ok(
            CalculationResult::new(ResultField::number("Result", converted).with_unit(to))
                .field(ResultField::number("In base unit", base).with_unit(self.category.base))
                .field(ResultField::text(
                    "Rate",
                    format!("1 {from} = {} {to}", format_number(rate)),
                ))
                .formula(format!(
                    "result = value ÷ factor[{from}] × factor[{to}] (base: {})",
                    self.category.base
                )),
        )
    }
}

// =============================================================================
// Temperature
// =============================================================================

pub const ABSOLUTE_ZERO_C: f64 = -273.15;
pub const TEMPERATURE_UNITS: [&str; 4] = ["C", "F", "K", "R"];

fn to_celsius(
    value: f64,
    unit: &str,
) -> Option<f64> {
    match unit {
        "C" => Some(value),
        "F" => Some((value - 32.0) * 5.0 / 9.0),
        "K" => Some(value + ABSOLUTE_ZERO_C),
        "R" => Some((value - 491.67) * 5.0 / 9.0),
        _ => None,
    }
}

fn from_celsius(
    celsius: f64,
    unit: &str,
) -> Option<f64> {
    match unit {
        "C" => Some(celsius),
        "F" => Some(celsius * 9.0 / 5.0 + 32.0),
        "K" => Some(celsius - ABSOLUTE_ZERO_C),
        "R" => Some((celsius - ABSOLUTE_ZERO_C) * 9.0 / 5.0),
        _ => None,
    }
}

/// Converts a temperature through Celsius.
///
/// # Errors
///
/// * [`ValidationError::NotAllowed`] for an unknown unit.
/// * [`CalcError::Domain`] below absolute zero.
pub fn convert_temperature(
    value: f64,
    from: &str,
    to: &str,
) -> CalcResult<f64> {
    let not_allowed = |field: &str, unit: &str| ValidationError::NotAllowed {
        field: field.to_string(),
        value: unit.to_string(),
    };
    let celsius = to_celsius(value, from).ok_or_else(|| not_allowed("From", from))?;
    // Tolerate rounding at exactly 0 K.
    if celsius < ABSOLUTE_ZERO_C - 1e-9 {
        return Err(CalcError::domain(
            "temperature-converter",
            "temperature is below absolute zero",
        ));
    }
    Ok(from_celsius(celsius, to).ok_or_else(|| not_allowed("To", to))?)
}

pub struct TemperatureCalculator;

impl Calculator for TemperatureCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "temperature-converter",
            title: "Temperature Converter",
            category: Category::Conversion,
            description: "Celsius, Fahrenheit, Kelvin and Rankine.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::number("value", "Temperature", FieldConstraints::required()),
            InputField::choice("from", "From", &TEMPERATURE_UNITS),
            InputField::choice("to", "To", &TEMPERATURE_UNITS).with_default("F"),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let value = request.number("value")?;
        let from = request.text("from")?;
        let to = request.text("to")?;
        let converted = convert_temperature(value, from, to)?;

        Ok(
            CalculationResult::new(ResultField::number("Result", converted).with_unit(to))
                .field(ResultField::number("Celsius", convert_temperature(value, from, "C")?))
                .field(ResultField::number("Kelvin", convert_temperature(value, from, "K")?))
                .formula("°F = °C × 9/5 + 32, K = °C + 273.15"),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn relative_eq(
        a: f64,
        b: f64,
    ) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs())
    }

    #[test]
    fn mile_to_kilometers() {
        let km = LENGTH.convert(1.0, "mi", "km").unwrap();

        assert!(relative_eq(km, 1.609344));
    }

    #[test]
    fn pounds_to_kilograms() {
        let kg = MASS.convert(10.0, "lb", "kg").unwrap();

        assert!(relative_eq(kg, 4.5359237));
    }

    #[test]
    fn kibibyte_is_1024_bytes() {
        assert_eq!(DATA.convert(1.0, "KiB", "B").unwrap(), 1024.0);
    }

    #[test]
    fn every_pair_round_trips() {
        let values = [1e-3, 0.5, 1.0, 42.0, 12_345.678];
        for category in categories() {
            for from in category.units {
                for to in category.units {
                    for v in values {
                        let there = category.convert(v, from.code, to.code).unwrap();
                        let back = category.convert(there, to.code, from.code).unwrap();
                        assert!(
                            relative_eq(back, v),
                            "{}: {v} {} -> {} -> {back}",
                            category.slug,
                            from.code,
                            to.code
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn every_category_lists_its_base_with_factor_one() {
        for category in categories() {
            assert_eq!(category.unit(category.base).map(|u| u.factor), Some(1.0));
        }
    }

    #[test]
    fn unknown_unit_is_not_allowed() {
        let err = LENGTH.convert(1.0, "furlong", "m").unwrap_err();

        assert_eq!(
            err,
            ValidationError::NotAllowed {
                field: "From".to_string(),
                value: "furlong".to_string(),
            }
        );
    }

    #[test]
    fn boiling_point_in_fahrenheit() {
        assert_eq!(convert_temperature(100.0, "C", "F").unwrap(), 212.0);
    }

    #[test]
    fn temperature_round_trips() {
        for from in TEMPERATURE_UNITS {
            for to in TEMPERATURE_UNITS {
                let there = convert_temperature(300.0, from, to).unwrap();
                let back = convert_temperature(there, to, from).unwrap();
                assert!(relative_eq(back, 300.0), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn below_absolute_zero_is_domain_error() {
        let result = convert_temperature(-10.0, "K", "C");

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }

    #[test]
    fn conversion_slugs_are_distinct() {
        let mut slugs: Vec<_> = categories().map(|c| c.slug).collect();
        slugs.sort_unstable();
        slugs.dedup();

        assert_eq!(slugs.len(), CATEGORIES.len());
    }
}

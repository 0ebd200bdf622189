//! The generic validate-compute contract shared by every calculator page, and
//! the catalog that registers them.
//!
//! A calculator is a field schema plus a pure formula. [`run`] is the whole
//! pipeline: raw strings are validated into a
//! [`CalculationRequest`], the formula turns it into a [`CalculationResult`],
//! and any non-finite number in the result is rejected as a domain error
//! rather than shown as `NaN`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::calculations::{conversion, finance, health, math, science, tax};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, InputField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Finance,
    Tax,
    Health,
    Math,
    Conversion,
    Science,
    Everyday,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[
            Category::Finance,
            Category::Tax,
            Category::Health,
            Category::Math,
            Category::Conversion,
            Category::Science,
            Category::Everyday,
        ]
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Finance => "finance",
            Category::Tax => "tax",
            Category::Health => "health",
            Category::Math => "math",
            Category::Conversion => "conversion",
            Category::Science => "science",
            Category::Everyday => "everyday",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Finance => "Finance",
            Category::Tax => "Tax",
            Category::Health => "Health & Fitness",
            Category::Math => "Math",
            Category::Conversion => "Unit Conversion",
            Category::Science => "Science",
            Category::Everyday => "Everyday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.slug() == s)
    }
}

/// Static description of a calculator page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculatorMeta {
    pub slug: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub description: &'static str,
    /// Live calculators recompute on every input change instead of waiting
    /// for an explicit "Calculate".
    pub live: bool,
}

/// A single-purpose calculator: a field schema and a pure formula.
///
/// `compute` must not keep state between calls; two calls with the same
/// request return identical results.
pub trait Calculator: Send + Sync {
    fn meta(&self) -> CalculatorMeta;

    fn fields(&self) -> Vec<InputField>;

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult>;
}

/// Validates `raw` against the calculator's schema and computes the result.
///
/// # Errors
///
/// * [`CalcError::Validation`] when any field fails to parse or is out of range.
/// * [`CalcError::Domain`] when the formula has no finite answer.
pub fn run(
    calculator: &dyn Calculator,
    raw: &BTreeMap<String, String>,
) -> CalcResult<CalculationResult> {
    let fields = calculator.fields();
    let request = CalculationRequest::build(&fields, raw)?;
    evaluate(calculator, &request)
}

/// Computes an already validated request and rejects non-finite output.
pub fn evaluate(
    calculator: &dyn Calculator,
    request: &CalculationRequest,
) -> CalcResult<CalculationResult> {
    let result = calculator.compute(request)?;
    if let Some(label) = result.first_non_finite() {
        return Err(CalcError::domain(
            calculator.meta().slug,
            format!("{label} has no finite value for these inputs"),
        ));
    }
    Ok(result)
}

/// Ordered registry of calculators, keyed by slug.
pub struct Catalog {
    calculators: Vec<Box<dyn Calculator>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            calculators: Vec::new(),
        }
    }

    /// Every calculator shipped with the site.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        catalog.register(Box::new(finance::loan::LoanCalculator));
        catalog.register(Box::new(finance::loan::MortgageCalculator));
        catalog.register(Box::new(finance::loan::CarLoanCalculator));
        catalog.register(Box::new(finance::loan::RefinanceCalculator));
        catalog.register(Box::new(finance::compound::CompoundInterestCalculator));
        catalog.register(Box::new(finance::compound::RothIraCalculator));
        catalog.register(Box::new(finance::simple::SimpleInterestCalculator));
        catalog.register(Box::new(finance::simple::DiscountCalculator));
        catalog.register(Box::new(finance::simple::PercentageCalculator));
        catalog.register(Box::new(finance::simple::PercentChangeCalculator));
        catalog.register(Box::new(finance::simple::TipCalculator));

        catalog.register(Box::new(tax::calculators::UkIncomeTaxCalculator));
        catalog.register(Box::new(tax::calculators::UkNationalInsuranceCalculator));
        catalog.register(Box::new(tax::calculators::UkStampDutyCalculator));
        catalog.register(Box::new(tax::calculators::CanadaIncomeTaxCalculator));
        catalog.register(Box::new(tax::calculators::UsSocialSecurityCalculator));

        catalog.register(Box::new(math::trig::TrigonometryCalculator));
        catalog.register(Box::new(math::quadratic::QuadraticCalculator));
        catalog.register(Box::new(math::statistics::StatisticsCalculator));
        catalog.register(Box::new(math::logarithm::LogarithmCalculator));

        for category in conversion::categories() {
            catalog.register(Box::new(conversion::ConversionCalculator::new(category)));
        }
        catalog.register(Box::new(conversion::TemperatureCalculator));

        catalog.register(Box::new(science::decay::HalfLifeCalculator));
        catalog.register(Box::new(science::physics::OhmsLawCalculator));
        catalog.register(Box::new(science::physics::KineticEnergyCalculator));

        catalog.register(Box::new(health::bmi::BmiCalculator));
        catalog.register(Box::new(health::bsa::BodySurfaceAreaCalculator));
        catalog.register(Box::new(health::bmr::BmrCalculator));
        catalog.register(Box::new(health::age::AgeCalculator));

        catalog
    }

    /// Adds a calculator. A calculator with the same slug is replaced in place.
    pub fn register(
        &mut self,
        calculator: Box<dyn Calculator>,
    ) {
        let slug = calculator.meta().slug;
        match self.calculators.iter().position(|c| c.meta().slug == slug) {
            Some(index) => self.calculators[index] = calculator,
            None => self.calculators.push(calculator),
        }
    }

    pub fn get(
        &self,
        slug: &str,
    ) -> Option<&dyn Calculator> {
        self.calculators
            .iter()
            .find(|c| c.meta().slug == slug)
            .map(|c| c.as_ref())
    }

    /// Like [`Catalog::get`] but fails with [`CalcError::UnknownCalculator`].
    pub fn require(
        &self,
        slug: &str,
    ) -> CalcResult<&dyn Calculator> {
        self.get(slug)
            .ok_or_else(|| CalcError::UnknownCalculator(slug.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Calculator> {
        self.calculators.iter().map(|c| c.as_ref())
    }

    pub fn by_category(
        &self,
        category: Category,
    ) -> Vec<&dyn Calculator> {
        self.iter()
            .filter(|c| c.meta().category == category)
            .collect()
    }

    pub fn slugs(&self) -> Vec<&'static str> {
        self.iter().map(|c| c.meta().slug).collect()
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{FieldConstraints, ResultField};

    struct Reciprocal;

    impl Calculator for Reciprocal {
        fn meta(&self) -> CalculatorMeta {
            CalculatorMeta {
                slug: "reciprocal",
                title: "Reciprocal",
                category: Category::Math,
                description: "1 / x",
                live: false,
            }
        }

        fn fields(&self) -> Vec<InputField> {
            vec![InputField::number("x", "X", FieldConstraints::required())]
        }

        fn compute(
            &self,
            request: &CalculationRequest,
        ) -> CalcResult<CalculationResult> {
            let x = request.number("x")?;
            Ok(CalculationResult::new(ResultField::number("1/x", 1.0 / x)))
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn run_rejects_infinite_output_as_domain_error() {
        let result = run(&Reciprocal, &raw(&[("x", "0")]));

        assert!(matches!(result, Err(CalcError::Domain { .. })));
    }

    #[test]
    fn run_surfaces_validation_before_compute() {
        let result = run(&Reciprocal, &raw(&[("x", "abc")]));

        assert_eq!(result.map_err(|e| e.error_code()), Err("NOT_A_NUMBER"));
    }

    #[test]
    fn builtin_slugs_are_unique() {
        let catalog = Catalog::builtin();
        let slugs = catalog.slugs();
        let unique: HashSet<_> = slugs.iter().collect();

        assert_eq!(unique.len(), slugs.len());
    }

    #[test]
    fn builtin_covers_every_category() {
        let catalog = Catalog::builtin();

        for category in Category::all() {
            assert!(
                !catalog.by_category(*category).is_empty(),
                "no calculators in {category:?}"
            );
        }
    }

    #[test]
    fn register_replaces_same_slug() {
        let mut catalog = Catalog::new();
        catalog.register(Box::new(Reciprocal));
        catalog.register(Box::new(Reciprocal));

        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn require_unknown_slug_fails() {
        let catalog = Catalog::builtin();

        assert_eq!(
            catalog.require("warp-drive").err(),
            Some(CalcError::UnknownCalculator("warp-drive".to_string()))
        );
    }
}

use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{CalculationRequest, CalculationResult, InputField, ResultField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Age {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub total_days: i64,
    pub days_to_next_birthday: i64,
}

/// Calendar age of someone born on `birth` as of `as_of`.
///
/// Whole months are counted with chrono's month arithmetic, so a birthday on
/// the 31st is reached on the last day of shorter months.
///
/// # Errors
///
/// [`CalcError::Domain`] when `birth` is after `as_of`.
pub fn age_between(
    birth: NaiveDate,
    as_of: NaiveDate,
) -> CalcResult<Age> {
    if birth > as_of {
        return Err(CalcError::domain("age", "birth date is after the as-of date"));
    }

    let mut total_months = (as_of.year() - birth.year()) * 12 + as_of.month() as i32 - birth.month() as i32;
    let add = |months: i32| {
        birth
            .checked_add_months(Months::new(months.max(0) as u32))
            .unwrap_or(NaiveDate::MAX)
    };
    if add(total_months) > as_of {
        total_months -= 1;
    }
    let anchor = add(total_months);
    let total_months = total_months.max(0) as u32;

    Ok(Age {
        years: total_months / 12,
        months: total_months % 12,
        days: (as_of - anchor).num_days() as u32,
        total_days: (as_of - birth).num_days(),
        days_to_next_birthday: (next_birthday(birth, as_of) - as_of).num_days(),
    })
}

/// The first birthday strictly after `as_of`, or `as_of` itself when it is the
/// birthday.
fn next_birthday(
    birth: NaiveDate,
    as_of: NaiveDate,
) -> NaiveDate {
    let years = (as_of.year() - birth.year()).max(0) as u32;
    let this_year = birth
        .checked_add_months(Months::new(years * 12))
        .unwrap_or(as_of);
    if this_year >= as_of {
        this_year
    } else {
        birth
            .checked_add_months(Months::new((years + 1) * 12))
            .unwrap_or(as_of)
    }
}

pub struct AgeCalculator;

impl Calculator for AgeCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "age",
            title: "Age Calculator",
            category: Category::Everyday,
            description: "Exact age in years, months and days.",
            live: true,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            InputField::date("birth_date", "Date of birth", true),
            InputField::date("as_of", "Age as of", false),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let birth = request.date("birth_date")?;
        let as_of = request
            .optional_date("as_of")
            .unwrap_or_else(|| Utc::now().date_naive());
        let age = age_between(birth, as_of)?;

        Ok(CalculationResult::new(ResultField::text(
            "Age",
            format!("{} years, {} months, {} days", age.years, age.months, age.days),
        ))
        .field(ResultField::number("Years", f64::from(age.years)))
        .field(ResultField::number("Total days", age.total_days as f64))
        .field(ResultField::number("Total weeks", (age.total_days / 7) as f64))
        .field(ResultField::number("Days to next birthday", age.days_to_next_birthday as f64))
        .formula("age = as-of date − birth date (calendar months, then days)"))
    }
}

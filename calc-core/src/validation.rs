//! Parsing and range-checking of raw form input.
//!
//! Every function here is pure: the same raw text and constraints always yield
//! the same value or the same error kind. Surfacing the error to the user is the
//! caller's job.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::models::FieldConstraints;

/// Trims whitespace and drops `,` thousands separators. Commas anywhere else
/// are kept so the text fails to parse.
fn normalize_numeric_input(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_thousands_grouped(trimmed) {
        trimmed.replace(',', "")
    } else {
        trimmed.to_string()
    }
}

/// `1,234` or `-12,345,678.9`: one to three leading digits, then comma
/// separated groups of exactly three, with no comma after the point.
fn is_thousands_grouped(text: &str) -> bool {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if !integer.contains(',') || fraction.contains(',') {
        return false;
    }

    let all_digits = |group: &str| group.bytes().all(|b| b.is_ascii_digit());
    let mut groups = integer.split(',');
    let lead_ok = groups
        .next()
        .is_some_and(|lead| (1..=3).contains(&lead.len()) && all_digits(lead));
    lead_ok && groups.all(|group| group.len() == 3 && all_digits(group))
}

/// Parses a mandatory numeric field.
///
/// # Errors
///
/// * [`ValidationError::RequiredFieldMissing`] when `raw` is blank.
/// * [`ValidationError::NotANumber`] when the trimmed text is not a finite decimal.
/// * [`ValidationError::OutOfRange`] when the value violates `min`/`max` (inclusive).
///
/// # Examples
///
/// ```
/// use calc_core::models::FieldConstraints;
/// use calc_core::validation::parse_number;
///
/// let percent = FieldConstraints::required().range(0.0, 100.0);
/// assert_eq!(parse_number(" 12.5 ", &percent, "Discount"), Ok(12.5));
/// assert!(parse_number("150", &percent, "Discount").is_err());
/// ```
pub fn parse_number(
    raw: &str,
    constraints: &FieldConstraints,
    field: &str,
) -> Result<f64, ValidationError> {
    parse_optional_number(raw, constraints, field)?.ok_or_else(|| {
        ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }
    })
}

/// Parses a numeric field that may be left blank.
///
/// Blank input yields `Ok(None)` unless the constraints mark the field as
/// required, in which case it is [`ValidationError::RequiredFieldMissing`].
pub fn parse_optional_number(
    raw: &str,
    constraints: &FieldConstraints,
    field: &str,
) -> Result<Option<f64>, ValidationError> {
    let normalized = normalize_numeric_input(raw);
    if normalized.is_empty() {
        if constraints.required {
            return Err(ValidationError::RequiredFieldMissing {
                field: field.to_string(),
            });
        }
        return Ok(None);
    }

    let value: f64 = normalized
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field: field.to_string(),
            value: raw.trim().to_string(),
        })?;

    let below = constraints.min.is_some_and(|min| value < min);
    let above = constraints.max.is_some_and(|max| value > max);
    if below || above {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min: constraints.min,
            max: constraints.max,
        });
    }

    Ok(Some(value))
}

/// Parses an enum field. Matching is case-insensitive; the canonical spelling
/// from `allowed_values` is returned.
pub fn parse_choice(
    raw: &str,
    constraints: &FieldConstraints,
    field: &str,
) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }

    constraints
        .allowed_values
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(trimmed))
        .cloned()
        .ok_or_else(|| ValidationError::NotAllowed {
            field: field.to_string(),
            value: trimmed.to_string(),
        })
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(
    raw: &str,
    field: &str,
) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field: field.to_string(),
        value: trimmed.to_string(),
    })
}

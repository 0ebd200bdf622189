use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, CalcResult, ValidationError};
use crate::models::{FieldKind, InputField};
use crate::validation::{parse_choice, parse_date, parse_optional_number};

/// A parsed input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Number(f64),
    Date(NaiveDate),
    /// Enum choices and free text share the string representation.
    Text(String),
}

/// Immutable snapshot of every field's parsed value at the moment a
/// calculation is invoked.
///
/// The only way to obtain one from form input is [`CalculationRequest::build`],
/// which refuses to produce a request while any required field is missing or
/// any field violates its constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    values: BTreeMap<String, InputValue>,
}

impl CalculationRequest {
    /// Validates `raw` against `fields`, in field order.
    ///
    /// A key absent from `raw` falls back to the field's default text. Optional
    /// fields left blank are simply absent from the request.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn build(
        fields: &[InputField],
        raw: &BTreeMap<String, String>,
    ) -> Result<Self, ValidationError> {
        let mut values = BTreeMap::new();

        for field in fields {
            let text = raw
                .get(&field.key)
                .map(String::as_str)
                .or(field.default.as_deref())
                .unwrap_or("");

            let value = match field.kind {
                FieldKind::Numeric => {
                    parse_optional_number(text, &field.constraints, &field.label)?
                        .map(InputValue::Number)
                }
                FieldKind::Enum => Some(InputValue::Text(parse_choice(
                    text,
                    &field.constraints,
                    &field.label,
                )?)),
                FieldKind::Date => {
                    if text.trim().is_empty() && !field.is_required() {
                        None
                    } else {
                        Some(InputValue::Date(parse_date(text, &field.label)?))
                    }
                }
                FieldKind::Text => {
                    let trimmed = text.trim();
                    if trimmed.is_empty() {
                        if field.is_required() {
                            return Err(ValidationError::RequiredFieldMissing {
                                field: field.label.clone(),
                            });
                        }
                        None
                    } else {
                        Some(InputValue::Text(trimmed.to_string()))
                    }
                }
            };

            if let Some(value) = value {
                values.insert(field.key.clone(), value);
            }
        }

        Ok(Self { values })
    }

    /// Builds a request from already-typed values, skipping validation.
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, InputValue)>,
        K: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn values(&self) -> &BTreeMap<String, InputValue> {
        &self.values
    }

    pub fn number(
        &self,
        key: &str,
    ) -> CalcResult<f64> {
        self.optional_number(key)
            .ok_or_else(|| CalcError::MissingInput(key.to_string()))
    }

    pub fn optional_number(
        &self,
        key: &str,
    ) -> Option<f64> {
        match self.values.get(key) {
            Some(InputValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Enum choice or free text.
    pub fn text(
        &self,
        key: &str,
    ) -> CalcResult<&str> {
        match self.values.get(key) {
            Some(InputValue::Text(s)) => Ok(s),
            _ => Err(CalcError::MissingInput(key.to_string())),
        }
    }

    pub fn date(
        &self,
        key: &str,
    ) -> CalcResult<NaiveDate> {
        self.optional_date(key)
            .ok_or_else(|| CalcError::MissingInput(key.to_string()))
    }

    pub fn optional_date(
        &self,
        key: &str,
    ) -> Option<NaiveDate> {
        match self.values.get(key) {
            Some(InputValue::Date(d)) => Some(*d),
            _ => None,
        }
    }
}

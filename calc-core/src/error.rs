//! Error taxonomy for calculator pipelines.
//!
//! Validation failures describe a single input field and are raised before a
//! [`CalculationRequest`](crate::models::CalculationRequest) exists. Domain
//! failures are raised by a formula when validated inputs still have no
//! meaningful answer (zero denominator, log of a non-positive number, ...).
//! Backend failures live in [`crate::backend::BackendError`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by every formula module.
pub type CalcResult<T> = Result<T, CalcError>;

/// A single input field failed to parse or violated its constraints.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} is required")]
    RequiredFieldMissing { field: String },

    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: String, value: String },

    #[error("{field} must be between {} and {}, got {value}", fmt_bound(.min), fmt_bound(.max))]
    OutOfRange {
        field: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("{field} does not accept '{value}'")]
    NotAllowed { field: String, value: String },

    #[error("{field} must be a date (YYYY-MM-DD), got '{value}'")]
    InvalidDate { field: String, value: String },
}

fn fmt_bound(bound: &Option<f64>) -> String {
    match bound {
        Some(v) => v.to_string(),
        None => "unbounded".to_string(),
    }
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            Self::RequiredFieldMissing { field }
            | Self::NotANumber { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::NotAllowed { field, .. }
            | Self::InvalidDate { field, .. } => field,
        }
    }
}

/// Errors produced by the validate-compute pipeline.
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Inputs were well-formed but the formula has no finite answer for them.
    #[error("{calculator}: {reason}")]
    Domain { calculator: String, reason: String },

    #[error("unknown calculator '{0}'")]
    UnknownCalculator(String),

    /// A formula asked the request for a key its schema never declared.
    #[error("input '{0}' is not part of the request")]
    MissingInput(String),
}

impl CalcError {
    pub fn domain(
        calculator: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Domain {
            calculator: calculator.into(),
            reason: reason.into(),
        }
    }

    /// Stable code for programmatic handling and analytics.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(ValidationError::RequiredFieldMissing { .. }) => {
                "REQUIRED_FIELD_MISSING"
            }
            Self::Validation(ValidationError::NotANumber { .. }) => "NOT_A_NUMBER",
            Self::Validation(ValidationError::OutOfRange { .. }) => "OUT_OF_RANGE",
            Self::Validation(ValidationError::NotAllowed { .. }) => "NOT_ALLOWED",
            Self::Validation(ValidationError::InvalidDate { .. }) => "INVALID_DATE",
            Self::Domain { .. } => "DOMAIN_ERROR",
            Self::UnknownCalculator(_) => "UNKNOWN_CALCULATOR",
            Self::MissingInput(_) => "MISSING_INPUT",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

use serde::{Deserialize, Serialize};

/// What kind of widget backs a field and how its raw text is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Enum,
    Date,
    Text,
}

/// Constraints checked before a value may enter a calculation request.
///
/// Bounds are inclusive. `step` is a presentation hint only and is never
/// enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub allowed_values: Vec<String>,
    pub required: bool,
}

impl FieldConstraints {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn min(
        mut self,
        min: f64,
    ) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(
        mut self,
        max: f64,
    ) -> Self {
        self.max = Some(max);
        self
    }

    pub fn range(
        self,
        min: f64,
        max: f64,
    ) -> Self {
        self.min(min).max(max)
    }

    pub fn step(
        mut self,
        step: f64,
    ) -> Self {
        self.step = Some(step);
        self
    }
}

/// One input on a calculator form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputField {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub constraints: FieldConstraints,
    pub unit: Option<String>,
    /// Raw text the form is pre-filled with.
    pub default: Option<String>,
}

impl InputField {
    pub fn number(
        key: &str,
        label: &str,
        constraints: FieldConstraints,
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Numeric,
            constraints,
            unit: None,
            default: None,
        }
    }

    /// An enum field; the first option is the default.
    pub fn choice(
        key: &str,
        label: &str,
        options: &[&str],
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Enum,
            constraints: FieldConstraints {
                allowed_values: options.iter().map(|o| o.to_string()).collect(),
                required: true,
                ..Default::default()
            },
            unit: None,
            default: options.first().map(|o| o.to_string()),
        }
    }

    pub fn date(
        key: &str,
        label: &str,
        required: bool,
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Date,
            constraints: FieldConstraints {
                required,
                ..Default::default()
            },
            unit: None,
            default: None,
        }
    }

    pub fn text(
        key: &str,
        label: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            constraints: FieldConstraints::required(),
            unit: None,
            default: None,
        }
    }

    pub fn with_unit(
        mut self,
        unit: &str,
    ) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_default(
        mut self,
        raw: &str,
    ) -> Self {
        self.default = Some(raw.to_string());
        self
    }

    pub fn is_required(&self) -> bool {
        self.constraints.required
    }
}

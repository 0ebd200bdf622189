use serde::{Deserialize, Serialize};

/// A displayable value on a result card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    Number(f64),
    /// Money, shown with two decimals and thousands separators.
    Currency(f64),
    /// Already scaled to 0-100.
    Percent(f64),
    Text(String),
}

impl ResultValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) | Self::Currency(v) | Self::Percent(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.as_f64().is_none_or(f64::is_finite)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultField {
    pub label: String,
    pub value: ResultValue,
    pub unit: Option<String>,
}

impl ResultField {
    pub fn number(
        label: &str,
        value: f64,
    ) -> Self {
        Self::new(label, ResultValue::Number(value))
    }

    pub fn currency(
        label: &str,
        value: f64,
    ) -> Self {
        Self::new(label, ResultValue::Currency(value))
    }

    pub fn percent(
        label: &str,
        value: f64,
    ) -> Self {
        Self::new(label, ResultValue::Percent(value))
    }

    pub fn text(
        label: &str,
        value: impl Into<String>,
    ) -> Self {
        Self::new(label, ResultValue::Text(value.into()))
    }

    fn new(
        label: &str,
        value: ResultValue,
    ) -> Self {
        Self {
            label: label.to_string(),
            value,
            unit: None,
        }
    }

    pub fn with_unit(
        mut self,
        unit: &str,
    ) -> Self {
        self.unit = Some(unit.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// Ordered series handed to a domain-agnostic chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub kind: ChartKind,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            points: Vec::new(),
        }
    }

    pub fn point(
        mut self,
        name: impl Into<String>,
        value: f64,
    ) -> Self {
        self.points.push(ChartPoint {
            name: name.into(),
            value,
        });
        self
    }
}

/// Output of one successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub primary: ResultField,
    pub secondary: Vec<ResultField>,
    pub formula: Option<String>,
    pub chart: Option<ChartSeries>,
}

impl CalculationResult {
    pub fn new(primary: ResultField) -> Self {
        Self {
            primary,
            secondary: Vec::new(),
            formula: None,
            chart: None,
        }
    }

    pub fn field(
        mut self,
        field: ResultField,
    ) -> Self {
        self.secondary.push(field);
        self
    }

    pub fn formula(
        mut self,
        formula: impl Into<String>,
    ) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn chart(
        mut self,
        chart: ChartSeries,
    ) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Label of the first non-finite number, if any.
    pub fn first_non_finite(&self) -> Option<&str> {
        std::iter::once(&self.primary)
            .chain(&self.secondary)
            .find(|f| !f.value.is_finite())
            .map(|f| f.label.as_str())
            .or_else(|| {
                self.chart.as_ref().and_then(|c| {
                    c.points
                        .iter()
                        .find(|p| !p.value.is_finite())
                        .map(|p| p.name.as_str())
                })
            })
    }

    /// Looks up a secondary field by label.
    pub fn get(
        &self,
        label: &str,
    ) -> Option<&ResultValue> {
        self.secondary
            .iter()
            .find(|f| f.label == label)
            .map(|f| &f.value)
    }
}

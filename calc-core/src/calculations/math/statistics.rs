//! Descriptive statistics over a pasted list of numbers.

use serde::{Deserialize, Serialize};

use crate::calculations::common::format_number;
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult, ValidationError};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, InputField, ResultField,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    /// Empty when every value occurs equally often.
    pub modes: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub population_std_dev: f64,
    /// `None` for a single value.
    pub sample_std_dev: Option<f64>,
}

/// Splits on commas, whitespace and semicolons.
///
/// # Errors
///
/// [`ValidationError::NotANumber`] for the first token that is not a finite
/// number, [`ValidationError::RequiredFieldMissing`] when no tokens remain.
pub fn parse_list(
    raw: &str,
    field: &str,
) -> Result<Vec<f64>, ValidationError> {
    let values = raw
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ValidationError::NotANumber {
                    field: field.to_string(),
                    value: token.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.is_empty() {
        return Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        });
    }
    Ok(values)
}

pub fn summarize(values: &[f64]) -> CalcResult<Summary> {
    if values.is_empty() {
        return Err(CalcError::domain("statistics", "at least one value is required"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let n = count as f64;
    let sum: f64 = sorted.iter().sum();
    let mean = sum / n;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let squares: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
    let sample_std_dev = (count > 1).then(|| (squares / (n - 1.0)).sqrt());

    Ok(Summary {
        count,
        sum,
        mean,
        median,
        modes: modes(&sorted),
        min: sorted[0],
        max: sorted[count - 1],
        population_std_dev: (squares / n).sqrt(),
        sample_std_dev,
    })
}

/// Most frequent values of an already sorted slice.
fn modes(sorted: &[f64]) -> Vec<f64> {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &value in sorted {
        match runs.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }

    let best = runs.iter().map(|(_, c)| *c).max().unwrap_or(0);
    if runs.iter().all(|(_, c)| *c == best) {
        return Vec::new();
    }
    runs.into_iter()
        .filter(|(_, c)| *c == best)
        .map(|(v, _)| v)
        .collect()
}

pub struct StatisticsCalculator;

impl Calculator for StatisticsCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "statistics",
            title: "Statistics Calculator",
            category: Category::Math,
            description: "Mean, median, mode and standard deviation of a data set.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![InputField::text("values", "Values (comma separated)")]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let values = parse_list(request.text("values")?, "Values (comma separated)")?;
        let summary = summarize(&values)?;

        let modes = if summary.modes.is_empty() {
            "No mode".to_string()
        } else {
            summary
                .modes
                .iter()
                .map(|m| format_number(*m))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let sample = match summary.sample_std_dev {
            Some(s) => ResultField::number("Sample std. deviation", s),
            None => ResultField::text("Sample std. deviation", "Needs at least two values"),
        };

        let chart = values
            .iter()
            .zip(1..)
            .fold(ChartSeries::new(ChartKind::Bar), |chart, (v, i)| {
                chart.point(format!("#{i}"), *v)
            });

        Ok(CalculationResult::new(ResultField::number("Mean", summary.mean))
            .field(ResultField::number("Median", summary.median))
            .field(ResultField::text("Mode", modes))
            .field(ResultField::number("Population std. deviation", summary.population_std_dev))
            .field(sample)
            .field(ResultField::number("Count", summary.count as f64))
            .field(ResultField::number("Sum", summary.sum))
            .field(ResultField::number("Minimum", summary.min))
            .field(ResultField::number("Maximum", summary.max))
            .formula("σ = √(Σ(x − μ)² ÷ N), s = √(Σ(x − x̄)² ÷ (n − 1))")
            .chart(chart))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_list_accepts_mixed_separators() {
        let values = parse_list("1, 2;3  4\n5", "Values").unwrap();

        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn parse_list_rejects_words() {
        let err = parse_list("1, two, 3", "Values").unwrap_err();

        assert_eq!(
            err,
            ValidationError::NotANumber {
                field: "Values".to_string(),
                value: "two".to_string(),
            }
        );
    }

    #[test]
    fn parse_list_rejects_blank() {
        assert!(matches!(
            parse_list(" , ", "Values"),
            Err(ValidationError::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn summary_of_textbook_set() {
        let summary = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();

        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.median, 4.5);
        assert_eq!(summary.modes, vec![4.0]);
        assert_eq!(summary.population_std_dev, 2.0);
    }

    #[test]
    fn single_value_has_no_sample_deviation() {
        let summary = summarize(&[3.0]).unwrap();

        assert_eq!(summary.sample_std_dev, None);
        assert_eq!(summary.population_std_dev, 0.0);
    }

    #[test]
    fn uniform_frequencies_have_no_mode() {
        let summary = summarize(&[1.0, 2.0, 3.0]).unwrap();

        assert!(summary.modes.is_empty());
    }

    #[test]
    fn multimodal_set_reports_every_mode() {
        let summary = summarize(&[1.0, 1.0, 2.0, 3.0, 3.0]).unwrap();

        assert_eq!(summary.modes, vec![1.0, 3.0]);
    }
}

//! Rendering of a [`CalculationResult`] into text the site hands to the
//! browser: the copy-to-clipboard block and the printable summary.
//!
//! Chart series are not touched here; the renderer receives them as the
//! formula produced them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::calculations::common::format_with_decimals;
use crate::models::{CalculationResult, FieldKind, Notice, ResultField, ResultValue};
use crate::page::CalculatorPage;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

pub trait Clipboard {
    fn write_text(
        &mut self,
        text: &str,
    ) -> Result<(), ClipboardError>;
}

/// Inserts `,` between thousands in the integer part of `digits`.
fn group_thousands(digits: &str) -> String {
    let (sign, rest) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let (int, frac) = match rest.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// [`format_number`](crate::calculations::common::format_number) with the
/// integer part grouped in thousands.
pub fn format_grouped(value: f64) -> String {
    group_thousands(&format_with_decimals(value, 4))
}

/// Exactly two decimals, thousands grouped.
pub fn format_money(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = if text == "-0.00" { "0.00".to_string() } else { text };
    group_thousands(&text)
}

pub fn format_value(value: &ResultValue) -> String {
    match value {
        ResultValue::Number(v) => format_grouped(*v),
        ResultValue::Currency(v) => format_money(*v),
        ResultValue::Percent(v) => format!("{}%", format_with_decimals(*v, 2)),
        ResultValue::Text(s) => s.clone(),
    }
}

fn attach_unit(
    value: String,
    unit: Option<&str>,
) -> String {
    match unit {
        Some("$") => format!("${value}"),
        Some("%") => format!("{value}%"),
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

pub fn format_field(field: &ResultField) -> String {
    attach_unit(format_value(&field.value), field.unit.as_deref())
}

/// Plain-text block for the clipboard: title, primary line, breakdown lines
/// in order, then the formula.
pub fn copy_text(
    title: &str,
    result: &CalculationResult,
) -> String {
    let mut lines = vec![title.to_string()];
    for field in std::iter::once(&result.primary).chain(&result.secondary) {
        lines.push(format!("{}: {}", field.label, format_field(field)));
    }
    if let Some(formula) = &result.formula {
        lines.push(format!("Formula: {formula}"));
    }
    lines.join("\n")
}

/// Copies the result and reports the outcome as a notice. Clipboard
/// failures are logged and turned into an error notice.
pub fn copy_to_clipboard(
    clipboard: &mut dyn Clipboard,
    title: &str,
    result: &CalculationResult,
) -> Notice {
    match clipboard.write_text(&copy_text(title, result)) {
        Ok(()) => Notice::success("Results copied to clipboard"),
        Err(e) => {
            warn!(error = %e, "Copy to clipboard failed");
            Notice::error("Could not copy results to the clipboard")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

impl LabeledValue {
    fn new(
        label: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Everything the print view shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSummary {
    pub title: String,
    pub inputs: Vec<LabeledValue>,
    pub results: Vec<LabeledValue>,
    pub formula: Option<String>,
}

impl PrintSummary {
    /// `None` until the page has a result to print. Blank inputs are left out.
    pub fn from_page(page: &CalculatorPage<'_>) -> Option<Self> {
        let result = page.result()?;

        let inputs = page
            .fields()
            .iter()
            .filter_map(|field| {
                let raw = page.input(&field.key)?.trim();
                if raw.is_empty() {
                    return None;
                }
                let value = match field.kind {
                    FieldKind::Numeric => attach_unit(raw.to_string(), field.unit.as_deref()),
                    _ => raw.to_string(),
                };
                Some(LabeledValue::new(&field.label, value))
            })
            .collect();

        let results = std::iter::once(&result.primary)
            .chain(&result.secondary)
            .map(|f| LabeledValue::new(&f.label, format_field(f)))
            .collect();

        Some(Self {
            title: page.meta().title.to_string(),
            inputs,
            results,
            formula: result.formula.clone(),
        })
    }

    pub fn render_text(&self) -> String {
        let width = self
            .inputs
            .iter()
            .chain(&self.results)
            .map(|lv| lv.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&"=".repeat(self.title.chars().count()));
        out.push('\n');

        for (heading, rows) in [("Inputs", &self.inputs), ("Results", &self.results)] {
            if rows.is_empty() {
                continue;
            }
            out.push('\n');
            out.push_str(heading);
            out.push('\n');
            for row in rows {
                out.push_str(&format!("  {:<width$}  {}\n", row.label, row.value));
            }
        }

        if let Some(formula) = &self.formula {
            out.push_str(&format!("\nFormula: {formula}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::calculations::finance::simple::DiscountCalculator;

    struct MemoryClipboard(Option<String>);

    impl Clipboard for MemoryClipboard {
        fn write_text(
            &mut self,
            text: &str,
        ) -> Result<(), ClipboardError> {
            self.0 = Some(text.to_string());
            Ok(())
        }
    }

    struct DeniedClipboard;

    impl Clipboard for DeniedClipboard {
        fn write_text(
            &mut self,
            _text: &str,
        ) -> Result<(), ClipboardError> {
            Err(ClipboardError::Rejected("permission denied".to_string()))
        }
    }

    fn sample() -> CalculationResult {
        CalculationResult::new(ResultField::currency("Monthly payment", 1264.14))
            .field(ResultField::currency("Total interest", 155088.0))
            .field(ResultField::percent("Rate", 5.5))
            .formula("M = P·r·(1+r)^n / ((1+r)^n − 1)")
    }

    #[test]
    fn money_is_grouped_with_two_decimals() {
        assert_eq!(format_money(1234567.891), "1,234,567.89");
        assert_eq!(format_money(999.5), "999.50");
        assert_eq!(format_money(-1500.0), "-1,500.00");
        assert_eq!(format_money(-0.001), "0.00");
    }

    #[test]
    fn numbers_are_grouped_and_trimmed() {
        assert_eq!(format_grouped(12345.5), "12,345.5");
        assert_eq!(crate::calculations::common::format_number(12345.5), "12345.5");
        assert_eq!(format_grouped(100.0), "100");
        assert_eq!(format_grouped(0.125), "0.125");
    }

    #[test]
    fn copy_text_lists_fields_in_order() {
        let text = copy_text("Loan Calculator", &sample());

        assert_eq!(
            text,
            "Loan Calculator\n\
             Monthly payment: 1,264.14\n\
             Total interest: 155,088.00\n\
             Rate: 5.5%\n\
             Formula: M = P·r·(1+r)^n / ((1+r)^n − 1)"
        );
    }

    #[test]
    fn units_follow_values() {
        let result = CalculationResult::new(ResultField::number("Distance", 1609.344).with_unit("m"));

        assert_eq!(copy_text("Length", &result), "Length\nDistance: 1,609.344 m");
    }

    #[test]
    fn successful_copy_reports_success() {
        let mut clipboard = MemoryClipboard(None);

        let notice = copy_to_clipboard(&mut clipboard, "Loan", &sample());

        assert!(!notice.is_error());
        assert!(clipboard.0.unwrap().starts_with("Loan\nMonthly payment"));
    }

    #[test]
    fn clipboard_failure_becomes_notice() {
        let notice = copy_to_clipboard(&mut DeniedClipboard, "Loan", &sample());

        assert!(notice.is_error());
    }

    #[test]
    fn print_summary_needs_a_result() {
        let page = CalculatorPage::new(&DiscountCalculator);

        assert!(PrintSummary::from_page(&page).is_none());
    }

    #[test]
    fn print_summary_collects_inputs_and_results() {
        let mut page = CalculatorPage::new(&DiscountCalculator);
        page.set_input("price", "80");
        page.set_input("discount", "25");

        let summary = PrintSummary::from_page(&page).unwrap();

        assert_eq!(summary.title, "Discount Calculator");
        assert_eq!(
            summary.inputs,
            vec![
                LabeledValue::new("Original price", "$80"),
                LabeledValue::new("Discount", "25%"),
            ]
        );
        assert_eq!(summary.results[0], LabeledValue::new("Final price", "60.00"));

        let text = summary.render_text();
        assert!(text.starts_with("Discount Calculator\n==================="));
        assert!(text.contains("  Final price     60.00\n"));
    }
}

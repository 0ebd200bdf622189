//! Tax calculators built on the embedded band tables.
//!
//! | Slug                    | Table(s)                                      | Year    |
//! |-------------------------|-----------------------------------------------|---------|
//! | `uk-income-tax`         | `uk-income-tax` with allowance taper          | 2024/25 |
//! | `uk-national-insurance` | `uk-national-insurance` (Class 1 employee)    | 2024/25 |
//! | `uk-stamp-duty`         | `uk-sdlt-standard`, `uk-sdlt-first-time-buyer`| 2024/25 |
//! | `canada-income-tax`     | `canada-federal` less basic personal credit   | 2024    |
//! | `us-social-security`    | `us-oasdi-employee`, `us-medicare-employee`   | 2024    |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::bands::{BandBreakdown, accumulate};
use super::loader::builtin_table;
use crate::calculations::common::{decimal_to_f64, money_to_decimal, round_half_up};
use crate::calculator::{Calculator, CalculatorMeta, Category};
use crate::error::{CalcError, CalcResult};
use crate::models::{
    CalculationRequest, CalculationResult, ChartKind, ChartSeries, FieldConstraints, InputField,
    ResultField, TaxBand,
};

// =============================================================================
// UK income tax
// =============================================================================

pub const UK_PERSONAL_ALLOWANCE: Decimal = dec!(12570);
/// Income above which the personal allowance starts to taper.
pub const UK_TAPER_THRESHOLD: Decimal = dec!(100000);

/// Personal allowance after the taper: reduced by £1 for every £2 of income
/// over £100,000, down to zero.
pub fn uk_personal_allowance(income: Decimal) -> Decimal {
    if income <= UK_TAPER_THRESHOLD {
        return UK_PERSONAL_ALLOWANCE;
    }
    let reduction = ((income - UK_TAPER_THRESHOLD) / dec!(2)).floor();
    (UK_PERSONAL_ALLOWANCE - reduction).max(Decimal::ZERO)
}

/// Shifts the allowance and basic bands to a tapered allowance.
///
/// The basic rate band keeps its width, so the higher rate starts earlier;
/// the additional rate threshold does not move. Zero-width bands are dropped.
fn taper_bands(
    bands: &[TaxBand],
    allowance: Decimal,
) -> Vec<TaxBand> {
    let shift = UK_PERSONAL_ALLOWANCE - allowance;
    bands
        .iter()
        .enumerate()
        .map(|(i, band)| {
            let mut band = band.clone();
            match i {
                0 => band.max = Some(allowance),
                1 => {
                    band.min = allowance;
                    band.max = band.max.map(|m| m - shift);
                }
                2 => band.min -= shift,
                _ => {}
            }
            band
        })
        .filter(|band| band.max.is_none_or(|max| max > band.min))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct UkIncomeTax {
    pub personal_allowance: Decimal,
    pub breakdown: BandBreakdown,
    pub take_home: Decimal,
}

pub fn uk_income_tax(income: Decimal) -> CalcResult<UkIncomeTax> {
    let table = builtin_table("uk-income-tax")?;
    let allowance = uk_personal_allowance(income);
    let breakdown = accumulate(income, &taper_bands(table.bands(), allowance));
    let take_home = round_half_up(income - breakdown.total);

    Ok(UkIncomeTax {
        personal_allowance: allowance,
        breakdown,
        take_home,
    })
}

// =============================================================================
// UK stamp duty land tax
// =============================================================================

/// First-time buyer relief is lost entirely above this price.
pub const UK_FTB_PRICE_CAP: Decimal = dec!(625000);
/// Surcharge on additional residential properties, charged on the whole price.
pub const UK_ADDITIONAL_SURCHARGE: Decimal = dec!(0.03);
/// Purchases below this price do not attract the surcharge.
pub const UK_ADDITIONAL_MINIMUM: Decimal = dec!(40000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyerType {
    Standard,
    FirstTime,
    Additional,
}

impl BuyerType {
    pub const OPTIONS: [&'static str; 3] = ["standard", "first-time", "additional"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "first-time" => Some(Self::FirstTime),
            "additional" => Some(Self::Additional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StampDuty {
    pub breakdown: BandBreakdown,
    pub surcharge: Decimal,
    pub total: Decimal,
    pub relief_applied: bool,
}

pub fn uk_stamp_duty(
    price: Decimal,
    buyer: BuyerType,
) -> CalcResult<StampDuty> {
    let relief_applied = buyer == BuyerType::FirstTime && price <= UK_FTB_PRICE_CAP;
    let table = if relief_applied {
        builtin_table("uk-sdlt-first-time-buyer")?
    } else {
        builtin_table("uk-sdlt-standard")?
    };
    let breakdown = accumulate(price, table.bands());

    let surcharge = if buyer == BuyerType::Additional && price >= UK_ADDITIONAL_MINIMUM {
        round_half_up(price * UK_ADDITIONAL_SURCHARGE)
    } else {
        Decimal::ZERO
    };

    Ok(StampDuty {
        total: breakdown.total + surcharge,
        breakdown,
        surcharge,
        relief_applied,
    })
}

// =============================================================================
// Canada federal income tax
// =============================================================================

pub const CANADA_BASIC_PERSONAL_AMOUNT: Decimal = dec!(15705);
pub const CANADA_LOWEST_RATE: Decimal = dec!(0.15);

#[derive(Debug, Clone, PartialEq)]
pub struct CanadaIncomeTax {
    pub breakdown: BandBreakdown,
    pub personal_credit: Decimal,
    pub net_tax: Decimal,
}

pub fn canada_federal_tax(income: Decimal) -> CalcResult<CanadaIncomeTax> {
    let table = builtin_table("canada-federal")?;
    let breakdown = accumulate(income, table.bands());
    let personal_credit = round_half_up(CANADA_BASIC_PERSONAL_AMOUNT * CANADA_LOWEST_RATE);
    let net_tax = (breakdown.total - personal_credit).max(Decimal::ZERO);

    Ok(CanadaIncomeTax {
        breakdown,
        personal_credit,
        net_tax,
    })
}

// =============================================================================
// US payroll taxes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PayrollTax {
    pub social_security: Decimal,
    pub medicare: Decimal,
    pub additional_medicare: Decimal,
    pub total: Decimal,
}

pub fn us_payroll_tax(wages: Decimal) -> CalcResult<PayrollTax> {
    let oasdi = accumulate(wages, builtin_table("us-oasdi-employee")?.bands());
    let medicare = accumulate(wages, builtin_table("us-medicare-employee")?.bands());

    // The medicare table folds the 0.9% surtax into its top band.
    let base_medicare = round_half_up(wages.max(Decimal::ZERO) * dec!(0.0145));
    let additional = medicare.total - base_medicare;

    Ok(PayrollTax {
        social_security: oasdi.total,
        medicare: base_medicare,
        additional_medicare: additional,
        total: oasdi.total + medicare.total,
    })
}

// =============================================================================
// Presentation helpers
// =============================================================================

fn money(value: Decimal) -> f64 {
    decimal_to_f64(value)
}

fn percent(rate: Decimal) -> f64 {
    decimal_to_f64(rate * dec!(100))
}

fn band_label(
    rate: Decimal,
    min: Decimal,
    max: Option<Decimal>,
) -> String {
    let rate = (rate * dec!(100)).normalize();
    match max {
        Some(max) => format!("{rate}% band ({min} to {max})"),
        None => format!("{rate}% band (over {min})"),
    }
}

/// Appends one line per band that received income and a bar chart of tax by band.
fn with_breakdown(
    mut result: CalculationResult,
    breakdown: &BandBreakdown,
) -> CalculationResult {
    let mut chart = ChartSeries::new(ChartKind::Bar);
    for slice in &breakdown.slices {
        let label = band_label(slice.rate, slice.min, slice.max);
        chart = chart.point(label.clone(), money(slice.tax));
        result = result.field(ResultField::currency(&label, money(slice.tax)));
    }
    result
        .field(ResultField::percent("Effective rate", percent(breakdown.effective_rate)))
        .field(ResultField::percent("Marginal rate", percent(breakdown.marginal_rate)))
        .chart(chart)
}

fn income_field(
    key: &str,
    label: &str,
    unit: &str,
) -> InputField {
    InputField::number(key, label, FieldConstraints::required().range(0.0, 1e12)).with_unit(unit)
}

const ACCUMULATION: &str = "tax = Σ rate × min(remaining income, band width)";

// =============================================================================
// Calculators
// =============================================================================

pub struct UkIncomeTaxCalculator;

impl Calculator for UkIncomeTaxCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "uk-income-tax",
            title: "UK Income Tax Calculator",
            category: Category::Tax,
            description: "Income tax for England, Wales and Northern Ireland, 2024/25.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![income_field("income", "Annual gross income", "£")]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let income = money_to_decimal("uk-income-tax", request.number("income")?)?;
        let tax = uk_income_tax(income)?;

        let result = CalculationResult::new(ResultField::currency(
            "Income tax",
            money(tax.breakdown.total),
        ))
        .field(ResultField::currency("Personal allowance", money(tax.personal_allowance)))
        .field(ResultField::currency("Take-home after income tax", money(tax.take_home)))
        .formula(ACCUMULATION);

        Ok(with_breakdown(result, &tax.breakdown))
    }
}

pub struct UkNationalInsuranceCalculator;

impl Calculator for UkNationalInsuranceCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "uk-national-insurance",
            title: "UK National Insurance Calculator",
            category: Category::Tax,
            description: "Class 1 employee National Insurance contributions, 2024/25.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![income_field("income", "Annual earnings", "£")]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let income = money_to_decimal("uk-national-insurance", request.number("income")?)?;
        let table = builtin_table("uk-national-insurance")?;
        let breakdown = accumulate(income, table.bands());

        let result = CalculationResult::new(ResultField::currency(
            "Annual National Insurance",
            money(breakdown.total),
        ))
        .field(ResultField::currency(
            "Monthly National Insurance",
            money(round_half_up(breakdown.total / dec!(12))),
        ))
        .formula(ACCUMULATION);

        Ok(with_breakdown(result, &breakdown))
    }
}

pub struct UkStampDutyCalculator;

impl Calculator for UkStampDutyCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "uk-stamp-duty",
            title: "UK Stamp Duty Calculator",
            category: Category::Tax,
            description: "Stamp Duty Land Tax on a residential purchase in England.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![
            income_field("price", "Property price", "£"),
            InputField::choice("buyer", "Buyer type", &BuyerType::OPTIONS),
        ]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let price = money_to_decimal("uk-stamp-duty", request.number("price")?)?;
        let name = request.text("buyer")?;
        let buyer = BuyerType::parse(name)
            .ok_or_else(|| CalcError::domain("uk-stamp-duty", format!("unknown buyer type '{name}'")))?;
        let duty = uk_stamp_duty(price, buyer)?;

        let effective = if price > Decimal::ZERO {
            duty.total / price
        } else {
            Decimal::ZERO
        };

        let mut result = CalculationResult::new(ResultField::currency(
            "Stamp duty",
            money(duty.total),
        ))
        .field(ResultField::text(
            "First-time buyer relief",
            if duty.relief_applied { "Applied" } else { "Not applied" },
        ));
        if duty.surcharge > Decimal::ZERO {
            result = result.field(ResultField::currency(
                "Additional property surcharge",
                money(duty.surcharge),
            ));
        }
        let mut result = with_breakdown(result.formula(ACCUMULATION), &duty.breakdown);

        // The surcharge is not part of the band breakdown.
        for field in &mut result.secondary {
            if field.label == "Effective rate" {
                *field = ResultField::percent("Effective rate", percent(effective));
            }
        }
        Ok(result)
    }
}

pub struct CanadaIncomeTaxCalculator;

impl Calculator for CanadaIncomeTaxCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "canada-income-tax",
            title: "Canada Income Tax Calculator",
            category: Category::Tax,
            description: "Federal income tax for 2024 after the basic personal amount.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![income_field("income", "Taxable income", "$")]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let income = money_to_decimal("canada-income-tax", request.number("income")?)?;
        let tax = canada_federal_tax(income)?;

        let result = CalculationResult::new(ResultField::currency(
            "Federal tax",
            money(tax.net_tax),
        ))
        .field(ResultField::currency("Tax before credits", money(tax.breakdown.total)))
        .field(ResultField::currency("Basic personal credit", money(tax.personal_credit)))
        .formula(format!("{ACCUMULATION} − 15% × basic personal amount"));

        Ok(with_breakdown(result, &tax.breakdown))
    }
}

pub struct UsSocialSecurityCalculator;

impl Calculator for UsSocialSecurityCalculator {
    fn meta(&self) -> CalculatorMeta {
        CalculatorMeta {
            slug: "us-social-security",
            title: "Social Security & Medicare Tax Calculator",
            category: Category::Tax,
            description: "Employee FICA withholding for 2024 wages.",
            live: false,
        }
    }

    fn fields(&self) -> Vec<InputField> {
        vec![income_field("wages", "Annual wages", "$")]
    }

    fn compute(
        &self,
        request: &CalculationRequest,
    ) -> CalcResult<CalculationResult> {
        let wages = money_to_decimal("us-social-security", request.number("wages")?)?;
        let tax = us_payroll_tax(wages)?;

        Ok(CalculationResult::new(ResultField::currency("Total FICA", money(tax.total)))
            .field(ResultField::currency("Social Security (6.2%)", money(tax.social_security)))
            .field(ResultField::currency("Medicare (1.45%)", money(tax.medicare)))
            .field(ResultField::currency(
                "Additional Medicare (0.9%)",
                money(tax.additional_medicare),
            ))
            .formula("6.2% × min(wages, 168,600) + 1.45% × wages + 0.9% × max(wages − 200,000, 0)")
            .chart(
                ChartSeries::new(ChartKind::Pie)
                    .point("Social Security", money(tax.social_security))
                    .point("Medicare", money(tax.medicare + tax.additional_medicare)),
            ))
    }
}

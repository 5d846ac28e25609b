// src/services/invoice_calculator.rs
//
// Cálculo das faturas de compra: subtotal, imposto e total por linha e no documento,
// mais o aviso de variação de preço contra o último custo conhecido.

use rust_decimal::Decimal;

use crate::{
    common::{error::AppError, formatters::format_currency, i18n::I18nStore},
    models::{
        invoice::{InvoiceLine, InvoiceTotals, LineBreakdown, PriceAdvisory, PriceDirection},
        restaurant::TaxApplyMode,
    },
    services::unit_conversion::{expected_unit_price, round_to, to_base_quantity, COST_SCALE, QUANTITY_SCALE},
};

/// Variação (em %) a partir da qual o preço é sinalizado.
pub const PRICE_ALERT_THRESHOLD: Decimal = Decimal::TWO;

/// Percentual de imposto de uma linha conforme o modo do restaurante.
pub fn resolve_tax_percentage(
    mode: TaxApplyMode,
    line_tax: Option<Decimal>,
    document_tax: Option<Decimal>,
    default_tax: Decimal,
) -> Decimal {
    match mode {
        TaxApplyMode::PerItem => line_tax.unwrap_or(default_tax),
        TaxApplyMode::PerInvoice => document_tax.unwrap_or(default_tax),
    }
}

pub fn compute_line(line: &InvoiceLine, tax_percentage: Decimal) -> Result<LineBreakdown, AppError> {
    let subtotal = line
        .quantity
        .checked_mul(line.unit_price)
        .map(|v| round_to(v, QUANTITY_SCALE))
        .ok_or(AppError::InvalidAmount)?;
    let tax_amount = subtotal
        .checked_mul(tax_percentage)
        .map(|v| round_to(v / Decimal::ONE_HUNDRED, QUANTITY_SCALE))
        .ok_or(AppError::InvalidAmount)?;

    let cost_per_base_unit = if line.conversion_factor > Decimal::ZERO {
        line.unit_price
            .checked_div(line.conversion_factor)
            .map(|v| round_to(v, COST_SCALE))
    } else {
        None
    };

    Ok(LineBreakdown {
        subtotal,
        tax_percentage,
        tax_amount,
        total: subtotal.checked_add(tax_amount).ok_or(AppError::InvalidAmount)?,
        base_quantity: to_base_quantity(line.quantity, line.conversion_factor).ok_or(AppError::InvalidAmount)?,
        cost_per_base_unit,
        valid: line.quantity > Decimal::ZERO && line.unit_price > Decimal::ZERO,
    })
}

fn checked_sum(mut values: impl Iterator<Item = Decimal>) -> Result<Decimal, AppError> {
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v).ok_or(AppError::InvalidAmount))
}

/// Soma as linhas. O documento só pode ser enviado com pelo menos uma linha e todas válidas.
/// Valores que estouram o Decimal viram `InvalidAmount`.
pub fn compute_invoice(
    lines: &[InvoiceLine],
    mode: TaxApplyMode,
    document_tax: Option<Decimal>,
    default_tax: Decimal,
) -> Result<InvoiceTotals, AppError> {
    let breakdown = lines
        .iter()
        .map(|line| {
            let pct = resolve_tax_percentage(mode, line.tax_percentage, document_tax, default_tax);
            compute_line(line, pct)
        })
        .collect::<Result<Vec<LineBreakdown>, AppError>>()?;

    let subtotal = checked_sum(breakdown.iter().map(|l| l.subtotal))?;
    let total_tax = checked_sum(breakdown.iter().map(|l| l.tax_amount))?;
    let submittable = !breakdown.is_empty() && breakdown.iter().all(|l| l.valid);

    Ok(InvoiceTotals {
        lines: breakdown,
        subtotal,
        total_tax,
        total_amount: subtotal.checked_add(total_tax).ok_or(AppError::InvalidAmount)?,
        submittable,
    })
}

/// Compara o preço pago com o esperado (`lastCostBase × fator`).
/// Só há aviso quando a variação passa de 2% em qualquer direção.
pub fn price_advisory(
    last_cost_base: Option<Decimal>,
    conversion_factor: Decimal,
    unit_price: Decimal,
) -> Option<PriceAdvisory> {
    let last = last_cost_base.filter(|c| *c > Decimal::ZERO)?;
    if unit_price <= Decimal::ZERO || conversion_factor <= Decimal::ZERO {
        return None;
    }

    let expected = expected_unit_price(last, conversion_factor)?;
    let deviation = (unit_price - expected).checked_div(expected)?.checked_mul(Decimal::ONE_HUNDRED)?;
    if deviation.abs() <= PRICE_ALERT_THRESHOLD {
        return None;
    }

    let amount_difference = (unit_price - expected).abs();
    let base_amount_difference = amount_difference.checked_div(conversion_factor)?;
    Some(PriceAdvisory {
        direction: if deviation > Decimal::ZERO {
            PriceDirection::Increased
        } else {
            PriceDirection::Decreased
        },
        percentage: round_to(deviation.abs(), 1),
        expected_unit_price: expected,
        amount_difference,
        base_amount_difference: round_to(base_amount_difference, COST_SCALE),
    })
}

/// Ex. (en): `Price increased 11.1% (+$200,00 / kg, +$0,20 / g)`
pub fn advisory_message(
    advisory: &PriceAdvisory,
    purchase_unit: &str,
    base_unit: &str,
    lang: &str,
    i18n: &I18nStore,
) -> String {
    let key = match advisory.direction {
        PriceDirection::Increased => "invoice.price_increased",
        PriceDirection::Decreased => "invoice.price_decreased",
    };
    i18n.translate(
        lang,
        key,
        &[
            ("percentage", format!("{:.1}", advisory.percentage)),
            ("amount", format_currency(advisory.amount_difference)),
            ("purchase_unit", purchase_unit.to_string()),
            ("base_amount", format_currency(advisory.base_amount_difference)),
            ("base_unit", base_unit.to_string()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(v: &str) -> Decimal {
        Decimal::from_str(v).unwrap()
    }

    fn line(qty: &str, price: &str, tax: Option<&str>) -> InvoiceLine {
        InvoiceLine {
            quantity: d(qty),
            unit_price: d(price),
            tax_percentage: tax.map(d),
            conversion_factor: d("1000"),
        }
    }

    #[test]
    fn per_item_line_math() {
        let totals = compute_invoice(&[line("2", "12000", Some("19"))], TaxApplyMode::PerItem, None, d("0")).unwrap();

        assert_eq!(totals.subtotal, d("24000"));
        assert_eq!(totals.total_tax, d("4560"));
        assert_eq!(totals.total_amount, d("28560"));
        assert!(totals.submittable);
        assert_eq!(totals.lines[0].base_quantity, d("2000"));
        assert_eq!(totals.lines[0].cost_per_base_unit, Some(d("12")));
    }

    #[test]
    fn per_invoice_mode_ignores_line_tax() {
        let lines = [line("1", "1000", Some("5")), line("3", "500", None)];
        let totals = compute_invoice(&lines, TaxApplyMode::PerInvoice, Some(d("10")), d("19")).unwrap();

        assert_eq!(totals.subtotal, d("2500"));
        assert_eq!(totals.total_tax, d("250"));
        assert_eq!(totals.total_amount, d("2750"));
        assert!(totals.lines.iter().all(|l| l.tax_percentage == d("10")));
    }

    #[test]
    fn missing_tax_uses_restaurant_default() {
        let totals = compute_invoice(&[line("1", "100", None)], TaxApplyMode::PerItem, None, d("19")).unwrap();
        assert_eq!(totals.total_tax, d("19"));

        let totals = compute_invoice(&[line("1", "100", None)], TaxApplyMode::PerInvoice, None, d("8")).unwrap();
        assert_eq!(totals.total_tax, d("8"));
    }

    #[test]
    fn totals_are_sums_of_lines() {
        let lines = [
            line("2.5", "3333.33", Some("19")),
            line("7", "0.15", Some("5")),
            line("1", "99999.99", Some("0")),
        ];
        let totals = compute_invoice(&lines, TaxApplyMode::PerItem, None, d("19")).unwrap();

        let sub: Decimal = totals.lines.iter().map(|l| l.subtotal).sum();
        let tax: Decimal = totals.lines.iter().map(|l| l.tax_amount).sum();
        assert_eq!(totals.subtotal, sub);
        assert_eq!(totals.total_tax, tax);
        assert_eq!(totals.total_amount, sub + tax);
        assert_eq!(totals.lines[0].subtotal, d("8333.325"));
    }

    #[test]
    fn invalid_lines_block_submission() {
        let totals = compute_invoice(
            &[line("1", "100", None), line("0", "100", None)],
            TaxApplyMode::PerItem,
            None,
            d("19"),
        )
        .unwrap();
        assert!(!totals.submittable);
        assert!(!totals.lines[1].valid);

        let empty = compute_invoice(&[], TaxApplyMode::PerInvoice, None, d("19")).unwrap();
        assert!(!empty.submittable);
        assert_eq!(empty.total_amount, Decimal::ZERO);

        let no_price = compute_invoice(&[line("1", "0", None)], TaxApplyMode::PerItem, None, d("19")).unwrap();
        assert!(!no_price.submittable);
    }

    #[test]
    fn flags_price_increase_over_threshold() {
        let advisory = price_advisory(Some(d("1.8")), d("1000"), d("2000")).unwrap();

        assert_eq!(advisory.direction, PriceDirection::Increased);
        assert_eq!(advisory.expected_unit_price, d("1800"));
        assert_eq!(advisory.percentage, d("11.1"));
        assert_eq!(advisory.amount_difference, d("200"));
        assert_eq!(advisory.base_amount_difference, d("0.2"));

        let i18n = I18nStore::global();
        let msg = advisory_message(&advisory, "kg", "g", "en", i18n);
        assert_eq!(msg, "Price increased 11.1% (+$200,00 / kg, +$0,20 / g)");
        let es = advisory_message(&advisory, "kg", "g", "es", i18n);
        assert_eq!(es, "El precio subió 11.1% (+$200,00 / kg, +$0,20 / g)");
    }

    #[test]
    fn flags_price_decrease() {
        let advisory = price_advisory(Some(d("2")), d("100"), d("150")).unwrap();
        assert_eq!(advisory.direction, PriceDirection::Decreased);
        assert_eq!(advisory.percentage, d("25"));
        let msg = advisory_message(&advisory, "caja", "und", "pt", I18nStore::global());
        assert!(msg.starts_with("O preço caiu 25"), "{msg}");
    }

    #[test]
    fn no_advisory_within_threshold_or_without_history() {
        // exatamente 2% não dispara
        assert!(price_advisory(Some(d("1")), d("100"), d("102")).is_none());
        assert!(price_advisory(Some(d("1")), d("100"), d("98.5")).is_none());
        assert!(price_advisory(None, d("100"), d("500")).is_none());
        assert!(price_advisory(Some(Decimal::ZERO), d("100"), d("500")).is_none());
        assert!(price_advisory(Some(d("1")), d("100"), Decimal::ZERO).is_none());
    }

    #[test]
    fn oversized_lines_are_rejected_instead_of_overflowing() {
        let huge = line("1000000000000000", "1000000000000000", Some("19"));
        let result = compute_invoice(&[huge], TaxApplyMode::PerItem, None, d("19"));
        assert!(matches!(result, Err(AppError::InvalidAmount)));

        let max = InvoiceLine {
            quantity: Decimal::MAX,
            unit_price: Decimal::ONE,
            tax_percentage: None,
            conversion_factor: d("2"),
        };
        assert!(matches!(compute_line(&max, Decimal::ZERO), Err(AppError::InvalidAmount)));
    }
}

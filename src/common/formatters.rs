// src/common/formatters.rs
//
// Formatação numérica no padrão colombiano: ponto para milhar, vírgula para decimais.
// Ex.: 80000.25 -> "$80.000,25"

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Texto exibido quando um valor não pode ser calculado.
pub const PLACEHOLDER: &str = "—";

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Formata com no mínimo `min_decimals` e no máximo `max_decimals` casas.
fn format_with(value: Decimal, min_decimals: u32, max_decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(max_decimals, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.trim_end_matches('0').to_string()),
        None => (text.clone(), String::new()),
    };

    let mut frac = frac_part;
    while (frac.len() as u32) < min_decimals {
        frac.push('0');
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(&int_part));
    if !frac.is_empty() {
        out.push(',');
        out.push_str(&frac);
    }
    out
}

/// `format_currency(80000.25) -> "$80.000,25"`
pub fn format_currency(value: Decimal) -> String {
    let formatted = format_with(value, 2, 2);
    match formatted.strip_prefix('-') {
        Some(abs) => format!("-${}", abs),
        None => format!("${}", formatted),
    }
}

/// `format_number(1.8, 2) -> "1,80"`, `format_number(45000, 4) -> "45.000,00"`
pub fn format_number(value: Decimal, max_decimals: u32) -> String {
    format_with(value, 2, max_decimals.max(2))
}

pub fn format_optional(value: Option<Decimal>, max_decimals: u32) -> String {
    value
        .map(|v| format_number(v, max_decimals))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn format_optional_currency(value: Option<Decimal>) -> String {
    value
        .map(format_currency)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Formata enquanto o usuário digita: pontos de milhar e no máximo 2 decimais.
/// `"80000,25" -> "80.000,25"`
pub fn format_price_display(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return String::new();
    }

    let mut parts = cleaned.split(',');
    let int_part: String = parts.next().unwrap_or_default().replace('.', "");
    let dec_part: Option<String> = parts.next().map(|d| d.chars().take(2).collect());

    let grouped = group_thousands(&int_part);
    match dec_part {
        Some(dec) => format!("{},{}", grouped, dec),
        None => grouped,
    }
}

/// Inverso de `format_price_display`. Entrada inválida vira zero.
pub fn parse_price_input(display: &str) -> Decimal {
    if display.is_empty() {
        return Decimal::ZERO;
    }
    let normalized = display.replace('.', "").replacen(',', ".", 1);
    Decimal::from_str(normalized.trim()).unwrap_or(Decimal::ZERO)
}

/// Campo de preço que aceita número JSON ou o texto digitado no formulário
/// (`"80.000,25"`), normalizado como na digitação.
pub fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Text(String),
        Number(Decimal),
    }

    Ok(match RawPrice::deserialize(deserializer)? {
        RawPrice::Text(text) => parse_price_input(&format_price_display(&text)),
        RawPrice::Number(value) => value,
    })
}

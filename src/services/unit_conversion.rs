// src/services/unit_conversion.rs

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

use crate::{
    common::error::AppError,
    models::unit::{Unit, UnitType},
};

pub const COST_SCALE: u32 = 6;
pub const QUANTITY_SCALE: u32 = 4;

pub fn round_to(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Custo por unidade base: `total / (quantidade da embalagem × fator)`.
/// Indefinido (None) quando algum divisor falta ou não é positivo.
pub fn cost_per_base_unit(
    total_price: Decimal,
    package_quantity: Option<Decimal>,
    conversion_factor: Option<Decimal>,
) -> Option<Decimal> {
    let quantity = package_quantity.filter(|q| *q > Decimal::ZERO)?;
    let factor = conversion_factor.filter(|f| *f > Decimal::ZERO)?;
    let divisor = quantity.checked_mul(factor)?;
    total_price.checked_div(divisor).map(|v| round_to(v, COST_SCALE))
}

/// Fator final da embalagem na unidade base do ingrediente.
/// None se o produto estoura o limite do Decimal.
pub fn final_conversion_factor(user_factor: Decimal, conversion_unit: &Unit) -> Option<Decimal> {
    user_factor.checked_mul(conversion_unit.factor_to_base)
}

pub fn to_base_quantity(quantity: Decimal, conversion_factor: Decimal) -> Option<Decimal> {
    quantity
        .checked_mul(conversion_factor)
        .map(|v| round_to(v, QUANTITY_SCALE))
}

/// Preço esperado de uma embalagem a partir do último custo por unidade base.
pub fn expected_unit_price(last_cost_base: Decimal, conversion_factor: Decimal) -> Option<Decimal> {
    last_cost_base.checked_mul(conversion_factor)
}

pub fn ensure_same_dimension(base: &Unit, conversion: &Unit) -> Result<(), AppError> {
    if base.unit_type != conversion.unit_type {
        return Err(AppError::UnitTypeMismatch {
            base: base.unit_type,
            conversion: conversion.unit_type,
        });
    }
    Ok(())
}

/// Exatamente uma unidade base por dimensão, com fator 1.
pub fn validate_unit_catalog(units: &[Unit]) -> anyhow::Result<()> {
    let mut bases: HashMap<UnitType, usize> = HashMap::new();
    for unit in units.iter().filter(|u| u.is_base) {
        if unit.factor_to_base != Decimal::ONE {
            anyhow::bail!("Unidade base '{}' com fator {}", unit.abbreviation, unit.factor_to_base);
        }
        *bases.entry(unit.unit_type).or_default() += 1;
    }

    for unit_type in units.iter().map(|u| u.unit_type) {
        match bases.get(&unit_type) {
            Some(1) => {}
            Some(n) => anyhow::bail!("{} unidades base para {}", n, unit_type.as_str()),
            None => anyhow::bail!("Nenhuma unidade base para {}", unit_type.as_str()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn d(v: &str) -> Decimal {
        Decimal::from_str(v).unwrap()
    }

    fn unit(abbr: &str, unit_type: UnitType, factor: &str, is_base: bool) -> Unit {
        Unit {
            id: Uuid::new_v4(),
            name: abbr.to_string(),
            abbreviation: abbr.to_string(),
            unit_type,
            factor_to_base: d(factor),
            is_base,
        }
    }

    #[test]
    fn cost_per_base_unit_divides_by_package_and_factor() {
        // 45.000 por 5 kg => 9 por grama
        assert_eq!(cost_per_base_unit(d("45000"), Some(d("5")), Some(d("1000"))), Some(d("9")));
        assert_eq!(
            cost_per_base_unit(d("10"), Some(d("3")), Some(d("1"))),
            Some(d("3.333333"))
        );
    }

    #[test]
    fn cost_per_base_unit_is_undefined_without_positive_divisors() {
        assert_eq!(cost_per_base_unit(d("100"), Some(Decimal::ZERO), Some(d("1000"))), None);
        assert_eq!(cost_per_base_unit(d("100"), Some(d("1")), Some(Decimal::ZERO)), None);
        assert_eq!(cost_per_base_unit(d("100"), None, Some(d("1"))), None);
        assert_eq!(cost_per_base_unit(d("100"), Some(d("-2")), Some(d("1"))), None);
        assert_eq!(cost_per_base_unit(d("100"), Some(d("1")), None), None);
    }

    #[test]
    fn cost_per_base_unit_decreases_as_divisors_grow() {
        let total = d("12000");
        let mut previous: Option<Decimal> = None;
        for factor in ["1", "2", "10", "453.592", "1000"] {
            let cost = cost_per_base_unit(total, Some(d("1")), Some(d(factor))).unwrap();
            if let Some(p) = previous {
                assert!(cost < p, "{factor}");
            }
            previous = Some(cost);
        }

        let small = cost_per_base_unit(total, Some(d("2")), Some(d("10"))).unwrap();
        let large = cost_per_base_unit(total, Some(d("6")), Some(d("10"))).unwrap();
        assert!(large < small);
    }

    #[test]
    fn final_factor_uses_unit_factor_to_base() {
        let kg = unit("kg", UnitType::Mass, "1000", false);
        assert_eq!(final_conversion_factor(d("2.5"), &kg), Some(d("2500")));
        assert_eq!(to_base_quantity(d("3"), d("2500")), Some(d("7500")));
        assert_eq!(expected_unit_price(d("1.8"), d("1000")), Some(d("1800")));
    }

    #[test]
    fn conversions_report_overflow_instead_of_panicking() {
        let kg = unit("kg", UnitType::Mass, "1000", false);
        assert_eq!(final_conversion_factor(Decimal::MAX, &kg), None);
        assert_eq!(to_base_quantity(Decimal::MAX, d("2")), None);
        assert_eq!(expected_unit_price(Decimal::MAX, d("1000")), None);
    }

    #[test]
    fn rejects_units_of_different_dimensions() {
        let g = unit("g", UnitType::Mass, "1", true);
        let ml = unit("ml", UnitType::Volume, "1", true);
        let kg = unit("kg", UnitType::Mass, "1000", false);
        assert!(ensure_same_dimension(&g, &kg).is_ok());
        assert!(matches!(
            ensure_same_dimension(&g, &ml),
            Err(AppError::UnitTypeMismatch { base: UnitType::Mass, conversion: UnitType::Volume })
        ));
    }

    #[test]
    fn unit_catalog_needs_one_base_per_type() {
        let ok = vec![
            unit("g", UnitType::Mass, "1", true),
            unit("kg", UnitType::Mass, "1000", false),
            unit("und", UnitType::Unit, "1", true),
        ];
        assert!(validate_unit_catalog(&ok).is_ok());

        let two_bases = vec![unit("g", UnitType::Mass, "1", true), unit("kg", UnitType::Mass, "1", true)];
        assert!(validate_unit_catalog(&two_bases).is_err());

        let no_base = vec![unit("l", UnitType::Volume, "1000", false)];
        assert!(validate_unit_catalog(&no_base).is_err());

        let bad_factor = vec![unit("g", UnitType::Mass, "2", true)];
        assert!(validate_unit_catalog(&bad_factor).is_err());
    }
}

// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// Validadores customizados usados nos payloads (`#[validate(custom(function = ...))]`)

/// Teto para quantidades, preços e fatores recebidos. Mantém `qtd × preço × 100`
/// bem abaixo de `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

fn exceeds_max(value: &Decimal) -> Option<ValidationError> {
    if value.abs() > MAX_AMOUNT {
        let mut err = ValidationError::new("max_amount");
        err.message = Some("Value exceeds the accepted limit.".into());
        return Some(err);
    }
    None
}

/// Só o teto. Zero e negativos ficam para a regra de negócio.
pub fn validate_amount(value: &Decimal) -> Result<(), ValidationError> {
    exceeds_max(value).map_or(Ok(()), Err)
}

pub fn validate_not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if let Some(err) = exceeds_max(value) {
        return Err(err);
    }
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("not_negative");
        err.message = Some("Value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if let Some(err) = exceeds_max(value) {
        return Err(err);
    }
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("Value must be greater than zero.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percentage");
        err.message = Some("Percentage must be between 0 and 100.".into());
        return Err(err);
    }
    Ok(())
}

/// Nome sem espaços nas pontas entre 2 e 255 caracteres.
pub fn validate_trimmed_name(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if !(2..=255).contains(&len) {
        let mut err = ValidationError::new("name_length");
        err.message = Some("Name must have between 2 and 255 characters.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_validators() {
        assert!(validate_not_negative(&Decimal::ZERO).is_ok());
        assert!(validate_not_negative(&Decimal::new(-1, 2)).is_err());
        assert!(validate_positive(&Decimal::ZERO).is_err());
        assert!(validate_positive(&Decimal::new(1, 3)).is_ok());
        assert!(validate_percentage(&Decimal::new(19, 0)).is_ok());
        assert!(validate_percentage(&Decimal::new(1001, 1)).is_err());
    }

    #[test]
    fn amounts_are_capped() {
        assert_eq!(MAX_AMOUNT, Decimal::new(1_000_000_000_000, 0));
        assert!(validate_amount(&MAX_AMOUNT).is_ok());
        assert!(validate_amount(&Decimal::new(-5, 0)).is_ok());
        assert!(validate_amount(&(MAX_AMOUNT + Decimal::ONE)).is_err());
        assert!(validate_positive(&Decimal::new(1_000_000_000_000_000, 0)).is_err());
        assert!(validate_not_negative(&Decimal::new(1_000_000_000_000_001, 3)).is_err());
        assert!(validate_not_negative(&Decimal::new(999_999_999_999_999, 3)).is_ok());
    }

    #[test]
    fn trimmed_names() {
        assert!(validate_trimmed_name("  a ").is_err());
        assert!(validate_trimmed_name(" Bebidas ").is_ok());
        assert!(validate_trimmed_name(&"x".repeat(256)).is_err());
    }
}

// src/handlers.rs

use validator::{Validate, ValidationErrors};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

pub mod auth;
pub mod catalog;
pub mod ingredients;
pub mod inventory;
pub mod invoices;
pub mod menus;
pub mod navigation;
pub mod rbac;
pub mod restaurants;

/// Validação do derive seguida da validação de consistência do payload.
pub(crate) fn validate_payload<T: Validate>(
    payload: &T,
    consistency: impl FnOnce(&T) -> Result<(), ValidationErrors>,
    locale: &Locale,
    app_state: &AppState,
) -> Result<(), ApiError> {
    payload
        .validate()
        .and_then(|_| consistency(payload))
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale, &app_state.i18n_store))
}

/// Para payloads sem regras além do derive.
pub(crate) fn no_extra_rules<T>(_: &T) -> Result<(), ValidationErrors> {
    Ok(())
}

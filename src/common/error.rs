// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::{inventory::TransactionReason, unit::UnitType};

// Erros de domínio da aplicação. Cada variante vira um status HTTP + mensagem traduzida.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] ValidationErrors),

    // --- Autenticação ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Nome de usuário já existe")]
    UsernameAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Token expirado")]
    TokenExpired,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // --- Permissões ---
    #[error("Permissão negada: {action} em {module}")]
    PermissionDenied { module: String, action: String },

    #[error("Cargo não encontrado: {0}")]
    RoleNotFound(String),

    #[error("Cargo não pode ser atribuído: {0}")]
    RoleNotAssignable(String),

    #[error("Nenhuma permissão para o restaurante {0}")]
    PermissionEntryNotFound(Uuid),

    // --- Conta e restaurantes ---
    #[error("Plano de assinatura não encontrado: {0}")]
    SubscriptionPlanNotFound(Uuid),

    #[error("Restaurante não encontrado: {0}")]
    RestaurantNotFound(Uuid),

    #[error("Limite de restaurantes do plano atingido ({0})")]
    RestaurantLimitExceeded(i32),

    #[error("Já existe um restaurante com {field} '{value}'")]
    RestaurantAlreadyExists { field: &'static str, value: String },

    // --- Catálogo ---
    #[error("Unidade não encontrada: {0}")]
    UnitNotFound(Uuid),

    #[error("Unidades incompatíveis: {base:?} x {conversion:?}")]
    UnitTypeMismatch { base: UnitType, conversion: UnitType },

    #[error("Tipo de documento não encontrado: {0}")]
    DocumentTypeNotFound(Uuid),

    #[error("Fornecedor não encontrado: {0}")]
    SupplierNotFound(Uuid),

    #[error("Dados do novo fornecedor incompletos")]
    SupplierDetailsRequired,

    #[error("Item de fornecedor não encontrado: {0}")]
    SupplierItemNotFound(Uuid),

    #[error("Item {0} não pertence ao fornecedor da fatura")]
    SupplierItemMismatch(Uuid),

    #[error("Ingrediente não encontrado: {0}")]
    IngredientNotFound(Uuid),

    #[error("Ingrediente já existe: {0}")]
    IngredientAlreadyExists(String),

    // --- Estoque ---
    #[error("Ingrediente já ativado neste restaurante")]
    IngredientAlreadyActivated,

    #[error("Estoque não encontrado: {0}")]
    IngredientStockNotFound(Uuid),

    #[error("Motivo inválido para ajuste manual: {0:?}")]
    InvalidAdjustmentReason(TransactionReason),

    #[error("Valor de estoque inválido: {0}")]
    InvalidStockValue(Decimal),

    #[error("Estoque resultante negativo: {0}")]
    NegativeStock(Decimal),

    // --- Faturas ---
    #[error("Fatura já registrada: {0}")]
    InvoiceAlreadyExists(String),

    #[error("Fatura não encontrada: {0}")]
    InvoiceNotFound(Uuid),

    #[error("Fatura com linhas inválidas")]
    InvoiceNotSubmittable,

    #[error("Percentual de imposto inválido: {0}")]
    InvalidTaxPercentage(Decimal),

    #[error("Fator de conversão inválido: {0}")]
    InvalidConversionFactor(Decimal),

    #[error("Valor fora do limite aceito")]
    InvalidAmount,

    // --- Menus ---
    #[error("Menu não encontrado: {0}")]
    MenuNotFound(Uuid),

    #[error("Menu já existe: {0}")]
    MenuAlreadyExists(String),

    #[error("Submenu não encontrado: {0}")]
    SubmenuNotFound(Uuid),

    #[error("Submenu já existe: {0}")]
    SubmenuAlreadyExists(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O erro "pronto para o cliente": status + mensagem já traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "data": null,
            "timestamp": Utc::now(),
            "errorMessage": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Campo -> mensagens, na forma que o frontend mostra ao lado de cada input.
// Payloads aninhados viram `supplier.name`, listas viram `items[0].quantityPurchased`.
fn collect_details(prefix: &str, errors: &ValidationErrors, out: &mut HashMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                out.entry(key).or_default().extend(field_errors.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_details(&key, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_details(&format!("{}[{}]", key, index), inner, out);
                }
            }
        }
    }
}

fn validation_details(errors: &ValidationErrors) -> serde_json::Value {
    let mut details = HashMap::new();
    collect_details("", errors, &mut details);
    json!(details)
}

impl AppError {
    /// Converte o erro de domínio na resposta HTTP, com a mensagem no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();

        let (status, key, params): (StatusCode, &str, Vec<(&str, String)>) = match self {
            AppError::ValidationError(errors) => {
                return ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: i18n.translate(lang, "error.validation", &[]),
                    details: Some(validation_details(errors)),
                };
            }
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "error.email_exists", vec![]),
            AppError::UsernameAlreadyExists => (StatusCode::CONFLICT, "error.username_exists", vec![]),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "error.invalid_credentials", vec![]),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "error.invalid_token", vec![]),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "error.token_expired", vec![]),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "error.user_not_found", vec![]),
            AppError::PermissionDenied { module, action } => (
                StatusCode::FORBIDDEN,
                "error.permission_denied",
                vec![("module", module.clone()), ("action", action.clone())],
            ),
            AppError::RoleNotFound(name) => (StatusCode::NOT_FOUND, "error.role_not_found", vec![("name", name.clone())]),
            AppError::RoleNotAssignable(name) => (StatusCode::BAD_REQUEST, "error.role_not_assignable", vec![("name", name.clone())]),
            AppError::PermissionEntryNotFound(_) => (StatusCode::NOT_FOUND, "error.permission_entry_not_found", vec![]),
            AppError::SubscriptionPlanNotFound(_) => (StatusCode::NOT_FOUND, "error.plan_not_found", vec![]),
            AppError::RestaurantNotFound(_) => (StatusCode::NOT_FOUND, "error.restaurant_not_found", vec![]),
            AppError::RestaurantLimitExceeded(max) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "error.restaurant_limit",
                vec![("max", max.to_string())],
            ),
            AppError::RestaurantAlreadyExists { field, value } => (
                StatusCode::CONFLICT,
                "error.restaurant_exists",
                vec![("field", field.to_string()), ("value", value.clone())],
            ),
            AppError::UnitNotFound(_) => (StatusCode::NOT_FOUND, "error.unit_not_found", vec![]),
            AppError::UnitTypeMismatch { base, conversion } => (
                StatusCode::BAD_REQUEST,
                "error.unit_type_mismatch",
                vec![("base", base.as_str().to_string()), ("conversion", conversion.as_str().to_string())],
            ),
            AppError::DocumentTypeNotFound(_) => (StatusCode::NOT_FOUND, "error.document_type_not_found", vec![]),
            AppError::SupplierNotFound(_) => (StatusCode::NOT_FOUND, "error.supplier_not_found", vec![]),
            AppError::SupplierDetailsRequired => (StatusCode::BAD_REQUEST, "error.supplier_details_required", vec![]),
            AppError::SupplierItemNotFound(_) => (StatusCode::NOT_FOUND, "error.supplier_item_not_found", vec![]),
            AppError::SupplierItemMismatch(_) => (StatusCode::BAD_REQUEST, "error.supplier_item_mismatch", vec![]),
            AppError::IngredientNotFound(_) => (StatusCode::NOT_FOUND, "error.ingredient_not_found", vec![]),
            AppError::IngredientAlreadyExists(name) => (
                StatusCode::CONFLICT,
                "error.ingredient_exists",
                vec![("name", name.clone())],
            ),
            AppError::IngredientAlreadyActivated => (StatusCode::CONFLICT, "error.ingredient_already_activated", vec![]),
            AppError::IngredientStockNotFound(_) => (StatusCode::NOT_FOUND, "error.stock_not_found", vec![]),
            AppError::InvalidAdjustmentReason(reason) => (
                StatusCode::BAD_REQUEST,
                "error.invalid_adjustment_reason",
                vec![("reason", reason.as_str().to_string())],
            ),
            AppError::InvalidStockValue(value) => (
                StatusCode::BAD_REQUEST,
                "error.invalid_stock_value",
                vec![("value", value.normalize().to_string())],
            ),
            AppError::NegativeStock(value) => (
                StatusCode::BAD_REQUEST,
                "error.negative_stock",
                vec![("value", value.normalize().to_string())],
            ),
            AppError::InvoiceAlreadyExists(number) => (
                StatusCode::CONFLICT,
                "error.invoice_exists",
                vec![("number", number.clone())],
            ),
            AppError::InvoiceNotFound(_) => (StatusCode::NOT_FOUND, "error.invoice_not_found", vec![]),
            AppError::InvoiceNotSubmittable => (StatusCode::BAD_REQUEST, "error.invoice_not_submittable", vec![]),
            AppError::InvalidTaxPercentage(value) => (
                StatusCode::BAD_REQUEST,
                "error.invalid_tax",
                vec![("value", value.normalize().to_string())],
            ),
            AppError::InvalidConversionFactor(value) => (
                StatusCode::BAD_REQUEST,
                "error.invalid_conversion_factor",
                vec![("value", value.normalize().to_string())],
            ),
            AppError::InvalidAmount => (StatusCode::BAD_REQUEST, "error.invalid_amount", vec![]),
            AppError::MenuNotFound(_) => (StatusCode::NOT_FOUND, "error.menu_not_found", vec![]),
            AppError::MenuAlreadyExists(name) => (StatusCode::CONFLICT, "error.menu_exists", vec![("name", name.clone())]),
            AppError::SubmenuNotFound(_) => (StatusCode::NOT_FOUND, "error.submenu_not_found", vec![]),
            AppError::SubmenuAlreadyExists(name) => (
                StatusCode::CONFLICT,
                "error.submenu_exists",
                vec![("name", name.clone())],
            ),

            // Todos os outros erros (banco, bcrypt, jwt, anyhow) viram 500.
            // O detalhe vai para o log, nunca para o cliente.
            e @ (AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)) => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "error.internal", vec![])
            }
        };

        ApiError {
            status,
            error: i18n.translate(lang, key, &params),
            details: None,
        }
    }
}

// Usado nos pontos sem acesso ao Locale (ex.: middleware). Idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::global()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    fn store() -> &'static I18nStore {
        I18nStore::global()
    }

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let locale = Locale("en".into());
        let cases = [
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::TokenExpired, StatusCode::UNAUTHORIZED),
            (
                AppError::PermissionDenied { module: "INVENTORY".into(), action: "EDIT".into() },
                StatusCode::FORBIDDEN,
            ),
            (AppError::RestaurantLimitExceeded(1), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::IngredientAlreadyActivated, StatusCode::CONFLICT),
            (AppError::MenuNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (AppError::NegativeStock(Decimal::new(-5, 0)), StatusCode::BAD_REQUEST),
            (AppError::InvalidAmount, StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.to_api_error(&locale, store()).status, status, "{err:?}");
        }
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("Name is required.".into());
        errors.add("name", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), store());
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(details["name"][0], "Name is required.");
    }

    #[test]
    fn messages_follow_the_locale() {
        let err = AppError::InvoiceNotSubmittable;
        let es = err.to_api_error(&Locale("es".into()), store()).error;
        let en = err.to_api_error(&Locale("en".into()), store()).error;
        assert_ne!(es, en);
    }
}

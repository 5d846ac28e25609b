// src/models/restaurant.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::common::validation::validate_percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "operation_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationMode {
    Prepaid,
    Postpaid,
}

/// Como o imposto das faturas de compra é informado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxApplyMode {
    PerItem,
    PerInvoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSettings {
    pub pre_payment_enabled: bool,
    pub allow_takeaway: bool,
    pub allow_delivery: bool,
    #[validate(range(min = 0, message = "Table capacity cannot be negative."))]
    pub max_table_capacity: i32,
    pub tax_apply_mode: TaxApplyMode,
    #[validate(custom(function = "validate_percentage"))]
    pub default_tax_percentage: Decimal,
}

impl Default for RestaurantSettings {
    fn default() -> Self {
        Self {
            pre_payment_enabled: false,
            allow_takeaway: true,
            allow_delivery: false,
            max_table_capacity: 0,
            tax_apply_mode: TaxApplyMode::PerInvoice,
            default_tax_percentage: Decimal::new(19, 0),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub operation_mode: OperationMode,
    pub is_active: bool,
    #[sqlx(json)]
    pub settings: RestaurantSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Restaurante + nome do cargo do usuário nele (lista "meus restaurantes").
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantWithRole {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantPayload {
    #[validate(length(min = 1, max = 255, message = "Name is required."))]
    pub name: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(email(message = "The email is invalid."))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
    pub operation_mode: OperationMode,
    #[validate(nested)]
    #[serde(default)]
    pub settings: RestaurantSettings,
}

impl RestaurantPayload {
    /// Campos opcionais vazios viram None e o nome perde os espaços das pontas.
    pub fn normalized(mut self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        self.name = self.name.trim().to_string();
        self.address = clean(self.address);
        self.email = clean(self.email);
        self.phone_number = clean(self.phone_number);
        self
    }

    // Regras que o derive não expressa
    pub fn validate_consistency(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            let mut err = ValidationError::new("required");
            err.message = Some("Name is required.".into());
            errors.add("name", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

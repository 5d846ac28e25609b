// src/models/ingredient.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::common::{formatters, validation::validate_positive};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MasterIngredient {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub name: String,
    pub base_unit_id: Uuid,
    pub active_supplier_item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Payload de criação ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MasterIngredientPayload {
    #[validate(length(min = 1, max = 255, message = "Ingredient name is required."))]
    pub name: String,
    pub base_unit_id: Uuid,
}

/// `id = None` cria o fornecedor na hora (nome e documento obrigatórios).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPayload {
    pub id: Option<Uuid>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    pub document_type_id: Option<Uuid>,
    #[validate(length(max = 50))]
    pub document_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupplierItemPayload {
    #[validate(length(max = 255))]
    pub brand_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Purchase unit name is required."))]
    pub purchase_unit_name: String,
    #[validate(custom(function = "validate_positive"))]
    pub conversion_factor: Decimal,
    pub conversion_unit_id: Uuid,
    #[serde(deserialize_with = "formatters::deserialize_price")]
    #[validate(custom(function = "validate_positive"))]
    pub total_price: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngredientPayload {
    #[validate(nested)]
    pub master_ingredient: MasterIngredientPayload,
    #[validate(nested)]
    pub supplier: SupplierPayload,
    #[validate(nested)]
    pub supplier_item: SupplierItemPayload,
}

impl CreateIngredientPayload {
    pub fn validate_consistency(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.master_ingredient.name.trim().is_empty() {
            let mut err = ValidationError::new("required");
            err.message = Some("Ingredient name is required.".into());
            errors.add("masterIngredient.name", err);
        }

        if self.supplier.id.is_none() {
            let blank = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or("").is_empty();
            if blank(&self.supplier.name)
                || self.supplier.document_type_id.is_none()
                || blank(&self.supplier.document_number)
            {
                let mut err = ValidationError::new("supplier_details");
                err.message = Some("Supplier name, document type and number are required for a new supplier.".into());
                errors.add("supplier", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Fornecedor resolvido pelo serviço: existente ou a criar.
#[derive(Debug, Clone)]
pub enum SupplierRef {
    Existing(Uuid),
    New {
        name: String,
        document_type_id: Uuid,
        document_number: String,
    },
}

/// Ingrediente com os valores já calculados, pronto para persistir.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub owner_id: Uuid,
    pub name: String,
    pub base_unit_id: Uuid,
    pub supplier: SupplierRef,
    pub brand_name: Option<String>,
    pub purchase_unit_name: String,
    pub conversion_factor: Decimal,
    pub last_cost_base: Option<Decimal>,
}

// --- Respostas ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
    pub base_unit_id: Uuid,
    pub active_supplier_item_id: Uuid,
    pub supplier_item: crate::models::supplier::SupplierItem,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IngredientListItem {
    pub id: Uuid,
    pub name: String,
    pub unit_abbreviation: String,
    pub cost_per_base_unit: Option<Decimal>,
    #[sqlx(skip)]
    pub cost_per_base_unit_display: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSupplierInfo {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub supplier_item_id: Uuid,
    pub brand_name: Option<String>,
    pub purchase_unit_name: String,
    pub conversion_factor: Decimal,
    pub last_cost_base: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IngredientDetail {
    pub id: Uuid,
    pub name: String,
    pub base_unit_id: Uuid,
    pub unit_name: String,
    pub unit_abbreviation: String,
    pub cost_per_base_unit: Option<Decimal>,
    #[sqlx(skip)]
    pub cost_per_base_unit_display: String,
    #[sqlx(skip)]
    pub active_supplier: Option<ActiveSupplierInfo>,
}

/// Texto exibido para o custo por unidade base (placeholder quando indefinido).
pub fn cost_display(cost: Option<Decimal>) -> String {
    formatters::format_optional(cost, 6)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngredientSort {
    #[default]
    Name,
    Unit,
    Cost,
}

impl IngredientSort {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("unit") | Some("unitabbreviation") => Self::Unit,
            Some("cost") | Some("costperbaseunit") => Self::Cost,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientFilter {
    /// Abreviações separadas por vírgula (ex.: `kg,g`)
    pub units: Option<String>,
}

impl IngredientFilter {
    pub fn unit_list(&self) -> Vec<String> {
        self.units
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|u| u.trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect()
    }
}

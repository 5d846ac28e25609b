// src/models/supplier.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub owner_id: Uuid,
    pub name: String,
    pub document_type_id: Uuid,
    pub document_number: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
}

/// Produto de um fornecedor: a embalagem comprada e quanto ela vale na unidade base.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SupplierItem {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub master_ingredient_id: Uuid,
    pub brand_name: Option<String>,
    pub purchase_unit_name: String,
    pub conversion_factor: Decimal,
    pub last_cost_base: Option<Decimal>,
}

// Usado no formulário de faturas
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SupplierItemForInvoice {
    pub id: Uuid,
    pub brand_name: Option<String>,
    pub purchase_unit_name: String,
    pub conversion_factor: Decimal,
    pub last_cost_base: Option<Decimal>,
    pub master_ingredient_id: Uuid,
    pub ingredient_name: String,
    pub base_unit_abbreviation: String,
    #[sqlx(skip)]
    pub suggested_unit_price: Option<Decimal>,
    #[sqlx(skip)]
    pub suggested_unit_price_display: String,
}

// src/models/invoice.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::common::{
    formatters::deserialize_price,
    validation::{validate_amount, validate_percentage, validate_positive},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Completed,
}

// =========================================================================
// PAYLOADS
// =========================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInvoiceItemPayload {
    pub supplier_item_id: Uuid,
    #[validate(custom(function = "validate_amount"))]
    pub quantity_purchased: Decimal,
    #[serde(deserialize_with = "deserialize_price")]
    #[validate(custom(function = "validate_amount"))]
    pub unit_price_purchased: Decimal,
    #[validate(custom(function = "validate_percentage"))]
    pub tax_percentage: Option<Decimal>,
    #[validate(custom(function = "validate_positive"))]
    pub conversion_factor_used: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInvoicePayload {
    pub supplier_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Invoice number is required."))]
    pub supplier_invoice_number: String,
    pub emission_date: NaiveDate,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    #[validate(custom(function = "validate_percentage"))]
    pub tax_percentage: Option<Decimal>,
    #[validate(nested)]
    pub items: Vec<RegisterInvoiceItemPayload>,
}

impl RegisterInvoicePayload {
    pub fn validate_consistency(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.supplier_invoice_number.trim().is_empty() {
            let mut err = ValidationError::new("required");
            err.message = Some("Invoice number is required.".into());
            errors.add("supplierInvoiceNumber", err);
        }
        if self.items.is_empty() {
            let mut err = ValidationError::new("required");
            err.message = Some("At least one item is required.".into());
            errors.add("items", err);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// =========================================================================
// CÁLCULO (entrada/saída da calculadora)
// =========================================================================

/// Uma linha da fatura como a calculadora a enxerga.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_percentage: Option<Decimal>,
    pub conversion_factor: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub subtotal: Decimal,
    pub tax_percentage: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub base_quantity: Decimal,
    pub cost_per_base_unit: Option<Decimal>,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub lines: Vec<LineBreakdown>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_amount: Decimal,
    pub submittable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceDirection {
    Increased,
    Decreased,
}

/// Aviso de variação de preço. Nunca bloqueia o registro.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAdvisory {
    pub direction: PriceDirection,
    pub percentage: Decimal,
    pub expected_unit_price: Decimal,
    pub amount_difference: Decimal,
    pub base_amount_difference: Decimal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineAdvisory {
    pub line: usize,
    pub supplier_item_id: Uuid,
    #[serde(flatten)]
    pub advisory: PriceAdvisory,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePreview {
    #[serde(flatten)]
    pub totals: InvoiceTotals,
    pub advisories: Vec<LineAdvisory>,
}

// =========================================================================
// PERSISTÊNCIA
// =========================================================================

/// Linha calculada, pronta para gravar.
#[derive(Debug, Clone)]
pub struct NewInvoiceItem {
    pub supplier_item_id: Uuid,
    pub master_ingredient_id: Uuid,
    pub quantity_purchased: Decimal,
    pub unit_price_purchased: Decimal,
    pub tax_percentage: Decimal,
    pub conversion_factor_used: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub base_quantity: Decimal,
    pub cost_per_base_unit: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub restaurant_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_invoice_number: String,
    pub emission_date: NaiveDate,
    pub notes: Option<String>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_amount: Decimal,
    pub created_by: Uuid,
    pub items: Vec<NewInvoiceItem>,
}

// =========================================================================
// RESPOSTAS
// =========================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: Uuid,
    pub supplier_name: Option<String>,
    pub supplier_invoice_number: String,
    pub emission_date: NaiveDate,
    pub received_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub item_count: i64,
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItemDetail {
    pub id: Uuid,
    pub ingredient_name: String,
    pub purchase_unit_name: String,
    pub conversion_factor_used: Decimal,
    pub base_unit_abbreviation: String,
    pub quantity_purchased: Decimal,
    pub unit_price_purchased: Decimal,
    pub tax_percentage: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub cost_per_base_unit: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetail {
    pub id: Uuid,
    pub supplier_name: String,
    pub supplier_invoice_number: String,
    pub emission_date: NaiveDate,
    pub received_at: DateTime<Utc>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub status: InvoiceStatus,
    #[sqlx(skip)]
    pub items: Vec<InvoiceItemDetail>,
}

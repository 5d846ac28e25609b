// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{validate_amount, validate_not_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_reason", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionReason {
    Adjustment,
    Waste,
    Correction,
    Initial,
    Purchase,
    Sale,
}

impl TransactionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adjustment => "ADJUSTMENT",
            Self::Waste => "WASTE",
            Self::Correction => "CORRECTION",
            Self::Initial => "INITIAL",
            Self::Purchase => "PURCHASE",
            Self::Sale => "SALE",
        }
    }

    /// INITIAL, PURCHASE e SALE só são gerados pelo sistema.
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Adjustment | Self::Waste | Self::Correction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentMode {
    /// Novo valor absoluto
    Replace,
    /// Variação com sinal
    Delta,
}

// Tabela ingredient_stocks
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IngredientStock {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub master_ingredient_id: Uuid,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub updated_at: DateTime<Utc>,
}

// Visão de leitura, com nome e unidade do ingrediente
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStockView {
    pub id: Uuid,
    pub master_ingredient_id: Uuid,
    pub ingredient_name: String,
    pub unit_abbreviation: String,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub low_stock: bool,
}

/// Movimentação imutável: cada alteração de estoque gera uma.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub ingredient_stock_id: Uuid,
    pub delta: Decimal,
    pub reason: TransactionReason,
    pub invoice_id: Option<Uuid>,
    pub previous_stock: Decimal,
    pub resulting_stock: Decimal,
    pub notes: Option<String>,
    #[serde(skip_serializing)]
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Ingrediente da conta que ainda não foi ativado no restaurante
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AvailableIngredient {
    pub id: Uuid,
    pub name: String,
    pub unit_abbreviation: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivateIngredientPayload {
    pub master_ingredient_id: Uuid,
    #[validate(custom(function = "validate_not_negative"))]
    pub initial_stock: Decimal,
    #[validate(custom(function = "validate_not_negative"))]
    pub min_stock: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    pub mode: AdjustmentMode,
    #[validate(custom(function = "validate_amount"))]
    pub value: Decimal,
    pub reason: TransactionReason,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Pedido de ajuste já normalizado.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdjustment {
    pub mode: AdjustmentMode,
    pub value: Decimal,
    pub reason: TransactionReason,
    pub notes: Option<String>,
}

impl From<AdjustStockPayload> for StockAdjustment {
    fn from(p: AdjustStockPayload) -> Self {
        Self {
            mode: p.mode,
            value: p.value,
            reason: p.reason,
            notes: p.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        }
    }
}

/// Resultado de um ajuste: valores antes/depois e a variação aplicada.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentOutcome {
    pub previous_stock: Decimal,
    pub resulting_stock: Decimal,
    pub delta: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InventorySort {
    #[default]
    Name,
    Stock,
    MinStock,
}

impl InventorySort {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("stock") | Some("currentstock") => Self::Stock,
            Some("minstock") | Some("min_stock") => Self::MinStock,
            _ => Self::Name,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    /// Só itens abaixo do mínimo
    pub low_stock: Option<bool>,
}

// src/services/inventory_service.rs

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{Page, PageQuery},
    },
    db::store::{IngredientStore, InventoryStore},
    models::inventory::{
        ActivateIngredientPayload, AdjustmentMode, AdjustmentOutcome, AvailableIngredient,
        InventoryFilter, InventoryStockView, InventoryTransaction, StockAdjustment,
    },
};

/// Aplica um ajuste manual sobre o saldo anterior.
///
/// - `Replace`: o valor é o novo saldo e não pode ser negativo.
/// - `Delta`: variação com sinal, diferente de zero; o saldo resultante só pode
///   ficar negativo se `allow_negative` estiver ligado.
pub fn apply_adjustment(
    previous: Decimal,
    adjustment: &StockAdjustment,
    allow_negative: bool,
) -> Result<AdjustmentOutcome, AppError> {
    if !adjustment.reason.is_manual() {
        return Err(AppError::InvalidAdjustmentReason(adjustment.reason));
    }

    let resulting = match adjustment.mode {
        AdjustmentMode::Replace => {
            if adjustment.value < Decimal::ZERO {
                return Err(AppError::InvalidStockValue(adjustment.value));
            }
            adjustment.value
        }
        AdjustmentMode::Delta => {
            if adjustment.value.is_zero() {
                return Err(AppError::InvalidStockValue(adjustment.value));
            }
            let resulting = previous.checked_add(adjustment.value).ok_or(AppError::InvalidAmount)?;
            if resulting < Decimal::ZERO && !allow_negative {
                return Err(AppError::NegativeStock(resulting));
            }
            resulting
        }
    };

    Ok(AdjustmentOutcome {
        previous_stock: previous,
        resulting_stock: resulting,
        delta: resulting.checked_sub(previous).ok_or(AppError::InvalidAmount)?,
    })
}

#[derive(Clone)]
pub struct InventoryService {
    inventory: Arc<dyn InventoryStore>,
    ingredients: Arc<dyn IngredientStore>,
    allow_negative_stock: bool,
}

impl InventoryService {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        ingredients: Arc<dyn IngredientStore>,
        allow_negative_stock: bool,
    ) -> Self {
        Self { inventory, ingredients, allow_negative_stock }
    }

    pub async fn activate(
        &self,
        restaurant_id: Uuid,
        owner_id: Uuid,
        user_id: Uuid,
        payload: ActivateIngredientPayload,
    ) -> Result<InventoryStockView, AppError> {
        // Só ingredientes da própria conta
        self.ingredients
            .find_ingredient(owner_id, payload.master_ingredient_id)
            .await?
            .ok_or(AppError::IngredientNotFound(payload.master_ingredient_id))?;

        let min_stock = payload.min_stock.unwrap_or(Decimal::ZERO);
        if payload.initial_stock < Decimal::ZERO {
            return Err(AppError::InvalidStockValue(payload.initial_stock));
        }
        if min_stock < Decimal::ZERO {
            return Err(AppError::InvalidStockValue(min_stock));
        }

        let stock = self
            .inventory
            .activate(restaurant_id, payload.master_ingredient_id, payload.initial_stock, min_stock, user_id)
            .await?;

        tracing::info!(
            "📦 Ingrediente {} ativado no restaurante {} (saldo inicial {})",
            payload.master_ingredient_id, restaurant_id, payload.initial_stock
        );
        Ok(stock)
    }

    pub async fn list_stock(
        &self,
        restaurant_id: Uuid,
        query: &PageQuery,
        filter: &InventoryFilter,
    ) -> Result<Page<InventoryStockView>, AppError> {
        self.inventory.list_stock(restaurant_id, query, filter).await
    }

    pub async fn list_available(
        &self,
        restaurant_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Vec<AvailableIngredient>, AppError> {
        self.inventory.list_available(restaurant_id, owner_id).await
    }

    pub async fn adjust(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        user_id: Uuid,
        adjustment: StockAdjustment,
    ) -> Result<InventoryTransaction, AppError> {
        // Motivo inválido falha antes de travar a linha
        if !adjustment.reason.is_manual() {
            return Err(AppError::InvalidAdjustmentReason(adjustment.reason));
        }

        let allow_negative = self.allow_negative_stock;
        let rule = adjustment.clone();
        let apply = move |previous: Decimal| apply_adjustment(previous, &rule, allow_negative);

        let transaction = self
            .inventory
            .adjust(restaurant_id, stock_id, &adjustment, user_id, &apply)
            .await?;

        tracing::info!(
            "📝 Estoque {} ajustado ({:?}): {} -> {}",
            stock_id, adjustment.reason, transaction.previous_stock, transaction.resulting_stock
        );
        Ok(transaction)
    }

    pub async fn transactions(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<InventoryTransaction>, AppError> {
        self.inventory.list_transactions(restaurant_id, stock_id, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::TransactionReason;
    use std::str::FromStr;

    fn d(v: &str) -> Decimal {
        Decimal::from_str(v).unwrap()
    }

    fn adj(mode: AdjustmentMode, value: &str, reason: TransactionReason) -> StockAdjustment {
        StockAdjustment { mode, value: d(value), reason, notes: None }
    }

    #[test]
    fn replace_sets_the_absolute_value() {
        let out = apply_adjustment(d("10"), &adj(AdjustmentMode::Replace, "4", TransactionReason::Correction), false)
            .unwrap();
        assert_eq!(out.previous_stock, d("10"));
        assert_eq!(out.resulting_stock, d("4"));
        assert_eq!(out.delta, d("-6"));
    }

    #[test]
    fn replace_rejects_negative_values() {
        let err = apply_adjustment(d("10"), &adj(AdjustmentMode::Replace, "-1", TransactionReason::Adjustment), true);
        assert!(matches!(err, Err(AppError::InvalidStockValue(_))));
    }

    #[test]
    fn delta_adds_signed_change() {
        let out = apply_adjustment(d("10"), &adj(AdjustmentMode::Delta, "-2.5", TransactionReason::Waste), false)
            .unwrap();
        assert_eq!(out.resulting_stock, d("7.5"));
        assert_eq!(out.delta, d("-2.5"));
    }

    #[test]
    fn delta_respects_negative_stock_policy() {
        let waste = adj(AdjustmentMode::Delta, "-12", TransactionReason::Waste);
        assert!(matches!(apply_adjustment(d("10"), &waste, false), Err(AppError::NegativeStock(_))));
        assert_eq!(apply_adjustment(d("10"), &waste, true).unwrap().resulting_stock, d("-2"));

        let zero = adj(AdjustmentMode::Delta, "0", TransactionReason::Adjustment);
        assert!(matches!(apply_adjustment(d("10"), &zero, false), Err(AppError::InvalidStockValue(_))));
    }

    #[test]
    fn system_reasons_are_not_manual() {
        for reason in [TransactionReason::Initial, TransactionReason::Purchase, TransactionReason::Sale] {
            let result = apply_adjustment(d("1"), &adj(AdjustmentMode::Delta, "1", reason), false);
            assert!(matches!(result, Err(AppError::InvalidAdjustmentReason(r)) if r == reason));
        }
    }
}

// src/services/ingredient_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        formatters::format_optional_currency,
        response::{Page, PageQuery},
    },
    db::store::{CatalogStore, IngredientStore},
    models::{
        ingredient::{
            cost_display, CreateIngredientPayload, IngredientDetail, IngredientFilter, IngredientListItem,
            IngredientResponse, NewIngredient, SupplierRef,
        },
        supplier::SupplierItemForInvoice,
    },
    services::unit_conversion::{
        cost_per_base_unit, ensure_same_dimension, expected_unit_price, final_conversion_factor, round_to,
    },
};

#[derive(Clone)]
pub struct IngredientService {
    ingredients: Arc<dyn IngredientStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl IngredientService {
    pub fn new(ingredients: Arc<dyn IngredientStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { ingredients, catalog }
    }

    pub async fn create(&self, owner_id: Uuid, payload: CreateIngredientPayload) -> Result<IngredientResponse, AppError> {
        let master = payload.master_ingredient;
        let item = payload.supplier_item;

        // 1. Unidades: ambas existem e têm a mesma dimensão
        let base_unit = self
            .catalog
            .find_unit(master.base_unit_id)
            .await?
            .ok_or(AppError::UnitNotFound(master.base_unit_id))?;
        let conversion_unit = self
            .catalog
            .find_unit(item.conversion_unit_id)
            .await?
            .ok_or(AppError::UnitNotFound(item.conversion_unit_id))?;
        ensure_same_dimension(&base_unit, &conversion_unit)?;

        // 2. Fornecedor existente ou novo
        let supplier = match payload.supplier.id {
            Some(id) => {
                self.catalog
                    .find_supplier(owner_id, id)
                    .await?
                    .ok_or(AppError::SupplierNotFound(id))?;
                SupplierRef::Existing(id)
            }
            None => {
                let (Some(name), Some(document_type_id), Some(document_number)) = (
                    payload.supplier.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                    payload.supplier.document_type_id,
                    payload.supplier.document_number.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
                ) else {
                    return Err(AppError::SupplierDetailsRequired);
                };
                self.catalog
                    .find_document_type(document_type_id)
                    .await?
                    .ok_or(AppError::DocumentTypeNotFound(document_type_id))?;
                SupplierRef::New { name, document_type_id, document_number }
            }
        };

        // 3. Fator final e custo por unidade base
        let conversion_factor =
            final_conversion_factor(item.conversion_factor, &conversion_unit).ok_or(AppError::InvalidAmount)?;
        let last_cost_base = cost_per_base_unit(
            item.total_price,
            Some(item.conversion_factor),
            Some(conversion_unit.factor_to_base),
        );
        if last_cost_base.is_none() {
            return Err(AppError::InvalidConversionFactor(conversion_factor));
        }

        let created = self
            .ingredients
            .create_ingredient(NewIngredient {
                owner_id,
                name: master.name.trim().to_string(),
                base_unit_id: base_unit.id,
                supplier,
                brand_name: item.brand_name.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
                purchase_unit_name: item.purchase_unit_name.trim().to_string(),
                conversion_factor,
                last_cost_base,
            })
            .await?;

        tracing::info!("🥕 Ingrediente '{}' ({}) criado", created.name, created.id);
        Ok(created)
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        query: &PageQuery,
        filter: &IngredientFilter,
    ) -> Result<Page<IngredientListItem>, AppError> {
        let page = self.ingredients.list_ingredients(owner_id, query, filter).await?;
        Ok(page.map(|mut item| {
            item.cost_per_base_unit_display = cost_display(item.cost_per_base_unit);
            item
        }))
    }

    pub async fn detail(&self, owner_id: Uuid, id: Uuid) -> Result<IngredientDetail, AppError> {
        let mut detail = self
            .ingredients
            .ingredient_detail(owner_id, id)
            .await?
            .ok_or(AppError::IngredientNotFound(id))?;
        detail.cost_per_base_unit_display = cost_display(detail.cost_per_base_unit);
        Ok(detail)
    }

    /// Itens do fornecedor para o formulário de faturas, com o preço sugerido da embalagem.
    pub async fn supplier_items_for_invoice(
        &self,
        owner_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Vec<SupplierItemForInvoice>, AppError> {
        self.catalog
            .find_supplier(owner_id, supplier_id)
            .await?
            .ok_or(AppError::SupplierNotFound(supplier_id))?;

        let items = self.ingredients.supplier_items_for_invoice(owner_id, supplier_id).await?;
        Ok(items
            .into_iter()
            .map(|mut item| {
                item.suggested_unit_price = item
                    .last_cost_base
                    .and_then(|cost| expected_unit_price(cost, item.conversion_factor))
                    .map(|price| round_to(price, 0));
                item.suggested_unit_price_display = format_optional_currency(item.suggested_unit_price);
                item
            })
            .collect())
    }
}

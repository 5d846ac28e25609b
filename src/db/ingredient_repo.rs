// src/db/ingredient_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{Page, PageQuery},
    },
    db::{store::IngredientStore, unique_violation},
    models::{
        ingredient::{
            ActiveSupplierInfo, IngredientDetail, IngredientFilter, IngredientListItem, IngredientResponse,
            IngredientSort, MasterIngredient, NewIngredient, SupplierRef,
        },
        supplier::{SupplierItem, SupplierItemForInvoice},
    },
};

#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

impl IngredientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_supplier<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        name: &str,
        document_type_id: Uuid,
        document_number: &str,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO suppliers (owner_id, name, document_type_id, document_number)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(owner_id)
        .bind(name)
        .bind(document_type_id)
        .bind(document_number)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }
}

fn order_clause(sort: IngredientSort, descending: bool) -> String {
    let column = match sort {
        IngredientSort::Name => "LOWER(mi.name)",
        IngredientSort::Unit => "u.abbreviation",
        IngredientSort::Cost => "si.last_cost_base",
    };
    let direction = if descending { "DESC" } else { "ASC" };
    format!("{column} {direction} NULLS LAST, LOWER(mi.name) ASC")
}

#[async_trait]
impl IngredientStore for IngredientRepository {
    async fn create_ingredient(&self, new: NewIngredient) -> Result<IngredientResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Fornecedor
        let supplier_id = match &new.supplier {
            SupplierRef::Existing(id) => {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM suppliers WHERE id = $1 AND owner_id = $2)",
                )
                .bind(id)
                .bind(new.owner_id)
                .fetch_one(&mut *tx)
                .await?;
                if !exists {
                    return Err(AppError::SupplierNotFound(*id));
                }
                *id
            }
            SupplierRef::New { name, document_type_id, document_number } => {
                self.insert_supplier(&mut *tx, new.owner_id, name, *document_type_id, document_number)
                    .await?
            }
        };

        // 2. Ingrediente mestre
        let ingredient_id: Uuid = sqlx::query_scalar(
            "INSERT INTO master_ingredients (owner_id, name, base_unit_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(new.owner_id)
        .bind(&new.name)
        .bind(new.base_unit_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::IngredientAlreadyExists(new.name.clone()),
            None => e.into(),
        })?;

        // 3. Primeiro item do fornecedor, já ativo
        let item = sqlx::query_as::<_, SupplierItem>(
            r#"
            INSERT INTO supplier_items (
                supplier_id, master_ingredient_id, brand_name, purchase_unit_name,
                conversion_factor, last_cost_base
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, supplier_id, master_ingredient_id, brand_name, purchase_unit_name,
                      conversion_factor, last_cost_base
            "#,
        )
        .bind(supplier_id)
        .bind(ingredient_id)
        .bind(&new.brand_name)
        .bind(&new.purchase_unit_name)
        .bind(new.conversion_factor)
        .bind(new.last_cost_base)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE master_ingredients SET active_supplier_item_id = $1 WHERE id = $2")
            .bind(item.id)
            .bind(ingredient_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(IngredientResponse {
            id: ingredient_id,
            name: new.name,
            base_unit_id: new.base_unit_id,
            active_supplier_item_id: item.id,
            supplier_item: item,
        })
    }

    async fn find_ingredient(&self, owner_id: Uuid, id: Uuid) -> Result<Option<MasterIngredient>, AppError> {
        let ingredient = sqlx::query_as::<_, MasterIngredient>(
            r#"
            SELECT id, owner_id, name, base_unit_id, active_supplier_item_id, created_at
            FROM master_ingredients
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ingredient)
    }

    async fn list_ingredients(
        &self,
        owner_id: Uuid,
        query: &PageQuery,
        filter: &IngredientFilter,
    ) -> Result<Page<IngredientListItem>, AppError> {
        let search = query.search_term();
        let units = filter.unit_list();

        let from = r#"
            FROM master_ingredients mi
            JOIN units u ON u.id = mi.base_unit_id
            LEFT JOIN supplier_items si ON si.id = mi.active_supplier_item_id
            WHERE mi.owner_id = $1
              AND ($2::text IS NULL OR LOWER(mi.name) LIKE '%' || $2 || '%')
              AND (cardinality($3::text[]) = 0 OR LOWER(u.abbreviation) = ANY($3))
        "#;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {from}"))
            .bind(owner_id)
            .bind(&search)
            .bind(&units)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT mi.id, mi.name, u.abbreviation AS unit_abbreviation, si.last_cost_base AS cost_per_base_unit
            {from}
            ORDER BY {order}
            LIMIT $4 OFFSET $5
            "#,
            order = order_clause(IngredientSort::parse(query.sort_by.as_deref()), query.descending()),
        );
        let items = sqlx::query_as::<_, IngredientListItem>(&sql)
            .bind(owner_id)
            .bind(&search)
            .bind(&units)
            .bind(query.size())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, query, total))
    }

    async fn ingredient_detail(&self, owner_id: Uuid, id: Uuid) -> Result<Option<IngredientDetail>, AppError> {
        let detail = sqlx::query_as::<_, IngredientDetail>(
            r#"
            SELECT mi.id, mi.name, mi.base_unit_id, u.name AS unit_name, u.abbreviation AS unit_abbreviation,
                   si.last_cost_base AS cost_per_base_unit
            FROM master_ingredients mi
            JOIN units u ON u.id = mi.base_unit_id
            LEFT JOIN supplier_items si ON si.id = mi.active_supplier_item_id
            WHERE mi.id = $1 AND mi.owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut detail) = detail else {
            return Ok(None);
        };

        detail.active_supplier = sqlx::query_as::<_, ActiveSupplierInfo>(
            r#"
            SELECT s.id AS supplier_id, s.name AS supplier_name, si.id AS supplier_item_id,
                   si.brand_name, si.purchase_unit_name, si.conversion_factor, si.last_cost_base
            FROM master_ingredients mi
            JOIN supplier_items si ON si.id = mi.active_supplier_item_id
            JOIN suppliers s ON s.id = si.supplier_id
            WHERE mi.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(detail))
    }

    async fn supplier_items_for_invoice(
        &self,
        owner_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Vec<SupplierItemForInvoice>, AppError> {
        let items = sqlx::query_as::<_, SupplierItemForInvoice>(
            r#"
            SELECT si.id, si.brand_name, si.purchase_unit_name, si.conversion_factor, si.last_cost_base,
                   mi.id AS master_ingredient_id, mi.name AS ingredient_name,
                   u.abbreviation AS base_unit_abbreviation
            FROM supplier_items si
            JOIN suppliers s ON s.id = si.supplier_id
            JOIN master_ingredients mi ON mi.id = si.master_ingredient_id
            JOIN units u ON u.id = mi.base_unit_id
            WHERE si.supplier_id = $1 AND s.owner_id = $2
            ORDER BY LOWER(mi.name)
            "#,
        )
        .bind(supplier_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_uses_whitelisted_columns() {
        assert_eq!(
            order_clause(IngredientSort::Cost, true),
            "si.last_cost_base DESC NULLS LAST, LOWER(mi.name) ASC"
        );
        assert!(order_clause(IngredientSort::parse(Some("'; DROP TABLE users")), false).starts_with("LOWER(mi.name) ASC"));
    }
}

// src/db/inventory_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{Page, PageQuery},
    },
    db::{
        store::{AdjustFn, InventoryStore},
        unique_violation,
    },
    models::inventory::{
        AvailableIngredient, IngredientStock, InventoryFilter, InventorySort, InventoryStockView,
        InventoryTransaction, StockAdjustment, TransactionReason,
    },
};

const STOCK_VIEW: &str = r#"
    SELECT st.id, st.master_ingredient_id, mi.name AS ingredient_name, u.abbreviation AS unit_abbreviation,
           st.current_stock, st.min_stock, (st.current_stock < st.min_stock) AS low_stock
    FROM ingredient_stocks st
    JOIN master_ingredients mi ON mi.id = st.master_ingredient_id
    JOIN units u ON u.id = mi.base_unit_id
"#;

const TRANSACTION_COLUMNS: &str = "id, ingredient_stock_id, delta, reason, invoice_id, previous_stock, \
                                   resulting_stock, notes, created_by, created_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Escrita" (Transacionais)
    // ---

    /// Trava a linha de saldo até o fim da transação.
    pub async fn lock_stock<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        master_ingredient_id: Uuid,
    ) -> Result<Option<IngredientStock>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stock = sqlx::query_as::<_, IngredientStock>(
            r#"
            SELECT id, restaurant_id, master_ingredient_id, current_stock, min_stock, updated_at
            FROM ingredient_stocks
            WHERE restaurant_id = $1 AND master_ingredient_id = $2
            FOR UPDATE
            "#,
        )
        .bind(restaurant_id)
        .bind(master_ingredient_id)
        .fetch_optional(executor)
        .await?;
        Ok(stock)
    }

    pub async fn insert_stock<'e, E>(
        &self,
        executor: E,
        restaurant_id: Uuid,
        master_ingredient_id: Uuid,
        initial_stock: Decimal,
        min_stock: Decimal,
    ) -> Result<IngredientStock, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, IngredientStock>(
            r#"
            INSERT INTO ingredient_stocks (restaurant_id, master_ingredient_id, current_stock, min_stock)
            VALUES ($1, $2, $3, $4)
            RETURNING id, restaurant_id, master_ingredient_id, current_stock, min_stock, updated_at
            "#,
        )
        .bind(restaurant_id)
        .bind(master_ingredient_id)
        .bind(initial_stock)
        .bind(min_stock)
        .fetch_one(executor)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::IngredientAlreadyActivated,
            None => e.into(),
        })
    }

    pub async fn set_stock<'e, E>(&self, executor: E, stock_id: Uuid, value: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE ingredient_stocks SET current_stock = $2, updated_at = NOW() WHERE id = $1")
            .bind(stock_id)
            .bind(value)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Registra uma movimentação no livro-razão (imutável).
    #[allow(clippy::too_many_arguments)]
    pub async fn record_transaction<'e, E>(
        &self,
        executor: E,
        stock_id: Uuid,
        previous_stock: Decimal,
        resulting_stock: Decimal,
        reason: TransactionReason,
        invoice_id: Option<Uuid>,
        notes: Option<&str>,
        created_by: Uuid,
    ) -> Result<InventoryTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO inventory_transactions (
                ingredient_stock_id, delta, reason, invoice_id, previous_stock, resulting_stock, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        );
        let transaction = sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(stock_id)
            .bind(resulting_stock - previous_stock)
            .bind(reason)
            .bind(invoice_id)
            .bind(previous_stock)
            .bind(resulting_stock)
            .bind(notes)
            .bind(created_by)
            .fetch_one(executor)
            .await?;
        Ok(transaction)
    }

    async fn stock_view(&self, stock_id: Uuid) -> Result<InventoryStockView, AppError> {
        let view = sqlx::query_as::<_, InventoryStockView>(&format!("{STOCK_VIEW} WHERE st.id = $1"))
            .bind(stock_id)
            .fetch_optional(&self.pool)
            .await?;
        view.ok_or(AppError::IngredientStockNotFound(stock_id))
    }
}

fn order_clause(sort: InventorySort, descending: bool) -> String {
    let column = match sort {
        InventorySort::Name => "LOWER(mi.name)",
        InventorySort::Stock => "st.current_stock",
        InventorySort::MinStock => "st.min_stock",
    };
    let direction = if descending { "DESC" } else { "ASC" };
    format!("{column} {direction}, LOWER(mi.name) ASC")
}

#[async_trait]
impl InventoryStore for InventoryRepository {
    async fn activate(
        &self,
        restaurant_id: Uuid,
        master_ingredient_id: Uuid,
        initial_stock: Decimal,
        min_stock: Decimal,
        user_id: Uuid,
    ) -> Result<InventoryStockView, AppError> {
        let mut tx = self.pool.begin().await?;

        let stock = self
            .insert_stock(&mut *tx, restaurant_id, master_ingredient_id, initial_stock, min_stock)
            .await?;
        self.record_transaction(
            &mut *tx,
            stock.id,
            Decimal::ZERO,
            initial_stock,
            TransactionReason::Initial,
            None,
            None,
            user_id,
        )
        .await?;

        tx.commit().await?;
        self.stock_view(stock.id).await
    }

    async fn list_stock(
        &self,
        restaurant_id: Uuid,
        query: &PageQuery,
        filter: &InventoryFilter,
    ) -> Result<Page<InventoryStockView>, AppError> {
        let search = query.search_term();
        let conditions = r#"
            WHERE st.restaurant_id = $1
              AND ($2::text IS NULL OR LOWER(mi.name) LIKE '%' || $2 || '%')
              AND ($3::boolean IS NULL OR (st.current_stock < st.min_stock) = $3)
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM ingredient_stocks st
            JOIN master_ingredients mi ON mi.id = st.master_ingredient_id
            {conditions}
            "#
        ))
        .bind(restaurant_id)
        .bind(&search)
        .bind(filter.low_stock)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "{STOCK_VIEW} {conditions} ORDER BY {order} LIMIT $4 OFFSET $5",
            order = order_clause(InventorySort::parse(query.sort_by.as_deref()), query.descending()),
        );
        let rows = sqlx::query_as::<_, InventoryStockView>(&sql)
            .bind(restaurant_id)
            .bind(&search)
            .bind(filter.low_stock)
            .bind(query.size())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, query, total))
    }

    async fn list_available(&self, restaurant_id: Uuid, owner_id: Uuid) -> Result<Vec<AvailableIngredient>, AppError> {
        let available = sqlx::query_as::<_, AvailableIngredient>(
            r#"
            SELECT mi.id, mi.name, u.abbreviation AS unit_abbreviation
            FROM master_ingredients mi
            JOIN units u ON u.id = mi.base_unit_id
            WHERE mi.owner_id = $2
              AND NOT EXISTS (
                  SELECT 1 FROM ingredient_stocks st
                  WHERE st.restaurant_id = $1 AND st.master_ingredient_id = mi.id
              )
            ORDER BY LOWER(mi.name)
            "#,
        )
        .bind(restaurant_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(available)
    }

    async fn adjust(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        adjustment: &StockAdjustment,
        user_id: Uuid,
        apply: &AdjustFn,
    ) -> Result<InventoryTransaction, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Trava o saldo para ler o valor anterior
        let previous: Decimal = sqlx::query_scalar(
            "SELECT current_stock FROM ingredient_stocks WHERE id = $1 AND restaurant_id = $2 FOR UPDATE",
        )
        .bind(stock_id)
        .bind(restaurant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::IngredientStockNotFound(stock_id))?;

        // 2. Regra do ajuste sobre o valor travado
        let outcome = apply(previous)?;

        // 3. Grava saldo + movimentação
        self.set_stock(&mut *tx, stock_id, outcome.resulting_stock).await?;
        let transaction = self
            .record_transaction(
                &mut *tx,
                stock_id,
                outcome.previous_stock,
                outcome.resulting_stock,
                adjustment.reason,
                None,
                adjustment.notes.as_deref(),
                user_id,
            )
            .await?;

        tx.commit().await?;
        Ok(transaction)
    }

    async fn list_transactions(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<InventoryTransaction>, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM ingredient_stocks WHERE id = $1 AND restaurant_id = $2)",
        )
        .bind(stock_id)
        .bind(restaurant_id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(AppError::IngredientStockNotFound(stock_id));
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_transactions WHERE ingredient_stock_id = $1")
            .bind(stock_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM inventory_transactions
            WHERE ingredient_stock_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let history = sqlx::query_as::<_, InventoryTransaction>(&sql)
            .bind(stock_id)
            .bind(query.size())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(history, query, total))
    }
}

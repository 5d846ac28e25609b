// src/db/invoice_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{Page, PageQuery},
    },
    db::{store::InvoiceStore, unique_violation, InventoryRepository},
    models::{
        inventory::TransactionReason,
        invoice::{InvoiceDetail, InvoiceItemDetail, InvoiceSummary, NewInvoice},
    },
};

const PURCHASE_NOTE: &str = "Invoice purchase";

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
    inventory: InventoryRepository,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { inventory: InventoryRepository::new(pool.clone()), pool }
    }
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    async fn register_invoice(&self, invoice: NewInvoice) -> Result<Uuid, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Cabeçalho
        let invoice_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (
                restaurant_id, supplier_id, supplier_invoice_number, emission_date,
                subtotal, total_tax, total_amount, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(invoice.restaurant_id)
        .bind(invoice.supplier_id)
        .bind(&invoice.supplier_invoice_number)
        .bind(invoice.emission_date)
        .bind(invoice.subtotal)
        .bind(invoice.total_tax)
        .bind(invoice.total_amount)
        .bind(&invoice.notes)
        .bind(invoice.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::InvoiceAlreadyExists(invoice.supplier_invoice_number.clone()),
            None => e.into(),
        })?;

        for item in &invoice.items {
            // 2. Linha
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, supplier_item_id, quantity_purchased, unit_price_purchased, tax_percentage,
                    conversion_factor_used, subtotal, tax_amount, base_quantity, cost_per_base_unit
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(invoice_id)
            .bind(item.supplier_item_id)
            .bind(item.quantity_purchased)
            .bind(item.unit_price_purchased)
            .bind(item.tax_percentage)
            .bind(item.conversion_factor_used)
            .bind(item.subtotal)
            .bind(item.tax_amount)
            .bind(item.base_quantity)
            .bind(item.cost_per_base_unit)
            .execute(&mut *tx)
            .await?;

            // 3. Último custo por unidade base
            let updated = sqlx::query("UPDATE supplier_items SET last_cost_base = $2 WHERE id = $1")
                .bind(item.supplier_item_id)
                .bind(item.cost_per_base_unit)
                .execute(&mut *tx)
                .await?;
            if updated.rows_affected() == 0 {
                return Err(AppError::SupplierItemNotFound(item.supplier_item_id));
            }

            // 4. Saldo (ativado na hora se preciso) + movimentação PURCHASE
            let stock = match self
                .inventory
                .lock_stock(&mut *tx, invoice.restaurant_id, item.master_ingredient_id)
                .await?
            {
                Some(stock) => stock,
                None => {
                    self.inventory
                        .insert_stock(
                            &mut *tx,
                            invoice.restaurant_id,
                            item.master_ingredient_id,
                            Decimal::ZERO,
                            Decimal::ZERO,
                        )
                        .await?
                }
            };
            let resulting = stock
                .current_stock
                .checked_add(item.base_quantity)
                .ok_or(AppError::InvalidAmount)?;
            self.inventory.set_stock(&mut *tx, stock.id, resulting).await?;
            self.inventory
                .record_transaction(
                    &mut *tx,
                    stock.id,
                    stock.current_stock,
                    resulting,
                    TransactionReason::Purchase,
                    Some(invoice_id),
                    Some(PURCHASE_NOTE),
                    invoice.created_by,
                )
                .await?;
        }

        tx.commit().await?;
        Ok(invoice_id)
    }

    async fn list_invoices(&self, restaurant_id: Uuid, query: &PageQuery) -> Result<Page<InvoiceSummary>, AppError> {
        let search = query.search_term();
        let conditions = r#"
            WHERE i.restaurant_id = $1
              AND ($2::text IS NULL
                   OR LOWER(i.supplier_invoice_number) LIKE '%' || $2 || '%'
                   OR LOWER(s.name) LIKE '%' || $2 || '%')
        "#;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM invoices i LEFT JOIN suppliers s ON s.id = i.supplier_id {conditions}"
        ))
        .bind(restaurant_id)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT i.id, s.name AS supplier_name, i.supplier_invoice_number, i.emission_date, i.received_at,
                   i.total_amount,
                   (SELECT COUNT(*) FROM invoice_items it WHERE it.invoice_id = i.id) AS item_count,
                   i.status
            FROM invoices i
            LEFT JOIN suppliers s ON s.id = i.supplier_id
            {conditions}
            ORDER BY i.emission_date DESC, i.received_at DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, InvoiceSummary>(&sql)
            .bind(restaurant_id)
            .bind(&search)
            .bind(query.size())
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, query, total))
    }

    async fn invoice_detail(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<InvoiceDetail>, AppError> {
        let detail = sqlx::query_as::<_, InvoiceDetail>(
            r#"
            SELECT i.id, s.name AS supplier_name, i.supplier_invoice_number, i.emission_date, i.received_at,
                   i.subtotal, i.total_tax, i.total_amount, i.notes, i.status
            FROM invoices i
            JOIN suppliers s ON s.id = i.supplier_id
            WHERE i.id = $1 AND i.restaurant_id = $2
            "#,
        )
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut detail) = detail else {
            return Ok(None);
        };

        detail.items = sqlx::query_as::<_, InvoiceItemDetail>(
            r#"
            SELECT it.id, mi.name AS ingredient_name, si.purchase_unit_name, it.conversion_factor_used,
                   u.abbreviation AS base_unit_abbreviation, it.quantity_purchased, it.unit_price_purchased,
                   it.tax_percentage, it.subtotal, it.tax_amount, it.cost_per_base_unit
            FROM invoice_items it
            JOIN supplier_items si ON si.id = it.supplier_item_id
            JOIN master_ingredients mi ON mi.id = si.master_ingredient_id
            JOIN units u ON u.id = mi.base_unit_id
            WHERE it.invoice_id = $1
            ORDER BY LOWER(mi.name)
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(detail))
    }
}

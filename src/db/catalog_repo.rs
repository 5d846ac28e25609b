// src/db/catalog_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::CatalogStore,
    models::{
        subscription::SubscriptionPlan,
        supplier::Supplier,
        unit::{DocumentType, Unit},
    },
};

const SUPPLIER_COLUMNS: &str = "id, owner_id, name, document_type_id, document_number, contact_name, \
                                email, phone, address, is_active";

// Tabelas de referência (planos, unidades, documentos) e fornecedores da conta
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        let plans = sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT id, name, description, price, currency, \"interval\", features FROM subscription_plans ORDER BY price",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    async fn find_plan(&self, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError> {
        let plan = sqlx::query_as::<_, SubscriptionPlan>(
            "SELECT id, name, description, price, currency, \"interval\", features FROM subscription_plans WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }

    async fn list_units(&self) -> Result<Vec<Unit>, AppError> {
        let units = sqlx::query_as::<_, Unit>(
            "SELECT id, name, abbreviation, unit_type, factor_to_base, is_base FROM units ORDER BY unit_type, factor_to_base",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    async fn find_unit(&self, id: Uuid) -> Result<Option<Unit>, AppError> {
        let unit = sqlx::query_as::<_, Unit>(
            "SELECT id, name, abbreviation, unit_type, factor_to_base, is_base FROM units WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(unit)
    }

    async fn list_document_types(&self, country_code: Option<&str>) -> Result<Vec<DocumentType>, AppError> {
        let types = sqlx::query_as::<_, DocumentType>(
            r#"
            SELECT id, country_code, name, description
            FROM document_types
            WHERE $1::text IS NULL OR country_code = $1
            ORDER BY country_code, name
            "#,
        )
        .bind(country_code)
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    async fn find_document_type(&self, id: Uuid) -> Result<Option<DocumentType>, AppError> {
        let doc = sqlx::query_as::<_, DocumentType>(
            "SELECT id, country_code, name, description FROM document_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(doc)
    }

    async fn list_suppliers(&self, owner_id: Uuid) -> Result<Vec<Supplier>, AppError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE owner_id = $1 ORDER BY LOWER(name)");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    async fn find_supplier(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 AND owner_id = $2");
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }
}

// src/services/catalog_service.rs

use std::sync::Arc;
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

// Dados de referência: planos, unidades, tipos de documento e fornecedores
#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub async fn plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        self.catalog.list_plans().await
    }

    pub async fn plan(&self, id: Uuid) -> Result<SubscriptionPlan, AppError> {
        self.catalog
            .find_plan(id)
            .await?
            .ok_or(AppError::SubscriptionPlanNotFound(id))
    }

    pub async fn units(&self) -> Result<Vec<Unit>, AppError> {
        self.catalog.list_units().await
    }

    pub async fn document_types(&self, country_code: Option<&str>) -> Result<Vec<DocumentType>, AppError> {
        let code = country_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);
        self.catalog.list_document_types(code.as_deref()).await
    }

    pub async fn suppliers(&self, owner_id: Uuid) -> Result<Vec<Supplier>, AppError> {
        self.catalog.list_suppliers(owner_id).await
    }
}

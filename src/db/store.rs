// src/db/store.rs
//
// Contratos de persistência. Os serviços só conhecem estes traits;
// a implementação (Postgres ou memória) é escolhida na inicialização.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{Page, PageQuery},
    },
    models::{
        auth::{NewUser, User},
        ingredient::{IngredientDetail, IngredientFilter, IngredientListItem, IngredientResponse, MasterIngredient, NewIngredient},
        inventory::{
            AdjustmentOutcome, AvailableIngredient, InventoryFilter, InventoryStockView,
            InventoryTransaction, StockAdjustment,
        },
        invoice::{InvoiceDetail, InvoiceSummary, NewInvoice},
        menu::{Menu, MenuResponse, Submenu},
        rbac::{PermissionEntry, Role},
        restaurant::{Restaurant, RestaurantPayload, RestaurantWithRole},
        subscription::SubscriptionPlan,
        supplier::{Supplier, SupplierItemForInvoice},
        unit::{DocumentType, Unit},
    },
};

/// Calcula o novo saldo a partir do saldo anterior (travado pela store).
pub type AdjustFn = dyn Fn(Decimal) -> Result<AdjustmentOutcome, AppError> + Send + Sync;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// Cria o usuário e o seu cargo de dono (escopo da conta) na mesma transação.
    async fn create_owner_account(&self, user: NewUser, owner_role_id: Uuid) -> Result<User, AppError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;
    async fn permission_entries(&self, user_id: Uuid) -> Result<Vec<PermissionEntry>, AppError>;
    /// Substitui o cargo do usuário no restaurante (um por escopo).
    async fn assign_role(&self, user_id: Uuid, restaurant_id: Uuid, role_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError>;
    async fn find_plan(&self, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError>;
    async fn list_units(&self) -> Result<Vec<Unit>, AppError>;
    async fn find_unit(&self, id: Uuid) -> Result<Option<Unit>, AppError>;
    async fn list_document_types(&self, country_code: Option<&str>) -> Result<Vec<DocumentType>, AppError>;
    async fn find_document_type(&self, id: Uuid) -> Result<Option<DocumentType>, AppError>;
    async fn list_suppliers(&self, owner_id: Uuid) -> Result<Vec<Supplier>, AppError>;
    async fn find_supplier(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Supplier>, AppError>;
}

#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Restaurant>, AppError>;
    /// Cria o restaurante e atribui o cargo de dono a quem criou, na mesma transação.
    async fn create_restaurant(
        &self,
        owner_id: Uuid,
        payload: &RestaurantPayload,
        owner_role_id: Uuid,
    ) -> Result<Restaurant, AppError>;
    async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, AppError>;
    async fn update_restaurant(&self, id: Uuid, payload: &RestaurantPayload) -> Result<Restaurant, AppError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RestaurantWithRole>, AppError>;
}

#[async_trait]
pub trait IngredientStore: Send + Sync {
    async fn create_ingredient(&self, ingredient: NewIngredient) -> Result<IngredientResponse, AppError>;
    async fn find_ingredient(&self, owner_id: Uuid, id: Uuid) -> Result<Option<MasterIngredient>, AppError>;
    async fn list_ingredients(
        &self,
        owner_id: Uuid,
        query: &PageQuery,
        filter: &IngredientFilter,
    ) -> Result<Page<IngredientListItem>, AppError>;
    async fn ingredient_detail(&self, owner_id: Uuid, id: Uuid) -> Result<Option<IngredientDetail>, AppError>;
    async fn supplier_items_for_invoice(
        &self,
        owner_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Vec<SupplierItemForInvoice>, AppError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Cria o saldo e a movimentação INITIAL.
    async fn activate(
        &self,
        restaurant_id: Uuid,
        master_ingredient_id: Uuid,
        initial_stock: Decimal,
        min_stock: Decimal,
        user_id: Uuid,
    ) -> Result<InventoryStockView, AppError>;
    async fn list_stock(
        &self,
        restaurant_id: Uuid,
        query: &PageQuery,
        filter: &InventoryFilter,
    ) -> Result<Page<InventoryStockView>, AppError>;
    async fn list_available(&self, restaurant_id: Uuid, owner_id: Uuid) -> Result<Vec<AvailableIngredient>, AppError>;
    /// Trava o saldo, aplica `apply` sobre o valor anterior e grava a movimentação.
    async fn adjust(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        adjustment: &StockAdjustment,
        user_id: Uuid,
        apply: &AdjustFn,
    ) -> Result<InventoryTransaction, AppError>;
    async fn list_transactions(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<InventoryTransaction>, AppError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Grava fatura e itens, atualiza custos, soma o estoque e registra as movimentações PURCHASE.
    async fn register_invoice(&self, invoice: NewInvoice) -> Result<Uuid, AppError>;
    async fn list_invoices(&self, restaurant_id: Uuid, query: &PageQuery) -> Result<Page<InvoiceSummary>, AppError>;
    async fn invoice_detail(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<InvoiceDetail>, AppError>;
}

#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn list_menus(&self, restaurant_id: Uuid) -> Result<Vec<MenuResponse>, AppError>;
    async fn find_menu(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Menu>, AppError>;
    async fn create_menu(&self, restaurant_id: Uuid, name: &str, description: Option<&str>) -> Result<Menu, AppError>;
    async fn update_menu(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Menu, AppError>;
    async fn delete_menu(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError>;
    /// `sort_order = None` coloca o submenu na próxima posição.
    async fn create_submenu(
        &self,
        menu_id: Uuid,
        name: &str,
        description: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<Submenu, AppError>;
    async fn update_submenu(
        &self,
        menu_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<Submenu, AppError>;
    async fn delete_submenu(&self, menu_id: Uuid, id: Uuid) -> Result<(), AppError>;
}

/// Conjunto de stores usado para montar os serviços.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub restaurants: Arc<dyn RestaurantStore>,
    pub ingredients: Arc<dyn IngredientStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub menus: Arc<dyn MenuStore>,
}

impl Stores {
    /// Tudo em memória, com os dados de referência já carregados.
    pub fn memory() -> Self {
        let store = Arc::new(super::memory::MemoryStore::seeded());
        Self {
            users: store.clone(),
            roles: store.clone(),
            catalog: store.clone(),
            restaurants: store.clone(),
            ingredients: store.clone(),
            inventory: store.clone(),
            invoices: store.clone(),
            menus: store,
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        use super::*;
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            roles: Arc::new(RbacRepository::new(pool.clone())),
            catalog: Arc::new(CatalogRepository::new(pool.clone())),
            restaurants: Arc::new(RestaurantRepository::new(pool.clone())),
            ingredients: Arc::new(IngredientRepository::new(pool.clone())),
            inventory: Arc::new(InventoryRepository::new(pool.clone())),
            invoices: Arc::new(InvoiceRepository::new(pool.clone())),
            menus: Arc::new(MenuRepository::new(pool)),
        }
    }
}

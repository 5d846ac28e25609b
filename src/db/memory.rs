// src/db/memory.rs
//
// Store em memória com os mesmos contratos do Postgres. Usado nos testes e com
// DATA_BACKEND=memory. Cada operação de escrita roda sob um único write lock.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        response::{Page, PageQuery},
    },
    db::store::{
        AdjustFn, CatalogStore, IngredientStore, InventoryStore, InvoiceStore, MenuStore, RestaurantStore,
        RoleStore, UserStore,
    },
    models::{
        auth::{NewUser, User},
        ingredient::{
            ActiveSupplierInfo, IngredientDetail, IngredientFilter, IngredientListItem, IngredientResponse,
            IngredientSort, MasterIngredient, NewIngredient, SupplierRef,
        },
        inventory::{
            AvailableIngredient, IngredientStock, InventoryFilter, InventorySort, InventoryStockView,
            InventoryTransaction, StockAdjustment, TransactionReason,
        },
        invoice::{InvoiceDetail, InvoiceItemDetail, InvoiceStatus, InvoiceSummary, NewInvoice, NewInvoiceItem},
        menu::{Menu, MenuResponse, Submenu},
        rbac::{permission_map, PermissionEntry, Role, OWNER_ROLE},
        restaurant::{Restaurant, RestaurantPayload, RestaurantWithRole},
        subscription::{BillingCycle, PlanFeatures, SubscriptionPlan},
        supplier::{Supplier, SupplierItem, SupplierItemForInvoice},
        unit::{DocumentType, Unit, UnitType},
    },
};

const PURCHASE_NOTE: &str = "Invoice purchase";

#[derive(Debug, Clone)]
struct UserRole {
    user_id: Uuid,
    restaurant_id: Option<Uuid>,
    role_id: Uuid,
}

#[derive(Debug, Clone)]
struct StoredInvoice {
    id: Uuid,
    restaurant_id: Uuid,
    supplier_id: Uuid,
    supplier_invoice_number: String,
    emission_date: NaiveDate,
    received_at: DateTime<Utc>,
    subtotal: Decimal,
    total_tax: Decimal,
    total_amount: Decimal,
    notes: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredInvoiceItem {
    id: Uuid,
    invoice_id: Uuid,
    item: NewInvoiceItem,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<User>,
    roles: Vec<Role>,
    user_roles: Vec<UserRole>,
    plans: Vec<SubscriptionPlan>,
    units: Vec<Unit>,
    document_types: Vec<DocumentType>,
    suppliers: Vec<Supplier>,
    restaurants: Vec<Restaurant>,
    ingredients: Vec<MasterIngredient>,
    supplier_items: Vec<SupplierItem>,
    stocks: Vec<IngredientStock>,
    transactions: Vec<InventoryTransaction>,
    invoices: Vec<StoredInvoice>,
    invoice_items: Vec<StoredInvoiceItem>,
    menus: Vec<Menu>,
    submenus: Vec<Submenu>,
}

pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

// ---
// Dados de referência
// ---

fn unit(name: &str, abbreviation: &str, unit_type: UnitType, factor: Decimal) -> Unit {
    Unit {
        id: Uuid::new_v4(),
        name: name.into(),
        abbreviation: abbreviation.into(),
        unit_type,
        factor_to_base: factor,
        is_base: factor == Decimal::ONE,
    }
}

fn plan(name: &str, description: &str, price: i64, max_restaurants: i32, max_employees: i32, premium: bool) -> SubscriptionPlan {
    SubscriptionPlan {
        id: Uuid::new_v4(),
        name: name.into(),
        description: description.into(),
        price: Decimal::from(price),
        currency: "COP".into(),
        interval: BillingCycle::Monthly,
        features: PlanFeatures {
            max_restaurants,
            max_employees,
            advanced_reporting: premium,
            priority_support: premium,
            multi_user_access: max_employees > 1,
        },
    }
}

fn role(name: &str, description: &str, map: &[(&str, &[&str])]) -> Role {
    Role {
        id: Uuid::new_v4(),
        name: name.into(),
        description: Some(description.into()),
        permissions: permission_map(map),
    }
}

fn document_type(name: &str, description: &str) -> DocumentType {
    DocumentType {
        id: Uuid::new_v4(),
        country_code: "CO".into(),
        name: name.into(),
        description: Some(description.into()),
    }
}

impl MemoryState {
    fn seeded() -> Self {
        Self {
            units: vec![
                unit("Gram", "g", UnitType::Mass, Decimal::ONE),
                unit("Kilogram", "kg", UnitType::Mass, Decimal::from(1000)),
                unit("Pound", "lb", UnitType::Mass, Decimal::new(453592, 3)),
                unit("Milliliter", "ml", UnitType::Volume, Decimal::ONE),
                unit("Liter", "l", UnitType::Volume, Decimal::from(1000)),
                unit("Unit", "und", UnitType::Unit, Decimal::ONE),
                unit("Dozen", "dozen", UnitType::Unit, Decimal::from(12)),
            ],
            document_types: vec![
                document_type("NIT", "Número de Identificación Tributaria"),
                document_type("CC", "Cédula de Ciudadanía"),
                document_type("CE", "Cédula de Extranjería"),
                document_type("PP", "Pasaporte"),
            ],
            plans: vec![
                plan("Basic", "One restaurant, essential tools", 49_900, 1, 5, false),
                plan("Pro", "Up to three restaurants with reporting", 129_900, 3, 25, true),
                plan("Enterprise", "Multi-restaurant operations", 349_900, 10, 200, true),
            ],
            roles: vec![
                role(OWNER_ROLE, "Account owner", &[("ALL", &["ALL"])]),
                role(
                    "Manager",
                    "Runs the restaurant",
                    &[
                        ("INVENTORY", &["ALL"]),
                        ("CATALOG", &["ALL"]),
                        ("MENUS", &["ALL"]),
                        ("INVOICES", &["ALL"]),
                        ("RESTAURANTS", &["VIEW", "EDIT"]),
                        ("FINANCE", &["VIEW"]),
                    ],
                ),
                role(
                    "Chef",
                    "Kitchen and recipes",
                    &[("KITCHEN", &["ALL"]), ("KDS", &["ALL"]), ("RECIPES", &["VIEW"]), ("INVENTORY", &["VIEW"])],
                ),
                role(
                    "Cashier",
                    "Cash register and payments",
                    &[("CASH", &["ALL"]), ("PAYMENTS", &["ALL"]), ("ORDERS", &["VIEW", "CREATE"])],
                ),
                role(
                    "Waiter",
                    "Tables and orders",
                    &[("ORDERS", &["VIEW", "CREATE", "EDIT"]), ("TABLES", &["VIEW", "MANAGE"])],
                ),
            ],
            ..Self::default()
        }
    }

    fn role(&self, id: Uuid) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    fn unit(&self, id: Uuid) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    fn supplier(&self, owner_id: Uuid, id: Uuid) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == id && s.owner_id == owner_id)
    }

    fn ingredient(&self, id: Uuid) -> Option<&MasterIngredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    fn active_cost(&self, ingredient: &MasterIngredient) -> Option<Decimal> {
        let item_id = ingredient.active_supplier_item_id?;
        self.supplier_items
            .iter()
            .find(|i| i.id == item_id)
            .and_then(|i| i.last_cost_base)
    }

    fn unit_abbreviation(&self, unit_id: Uuid) -> String {
        self.unit(unit_id).map(|u| u.abbreviation.clone()).unwrap_or_default()
    }

    fn stock_view(&self, stock: &IngredientStock) -> InventoryStockView {
        let ingredient = self.ingredient(stock.master_ingredient_id);
        InventoryStockView {
            id: stock.id,
            master_ingredient_id: stock.master_ingredient_id,
            ingredient_name: ingredient.map(|i| i.name.clone()).unwrap_or_default(),
            unit_abbreviation: ingredient.map(|i| self.unit_abbreviation(i.base_unit_id)).unwrap_or_default(),
            current_stock: stock.current_stock,
            min_stock: stock.min_stock,
            low_stock: stock.current_stock < stock.min_stock,
        }
    }

    fn supplier_name(&self, id: Uuid) -> Option<String> {
        self.suppliers.iter().find(|s| s.id == id).map(|s| s.name.clone())
    }

    #[allow(clippy::too_many_arguments)]
    fn record_transaction(
        &mut self,
        stock_id: Uuid,
        previous: Decimal,
        resulting: Decimal,
        reason: TransactionReason,
        invoice_id: Option<Uuid>,
        notes: Option<String>,
        created_by: Uuid,
    ) -> InventoryTransaction {
        let transaction = InventoryTransaction {
            id: Uuid::new_v4(),
            ingredient_stock_id: stock_id,
            delta: resulting - previous,
            reason,
            invoice_id,
            previous_stock: previous,
            resulting_stock: resulting,
            notes,
            created_by,
            created_at: Utc::now(),
        };
        self.transactions.push(transaction.clone());
        transaction
    }
}

impl MemoryStore {
    /// Store vazio com unidades, tipos de documento, planos e cargos padrão.
    pub fn seeded() -> Self {
        Self { state: RwLock::new(MemoryState::seeded()) }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::seeded()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn contains(haystack: &str, term: &Option<String>) -> bool {
    term.as_ref().is_none_or(|t| haystack.to_lowercase().contains(t))
}

// ---
// Usuários e cargos
// ---

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_owner_account(&self, user: NewUser, owner_role_id: Uuid) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::EmailAlreadyExists);
        }
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::UsernameAlreadyExists);
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            second_name: user.second_name,
            first_lastname: user.first_lastname,
            second_lastname: user.second_lastname,
            phone_number: user.phone_number,
            password_hash: user.password_hash,
            subscription_plan_id: user.subscription_plan_id,
            created_at: now,
            updated_at: now,
        };
        state.users.push(created.clone());
        state.user_roles.push(UserRole { user_id: created.id, restaurant_id: None, role_id: owner_role_id });
        Ok(created)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let state = self.state.read().await;
        Ok(state.roles.clone())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let state = self.state.read().await;
        Ok(state.roles.iter().find(|r| r.name.eq_ignore_ascii_case(name)).cloned())
    }

    async fn permission_entries(&self, user_id: Uuid) -> Result<Vec<PermissionEntry>, AppError> {
        let state = self.state.read().await;
        let mut entries: Vec<PermissionEntry> = state
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .filter_map(|ur| {
                state.role(ur.role_id).map(|role| PermissionEntry {
                    restaurant_id: ur.restaurant_id,
                    role: role.name.clone(),
                    permissions: role.permissions.clone(),
                })
            })
            .collect();
        // Escopo da conta primeiro
        entries.sort_by_key(|e| e.restaurant_id.is_some());
        Ok(entries)
    }

    async fn assign_role(&self, user_id: Uuid, restaurant_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match state
            .user_roles
            .iter_mut()
            .find(|ur| ur.user_id == user_id && ur.restaurant_id == Some(restaurant_id))
        {
            Some(existing) => existing.role_id = role_id,
            None => state.user_roles.push(UserRole { user_id, restaurant_id: Some(restaurant_id), role_id }),
        }
        Ok(())
    }
}

// ---
// Catálogos
// ---

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        let state = self.state.read().await;
        Ok(state.plans.clone())
    }

    async fn find_plan(&self, id: Uuid) -> Result<Option<SubscriptionPlan>, AppError> {
        let state = self.state.read().await;
        Ok(state.plans.iter().find(|p| p.id == id).cloned())
    }

    async fn list_units(&self) -> Result<Vec<Unit>, AppError> {
        let state = self.state.read().await;
        Ok(state.units.clone())
    }

    async fn find_unit(&self, id: Uuid) -> Result<Option<Unit>, AppError> {
        let state = self.state.read().await;
        Ok(state.unit(id).cloned())
    }

    async fn list_document_types(&self, country_code: Option<&str>) -> Result<Vec<DocumentType>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .document_types
            .iter()
            .filter(|d| country_code.is_none_or(|c| d.country_code == c))
            .cloned()
            .collect())
    }

    async fn find_document_type(&self, id: Uuid) -> Result<Option<DocumentType>, AppError> {
        let state = self.state.read().await;
        Ok(state.document_types.iter().find(|d| d.id == id).cloned())
    }

    async fn list_suppliers(&self, owner_id: Uuid) -> Result<Vec<Supplier>, AppError> {
        let state = self.state.read().await;
        let mut suppliers: Vec<Supplier> = state.suppliers.iter().filter(|s| s.owner_id == owner_id).cloned().collect();
        suppliers.sort_by_key(|s| s.name.to_lowercase());
        Ok(suppliers)
    }

    async fn find_supplier(&self, owner_id: Uuid, id: Uuid) -> Result<Option<Supplier>, AppError> {
        let state = self.state.read().await;
        Ok(state.supplier(owner_id, id).cloned())
    }
}

// ---
// Restaurantes
// ---

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Restaurant>, AppError> {
        let state = self.state.read().await;
        Ok(state.restaurants.iter().filter(|r| r.owner_id == owner_id).cloned().collect())
    }

    async fn create_restaurant(
        &self,
        owner_id: Uuid,
        payload: &RestaurantPayload,
        owner_role_id: Uuid,
    ) -> Result<Restaurant, AppError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let restaurant = Restaurant {
            id: Uuid::new_v4(),
            owner_id,
            name: payload.name.clone(),
            address: payload.address.clone(),
            email: payload.email.clone(),
            phone_number: payload.phone_number.clone(),
            operation_mode: payload.operation_mode,
            is_active: true,
            settings: payload.settings.clone(),
            created_at: now,
            updated_at: now,
        };
        state.restaurants.push(restaurant.clone());
        state.user_roles.push(UserRole {
            user_id: owner_id,
            restaurant_id: Some(restaurant.id),
            role_id: owner_role_id,
        });
        Ok(restaurant)
    }

    async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        let state = self.state.read().await;
        Ok(state.restaurants.iter().find(|r| r.id == id).cloned())
    }

    async fn update_restaurant(&self, id: Uuid, payload: &RestaurantPayload) -> Result<Restaurant, AppError> {
        let mut state = self.state.write().await;
        let restaurant = state
            .restaurants
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(AppError::RestaurantNotFound(id))?;
        restaurant.name = payload.name.clone();
        restaurant.address = payload.address.clone();
        restaurant.email = payload.email.clone();
        restaurant.phone_number = payload.phone_number.clone();
        restaurant.operation_mode = payload.operation_mode;
        restaurant.settings = payload.settings.clone();
        restaurant.updated_at = Utc::now();
        Ok(restaurant.clone())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RestaurantWithRole>, AppError> {
        let state = self.state.read().await;
        let mut result: Vec<RestaurantWithRole> = state
            .user_roles
            .iter()
            .filter(|ur| ur.user_id == user_id)
            .filter_map(|ur| {
                let restaurant_id = ur.restaurant_id?;
                let restaurant = state.restaurants.iter().find(|r| r.id == restaurant_id)?;
                let role = state.role(ur.role_id)?;
                Some(RestaurantWithRole { restaurant: restaurant.clone(), role: role.name.clone() })
            })
            .collect();
        result.sort_by_key(|r| r.restaurant.name.to_lowercase());
        Ok(result)
    }
}

// ---
// Ingredientes
// ---

#[async_trait]
impl IngredientStore for MemoryStore {
    async fn create_ingredient(&self, new: NewIngredient) -> Result<IngredientResponse, AppError> {
        let mut state = self.state.write().await;
        if state
            .ingredients
            .iter()
            .any(|i| i.owner_id == new.owner_id && same_name(&i.name, &new.name))
        {
            return Err(AppError::IngredientAlreadyExists(new.name));
        }

        let supplier_id = match new.supplier {
            SupplierRef::Existing(id) => {
                state.supplier(new.owner_id, id).ok_or(AppError::SupplierNotFound(id))?;
                id
            }
            SupplierRef::New { name, document_type_id, document_number } => {
                let supplier = Supplier {
                    id: Uuid::new_v4(),
                    owner_id: new.owner_id,
                    name,
                    document_type_id,
                    document_number,
                    contact_name: None,
                    email: None,
                    phone: None,
                    address: None,
                    is_active: true,
                };
                let id = supplier.id;
                state.suppliers.push(supplier);
                id
            }
        };

        let ingredient_id = Uuid::new_v4();
        let item = SupplierItem {
            id: Uuid::new_v4(),
            supplier_id,
            master_ingredient_id: ingredient_id,
            brand_name: new.brand_name,
            purchase_unit_name: new.purchase_unit_name,
            conversion_factor: new.conversion_factor,
            last_cost_base: new.last_cost_base,
        };
        state.ingredients.push(MasterIngredient {
            id: ingredient_id,
            owner_id: new.owner_id,
            name: new.name.clone(),
            base_unit_id: new.base_unit_id,
            active_supplier_item_id: Some(item.id),
            created_at: Utc::now(),
        });
        state.supplier_items.push(item.clone());

        Ok(IngredientResponse {
            id: ingredient_id,
            name: new.name,
            base_unit_id: new.base_unit_id,
            active_supplier_item_id: item.id,
            supplier_item: item,
        })
    }

    async fn find_ingredient(&self, owner_id: Uuid, id: Uuid) -> Result<Option<MasterIngredient>, AppError> {
        let state = self.state.read().await;
        Ok(state.ingredient(id).filter(|i| i.owner_id == owner_id).cloned())
    }

    async fn list_ingredients(
        &self,
        owner_id: Uuid,
        query: &PageQuery,
        filter: &IngredientFilter,
    ) -> Result<Page<IngredientListItem>, AppError> {
        let state = self.state.read().await;
        let search = query.search_term();
        let units = filter.unit_list();

        let mut items: Vec<IngredientListItem> = state
            .ingredients
            .iter()
            .filter(|i| i.owner_id == owner_id && contains(&i.name, &search))
            .map(|i| IngredientListItem {
                id: i.id,
                name: i.name.clone(),
                unit_abbreviation: state.unit_abbreviation(i.base_unit_id),
                cost_per_base_unit: state.active_cost(i),
                cost_per_base_unit_display: String::new(),
            })
            .filter(|i| units.is_empty() || units.contains(&i.unit_abbreviation.to_lowercase()))
            .collect();

        match IngredientSort::parse(query.sort_by.as_deref()) {
            IngredientSort::Name => items.sort_by_key(|i| i.name.to_lowercase()),
            IngredientSort::Unit => items.sort_by(|a, b| {
                a.unit_abbreviation.cmp(&b.unit_abbreviation).then_with(|| a.name.cmp(&b.name))
            }),
            IngredientSort::Cost => items.sort_by_key(|i| i.cost_per_base_unit),
        }
        if query.descending() {
            items.reverse();
        }
        Ok(Page::slice(items, query))
    }

    async fn ingredient_detail(&self, owner_id: Uuid, id: Uuid) -> Result<Option<IngredientDetail>, AppError> {
        let state = self.state.read().await;
        let Some(ingredient) = state.ingredient(id).filter(|i| i.owner_id == owner_id) else {
            return Ok(None);
        };
        let unit = state.unit(ingredient.base_unit_id);

        let active_supplier = ingredient
            .active_supplier_item_id
            .and_then(|item_id| state.supplier_items.iter().find(|i| i.id == item_id))
            .and_then(|item| {
                let supplier = state.suppliers.iter().find(|s| s.id == item.supplier_id)?;
                Some(ActiveSupplierInfo {
                    supplier_id: supplier.id,
                    supplier_name: supplier.name.clone(),
                    supplier_item_id: item.id,
                    brand_name: item.brand_name.clone(),
                    purchase_unit_name: item.purchase_unit_name.clone(),
                    conversion_factor: item.conversion_factor,
                    last_cost_base: item.last_cost_base,
                })
            });

        Ok(Some(IngredientDetail {
            id: ingredient.id,
            name: ingredient.name.clone(),
            base_unit_id: ingredient.base_unit_id,
            unit_name: unit.map(|u| u.name.clone()).unwrap_or_default(),
            unit_abbreviation: unit.map(|u| u.abbreviation.clone()).unwrap_or_default(),
            cost_per_base_unit: state.active_cost(ingredient),
            cost_per_base_unit_display: String::new(),
            active_supplier,
        }))
    }

    async fn supplier_items_for_invoice(
        &self,
        owner_id: Uuid,
        supplier_id: Uuid,
    ) -> Result<Vec<SupplierItemForInvoice>, AppError> {
        let state = self.state.read().await;
        if state.supplier(owner_id, supplier_id).is_none() {
            return Ok(Vec::new());
        }

        let mut items: Vec<SupplierItemForInvoice> = state
            .supplier_items
            .iter()
            .filter(|i| i.supplier_id == supplier_id)
            .filter_map(|item| {
                let ingredient = state.ingredient(item.master_ingredient_id)?;
                Some(SupplierItemForInvoice {
                    id: item.id,
                    brand_name: item.brand_name.clone(),
                    purchase_unit_name: item.purchase_unit_name.clone(),
                    conversion_factor: item.conversion_factor,
                    last_cost_base: item.last_cost_base,
                    master_ingredient_id: ingredient.id,
                    ingredient_name: ingredient.name.clone(),
                    base_unit_abbreviation: state.unit_abbreviation(ingredient.base_unit_id),
                    suggested_unit_price: None,
                    suggested_unit_price_display: String::new(),
                })
            })
            .collect();
        items.sort_by_key(|i| i.ingredient_name.to_lowercase());
        Ok(items)
    }
}

// ---
// Estoque
// ---

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn activate(
        &self,
        restaurant_id: Uuid,
        master_ingredient_id: Uuid,
        initial_stock: Decimal,
        min_stock: Decimal,
        user_id: Uuid,
    ) -> Result<InventoryStockView, AppError> {
        let mut state = self.state.write().await;
        if state
            .stocks
            .iter()
            .any(|s| s.restaurant_id == restaurant_id && s.master_ingredient_id == master_ingredient_id)
        {
            return Err(AppError::IngredientAlreadyActivated);
        }

        let stock = IngredientStock {
            id: Uuid::new_v4(),
            restaurant_id,
            master_ingredient_id,
            current_stock: initial_stock,
            min_stock,
            updated_at: Utc::now(),
        };
        state.stocks.push(stock.clone());
        state.record_transaction(
            stock.id,
            Decimal::ZERO,
            initial_stock,
            TransactionReason::Initial,
            None,
            None,
            user_id,
        );
        Ok(state.stock_view(&stock))
    }

    async fn list_stock(
        &self,
        restaurant_id: Uuid,
        query: &PageQuery,
        filter: &InventoryFilter,
    ) -> Result<Page<InventoryStockView>, AppError> {
        let state = self.state.read().await;
        let search = query.search_term();

        let mut rows: Vec<InventoryStockView> = state
            .stocks
            .iter()
            .filter(|s| s.restaurant_id == restaurant_id)
            .map(|s| state.stock_view(s))
            .filter(|v| contains(&v.ingredient_name, &search))
            .filter(|v| filter.low_stock.is_none_or(|low| v.low_stock == low))
            .collect();

        match InventorySort::parse(query.sort_by.as_deref()) {
            InventorySort::Name => rows.sort_by_key(|r| r.ingredient_name.to_lowercase()),
            InventorySort::Stock => rows.sort_by_key(|r| r.current_stock),
            InventorySort::MinStock => rows.sort_by_key(|r| r.min_stock),
        }
        if query.descending() {
            rows.reverse();
        }
        Ok(Page::slice(rows, query))
    }

    async fn list_available(&self, restaurant_id: Uuid, owner_id: Uuid) -> Result<Vec<AvailableIngredient>, AppError> {
        let state = self.state.read().await;
        let mut available: Vec<AvailableIngredient> = state
            .ingredients
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .filter(|i| {
                !state
                    .stocks
                    .iter()
                    .any(|s| s.restaurant_id == restaurant_id && s.master_ingredient_id == i.id)
            })
            .map(|i| AvailableIngredient {
                id: i.id,
                name: i.name.clone(),
                unit_abbreviation: state.unit_abbreviation(i.base_unit_id),
            })
            .collect();
        available.sort_by_key(|i| i.name.to_lowercase());
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
        let mut state = self.state.write().await;
        let stock = state
            .stocks
            .iter_mut()
            .find(|s| s.id == stock_id && s.restaurant_id == restaurant_id)
            .ok_or(AppError::IngredientStockNotFound(stock_id))?;

        let outcome = apply(stock.current_stock)?;
        stock.current_stock = outcome.resulting_stock;
        stock.updated_at = Utc::now();

        Ok(state.record_transaction(
            stock_id,
            outcome.previous_stock,
            outcome.resulting_stock,
            adjustment.reason,
            None,
            adjustment.notes.clone(),
            user_id,
        ))
    }

    async fn list_transactions(
        &self,
        restaurant_id: Uuid,
        stock_id: Uuid,
        query: &PageQuery,
    ) -> Result<Page<InventoryTransaction>, AppError> {
        let state = self.state.read().await;
        if !state.stocks.iter().any(|s| s.id == stock_id && s.restaurant_id == restaurant_id) {
            return Err(AppError::IngredientStockNotFound(stock_id));
        }
        // Mais recentes primeiro
        let history: Vec<InventoryTransaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.ingredient_stock_id == stock_id)
            .cloned()
            .collect();
        Ok(Page::slice(history, query))
    }
}

// ---
// Faturas
// ---

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn register_invoice(&self, invoice: NewInvoice) -> Result<Uuid, AppError> {
        let mut state = self.state.write().await;
        if state.invoices.iter().any(|i| {
            i.restaurant_id == invoice.restaurant_id
                && i.supplier_id == invoice.supplier_id
                && i.supplier_invoice_number == invoice.supplier_invoice_number
        }) {
            return Err(AppError::InvoiceAlreadyExists(invoice.supplier_invoice_number));
        }

        // 1. Resolve tudo antes de gravar: itens do fornecedor e saldos finais
        let mut planned: Vec<(usize, Option<usize>, Decimal, Decimal)> = Vec::with_capacity(invoice.items.len());
        let mut running: HashMap<Uuid, Decimal> = HashMap::new();
        for item in &invoice.items {
            let supplier_index = state
                .supplier_items
                .iter()
                .position(|s| s.id == item.supplier_item_id)
                .ok_or(AppError::SupplierItemNotFound(item.supplier_item_id))?;
            let stock_index = state.stocks.iter().position(|s| {
                s.restaurant_id == invoice.restaurant_id && s.master_ingredient_id == item.master_ingredient_id
            });

            let previous = match running.get(&item.master_ingredient_id) {
                Some(value) => *value,
                None => stock_index.map_or(Decimal::ZERO, |i| state.stocks[i].current_stock),
            };
            let resulting = previous.checked_add(item.base_quantity).ok_or(AppError::InvalidAmount)?;
            running.insert(item.master_ingredient_id, resulting);
            planned.push((supplier_index, stock_index, previous, resulting));
        }

        // 2. Gravação, sem mais pontos de falha
        let invoice_id = Uuid::new_v4();
        for (item, (supplier_index, stock_index, previous, resulting)) in invoice.items.iter().zip(planned) {
            state.supplier_items[supplier_index].last_cost_base = Some(item.cost_per_base_unit);

            // Saldo: ativa na hora se o ingrediente ainda não está no restaurante
            let index = match stock_index.or_else(|| {
                state.stocks.iter().position(|s| {
                    s.restaurant_id == invoice.restaurant_id && s.master_ingredient_id == item.master_ingredient_id
                })
            }) {
                Some(index) => index,
                None => {
                    state.stocks.push(IngredientStock {
                        id: Uuid::new_v4(),
                        restaurant_id: invoice.restaurant_id,
                        master_ingredient_id: item.master_ingredient_id,
                        current_stock: Decimal::ZERO,
                        min_stock: Decimal::ZERO,
                        updated_at: Utc::now(),
                    });
                    state.stocks.len() - 1
                }
            };
            let stock = &mut state.stocks[index];
            stock.current_stock = resulting;
            stock.updated_at = Utc::now();
            let stock_id = stock.id;

            state.record_transaction(
                stock_id,
                previous,
                resulting,
                TransactionReason::Purchase,
                Some(invoice_id),
                Some(PURCHASE_NOTE.to_string()),
                invoice.created_by,
            );
            state.invoice_items.push(StoredInvoiceItem { id: Uuid::new_v4(), invoice_id, item: item.clone() });
        }

        state.invoices.push(StoredInvoice {
            id: invoice_id,
            restaurant_id: invoice.restaurant_id,
            supplier_id: invoice.supplier_id,
            supplier_invoice_number: invoice.supplier_invoice_number,
            emission_date: invoice.emission_date,
            received_at: Utc::now(),
            subtotal: invoice.subtotal,
            total_tax: invoice.total_tax,
            total_amount: invoice.total_amount,
            notes: invoice.notes,
        });
        Ok(invoice_id)
    }

    async fn list_invoices(&self, restaurant_id: Uuid, query: &PageQuery) -> Result<Page<InvoiceSummary>, AppError> {
        let state = self.state.read().await;
        let search = query.search_term();

        let mut rows: Vec<InvoiceSummary> = state
            .invoices
            .iter()
            .filter(|i| i.restaurant_id == restaurant_id)
            .map(|i| InvoiceSummary {
                id: i.id,
                supplier_name: state.supplier_name(i.supplier_id),
                supplier_invoice_number: i.supplier_invoice_number.clone(),
                emission_date: i.emission_date,
                received_at: i.received_at,
                total_amount: i.total_amount,
                item_count: state.invoice_items.iter().filter(|it| it.invoice_id == i.id).count() as i64,
                status: InvoiceStatus::Completed,
            })
            .filter(|s| {
                search.is_none()
                    || contains(&s.supplier_invoice_number, &search)
                    || s.supplier_name.as_deref().is_some_and(|n| contains(n, &search))
            })
            .collect();
        rows.sort_by(|a, b| b.emission_date.cmp(&a.emission_date).then(b.received_at.cmp(&a.received_at)));
        Ok(Page::slice(rows, query))
    }

    async fn invoice_detail(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<InvoiceDetail>, AppError> {
        let state = self.state.read().await;
        let Some(invoice) = state.invoices.iter().find(|i| i.id == id && i.restaurant_id == restaurant_id) else {
            return Ok(None);
        };

        let items = state
            .invoice_items
            .iter()
            .filter(|it| it.invoice_id == id)
            .map(|stored| {
                let item = &stored.item;
                let supplier_item = state.supplier_items.iter().find(|s| s.id == item.supplier_item_id);
                let ingredient = state.ingredient(item.master_ingredient_id);
                InvoiceItemDetail {
                    id: stored.id,
                    ingredient_name: ingredient.map(|i| i.name.clone()).unwrap_or_default(),
                    purchase_unit_name: supplier_item.map(|s| s.purchase_unit_name.clone()).unwrap_or_default(),
                    conversion_factor_used: item.conversion_factor_used,
                    base_unit_abbreviation: ingredient
                        .map(|i| state.unit_abbreviation(i.base_unit_id))
                        .unwrap_or_default(),
                    quantity_purchased: item.quantity_purchased,
                    unit_price_purchased: item.unit_price_purchased,
                    tax_percentage: item.tax_percentage,
                    subtotal: item.subtotal,
                    tax_amount: item.tax_amount,
                    cost_per_base_unit: item.cost_per_base_unit,
                }
            })
            .collect();

        Ok(Some(InvoiceDetail {
            id: invoice.id,
            supplier_name: state.supplier_name(invoice.supplier_id).unwrap_or_default(),
            supplier_invoice_number: invoice.supplier_invoice_number.clone(),
            emission_date: invoice.emission_date,
            received_at: invoice.received_at,
            subtotal: invoice.subtotal,
            total_tax: invoice.total_tax,
            total_amount: invoice.total_amount,
            notes: invoice.notes.clone(),
            status: InvoiceStatus::Completed,
            items,
        }))
    }
}

// ---
// Menus
// ---

#[async_trait]
impl MenuStore for MemoryStore {
    async fn list_menus(&self, restaurant_id: Uuid) -> Result<Vec<MenuResponse>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .menus
            .iter()
            .filter(|m| m.restaurant_id == restaurant_id)
            .map(|menu| {
                let mut submenus: Vec<Submenu> =
                    state.submenus.iter().filter(|s| s.menu_id == menu.id).cloned().collect();
                submenus.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
                MenuResponse { menu: menu.clone(), submenus }
            })
            .collect())
    }

    async fn find_menu(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Menu>, AppError> {
        let state = self.state.read().await;
        Ok(state.menus.iter().find(|m| m.id == id && m.restaurant_id == restaurant_id).cloned())
    }

    async fn create_menu(&self, restaurant_id: Uuid, name: &str, description: Option<&str>) -> Result<Menu, AppError> {
        let mut state = self.state.write().await;
        if state.menus.iter().any(|m| m.restaurant_id == restaurant_id && same_name(&m.name, name)) {
            return Err(AppError::MenuAlreadyExists(name.to_string()));
        }
        let now = Utc::now();
        let menu = Menu {
            id: Uuid::new_v4(),
            restaurant_id,
            name: name.to_string(),
            description: description.map(String::from),
            created_at: now,
            updated_at: now,
        };
        state.menus.push(menu.clone());
        Ok(menu)
    }

    async fn update_menu(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Menu, AppError> {
        let mut state = self.state.write().await;
        if state
            .menus
            .iter()
            .any(|m| m.restaurant_id == restaurant_id && m.id != id && same_name(&m.name, name))
        {
            return Err(AppError::MenuAlreadyExists(name.to_string()));
        }
        let menu = state
            .menus
            .iter_mut()
            .find(|m| m.id == id && m.restaurant_id == restaurant_id)
            .ok_or(AppError::MenuNotFound(id))?;
        menu.name = name.to_string();
        menu.description = description.map(String::from);
        menu.updated_at = Utc::now();
        Ok(menu.clone())
    }

    async fn delete_menu(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let before = state.menus.len();
        state.menus.retain(|m| !(m.id == id && m.restaurant_id == restaurant_id));
        if state.menus.len() == before {
            return Err(AppError::MenuNotFound(id));
        }
        state.submenus.retain(|s| s.menu_id != id);
        Ok(())
    }

    async fn create_submenu(
        &self,
        menu_id: Uuid,
        name: &str,
        description: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<Submenu, AppError> {
        let mut state = self.state.write().await;
        let siblings: Vec<&Submenu> = state.submenus.iter().filter(|s| s.menu_id == menu_id).collect();
        if siblings.iter().any(|s| same_name(&s.name, name)) {
            return Err(AppError::SubmenuAlreadyExists(name.to_string()));
        }
        let next = siblings.iter().map(|s| s.sort_order + 1).max().unwrap_or(0);

        let now = Utc::now();
        let submenu = Submenu {
            id: Uuid::new_v4(),
            menu_id,
            name: name.to_string(),
            description: description.map(String::from),
            sort_order: sort_order.unwrap_or(next),
            created_at: now,
            updated_at: now,
        };
        state.submenus.push(submenu.clone());
        Ok(submenu)
    }

    async fn update_submenu(
        &self,
        menu_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<Submenu, AppError> {
        let mut state = self.state.write().await;
        if state
            .submenus
            .iter()
            .any(|s| s.menu_id == menu_id && s.id != id && same_name(&s.name, name))
        {
            return Err(AppError::SubmenuAlreadyExists(name.to_string()));
        }
        let submenu = state
            .submenus
            .iter_mut()
            .find(|s| s.id == id && s.menu_id == menu_id)
            .ok_or(AppError::SubmenuNotFound(id))?;
        submenu.name = name.to_string();
        submenu.description = description.map(String::from);
        if let Some(order) = sort_order {
            submenu.sort_order = order;
        }
        submenu.updated_at = Utc::now();
        Ok(submenu.clone())
    }

    async fn delete_submenu(&self, menu_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        let before = state.submenus.len();
        state.submenus.retain(|s| !(s.id == id && s.menu_id == menu_id));
        if state.submenus.len() == before {
            return Err(AppError::SubmenuNotFound(id));
        }
        Ok(())
    }
}

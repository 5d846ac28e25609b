// src/models/rbac.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;
use validator::Validate;

/// Grupo -> operações permitidas. `"ALL"` vale como curinga nos dois níveis.
pub type PermissionMap = BTreeMap<String, BTreeSet<String>>;

pub const WILDCARD: &str = "ALL";
pub const OWNER_ROLE: &str = "Owner";

/// Monta um mapa a partir de pares literais.
pub fn permission_map(entries: &[(&str, &[&str])]) -> PermissionMap {
    entries
        .iter()
        .map(|(group, ops)| {
            (
                group.to_string(),
                ops.iter().map(|op| op.to_string()).collect(),
            )
        })
        .collect()
}

// ---
// Catálogo de grupos e operações
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionModule {
    Kds,
    Cash,
    Orders,
    Tables,
    Catalog,
    Finance,
    Kitchen,
    Recipes,
    Payments,
    Inventory,
    Operations,
    Restaurants,
    Subscription,
    Menus,
    Invoices,
}

impl PermissionModule {
    pub const ALL: [PermissionModule; 15] = [
        Self::Kds,
        Self::Cash,
        Self::Orders,
        Self::Tables,
        Self::Catalog,
        Self::Finance,
        Self::Kitchen,
        Self::Recipes,
        Self::Payments,
        Self::Inventory,
        Self::Operations,
        Self::Restaurants,
        Self::Subscription,
        Self::Menus,
        Self::Invoices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kds => "KDS",
            Self::Cash => "CASH",
            Self::Orders => "ORDERS",
            Self::Tables => "TABLES",
            Self::Catalog => "CATALOG",
            Self::Finance => "FINANCE",
            Self::Kitchen => "KITCHEN",
            Self::Recipes => "RECIPES",
            Self::Payments => "PAYMENTS",
            Self::Inventory => "INVENTORY",
            Self::Operations => "OPERATIONS",
            Self::Restaurants => "RESTAURANTS",
            Self::Subscription => "SUBSCRIPTION",
            Self::Menus => "MENUS",
            Self::Invoices => "INVOICES",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionAction {
    View,
    ViewAll,
    Create,
    Edit,
    Delete,
    Manage,
    Open,
    Close,
    Void,
    Comment,
    Process,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 11] = [
        Self::View,
        Self::ViewAll,
        Self::Create,
        Self::Edit,
        Self::Delete,
        Self::Manage,
        Self::Open,
        Self::Close,
        Self::Void,
        Self::Comment,
        Self::Process,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::ViewAll => "VIEW_ALL",
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
            Self::Manage => "MANAGE",
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Void => "VOID",
            Self::Comment => "COMMENT",
            Self::Process => "PROCESS",
        }
    }
}

// ---
// Persistência
// ---

// Tabela roles. O mapa de permissões fica em JSONB.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(json)]
    pub permissions: PermissionMap,
}

/// Um cargo do usuário em um escopo. `restaurant_id = None` é o escopo da conta (dono).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEntry {
    pub restaurant_id: Option<Uuid>,
    pub role: String,
    #[sqlx(json)]
    pub permissions: PermissionMap,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCatalog {
    pub modules: Vec<PermissionModule>,
    pub actions: Vec<PermissionAction>,
    pub wildcard: &'static str,
}

// Payload para atribuir um cargo a um usuário em um restaurante
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolePayload {
    #[validate(email(message = "The email is invalid."))]
    pub email: String,
    #[validate(length(min = 1, message = "Role name is required."))]
    pub role_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub role: String,
}

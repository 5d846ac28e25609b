// src/models/menu.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::validate_trimmed_name;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Submenu {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    #[serde(flatten)]
    pub menu: Menu,
    pub submenus: Vec<Submenu>,
}

// Usado tanto na criação quanto na edição
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuPayload {
    #[validate(custom(function = "validate_trimmed_name"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmenuPayload {
    #[validate(custom(function = "validate_trimmed_name"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Sort order cannot be negative."))]
    pub sort_order: Option<i32>,
}

/// Nome sem espaços nas pontas e descrição vazia como None.
pub fn normalize_text(name: &str, description: Option<&str>) -> (String, Option<String>) {
    (
        name.trim().to_string(),
        description.map(str::trim).filter(|d| !d.is_empty()).map(String::from),
    )
}

// src/models/unit.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dimensão da unidade. Cada dimensão tem exatamente uma unidade base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unit_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
    Mass,
    Volume,
    Unit,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mass => "MASS",
            Self::Volume => "VOLUME",
            Self::Unit => "UNIT",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    #[sqlx(rename = "unit_type")]
    #[serde(rename = "type")]
    pub unit_type: UnitType,
    pub factor_to_base: Decimal,
    pub is_base: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub id: Uuid,
    pub country_code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeQuery {
    pub country_code: Option<String>,
}

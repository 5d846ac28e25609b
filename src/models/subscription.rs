// src/models/subscription.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_cycle", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

// Guardado em JSONB; as chaves seguem o formato snake_case que o dashboard espera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFeatures {
    pub max_restaurants: i32,
    pub max_employees: i32,
    pub advanced_reporting: bool,
    pub priority_support: bool,
    pub multi_user_access: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub interval: BillingCycle,
    #[sqlx(json)]
    pub features: PlanFeatures,
}

// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::{
        error::ApiError,
        response::{ApiResponse, PageQuery},
    },
    config::AppState,
    handlers::{no_extra_rules, validate_payload},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        json::JsonBody,
        rbac::{PermInventoryCreate, PermInventoryEdit, PermInventoryView, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::inventory::{ActivateIngredientPayload, AdjustStockPayload, InventoryFilter},
};

// POST /api/restaurants/{restaurant_id}/inventory/activate
pub async fn activate_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInventoryCreate>,
    RestaurantContext(restaurant): RestaurantContext,
    JsonBody(payload): JsonBody<ActivateIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let stock = app_state
        .inventory_service
        .activate(restaurant.id, restaurant.owner_id, user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(stock))
}

// GET /api/restaurants/{restaurant_id}/inventory?search=&sortBy=stock&lowStock=true
pub async fn list_inventory(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryView>,
    RestaurantContext(restaurant): RestaurantContext,
    Query(page): Query<PageQuery>,
    Query(filter): Query<InventoryFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let stock = app_state
        .inventory_service
        .list_stock(restaurant.id, &page, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(stock))
}

// GET /api/restaurants/{restaurant_id}/inventory/available
// Ingredientes da conta que ainda não foram ativados neste restaurante
pub async fn list_available_ingredients(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryView>,
    RestaurantContext(restaurant): RestaurantContext,
) -> Result<impl IntoResponse, ApiError> {
    let available = app_state
        .inventory_service
        .list_available(restaurant.id, restaurant.owner_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(available))
}

// PUT /api/restaurants/{restaurant_id}/inventory/{stock_id}/adjust
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInventoryEdit>,
    Path((restaurant_id, stock_id)): Path<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<AdjustStockPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let transaction = app_state
        .inventory_service
        .adjust(restaurant_id, stock_id, user.id, payload.into())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(transaction))
}

// GET /api/restaurants/{restaurant_id}/inventory/{stock_id}/transactions
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInventoryView>,
    Path((restaurant_id, stock_id)): Path<(Uuid, Uuid)>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = app_state
        .inventory_service
        .transactions(restaurant_id, stock_id, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(transactions))
}

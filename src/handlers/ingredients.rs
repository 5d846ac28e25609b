// src/handlers/ingredients.rs

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
    handlers::validate_payload,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        json::JsonBody,
        rbac::{PermInventoryCreate, PermInventoryView, RequirePermission},
    },
    models::ingredient::{CreateIngredientPayload, IngredientFilter},
};

// POST /api/ingredients
// Ingrediente mestre + fornecedor (existente ou novo) + primeiro item do fornecedor
pub async fn create_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInventoryCreate>,
    JsonBody(payload): JsonBody<CreateIngredientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, CreateIngredientPayload::validate_consistency, &locale, &app_state)?;

    let ingredient = app_state
        .ingredient_service
        .create(user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(ingredient))
}

// GET /api/ingredients?page=0&size=10&search=arr&sortBy=cost&sortDesc=true&units=kg,g
pub async fn list_ingredients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInventoryView>,
    Query(page): Query<PageQuery>,
    Query(filter): Query<IngredientFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredients = app_state
        .ingredient_service
        .list(user.id, &page, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(ingredients))
}

// GET /api/ingredients/{ingredient_id}
pub async fn get_ingredient(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInventoryView>,
    Path(ingredient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let ingredient = app_state
        .ingredient_service
        .detail(user.id, ingredient_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(ingredient))
}

// src/handlers/menus.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, response::ApiResponse},
    config::AppState,
    handlers::{no_extra_rules, validate_payload},
    middleware::{
        i18n::Locale,
        json::JsonBody,
        rbac::{PermMenusCreate, PermMenusDelete, PermMenusEdit, PermMenusView, RequirePermission},
    },
    models::menu::{MenuPayload, SubmenuPayload},
};

// GET /api/restaurants/{restaurant_id}/menus
pub async fn list_menus(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusView>,
    Path(restaurant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let menus = app_state
        .menu_service
        .list(restaurant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(menus))
}

// POST /api/restaurants/{restaurant_id}/menus
pub async fn create_menu(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusCreate>,
    Path(restaurant_id): Path<Uuid>,
    JsonBody(payload): JsonBody<MenuPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let menu = app_state
        .menu_service
        .create(restaurant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(menu))
}

// PUT /api/restaurants/{restaurant_id}/menus/{menu_id}
pub async fn update_menu(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusEdit>,
    Path((restaurant_id, menu_id)): Path<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<MenuPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let menu = app_state
        .menu_service
        .update(restaurant_id, menu_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(menu))
}

// DELETE /api/restaurants/{restaurant_id}/menus/{menu_id}
pub async fn delete_menu(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusDelete>,
    Path((restaurant_id, menu_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .menu_service
        .delete(restaurant_id, menu_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(()))
}

// POST /api/restaurants/{restaurant_id}/menus/{menu_id}/submenus
pub async fn create_submenu(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusCreate>,
    Path((restaurant_id, menu_id)): Path<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<SubmenuPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let submenu = app_state
        .menu_service
        .create_submenu(restaurant_id, menu_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(submenu))
}

// PUT /api/restaurants/{restaurant_id}/menus/{menu_id}/submenus/{submenu_id}
pub async fn update_submenu(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusEdit>,
    Path((restaurant_id, menu_id, submenu_id)): Path<(Uuid, Uuid, Uuid)>,
    JsonBody(payload): JsonBody<SubmenuPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let submenu = app_state
        .menu_service
        .update_submenu(restaurant_id, menu_id, submenu_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(submenu))
}

// DELETE /api/restaurants/{restaurant_id}/menus/{menu_id}/submenus/{submenu_id}
pub async fn delete_submenu(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMenusDelete>,
    Path((restaurant_id, menu_id, submenu_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .menu_service
        .delete_submenu(restaurant_id, menu_id, submenu_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(()))
}

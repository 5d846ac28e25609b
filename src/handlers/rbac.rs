// src/handlers/rbac.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        json::JsonBody,
        rbac::{PermRestaurantsManage, RequirePermission},
    },
    models::rbac::AssignRolePayload,
};

// GET /api/roles
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .rbac_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(roles))
}

// GET /api/roles/permissions (Para o frontend saber o que mostrar na tela de cargos)
pub async fn list_permissions(State(app_state): State<AppState>) -> impl IntoResponse {
    ApiResponse::ok(app_state.rbac_service.catalog())
}

// POST /api/restaurants/{restaurant_id}/members
pub async fn assign_member(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRestaurantsManage>,
    Path(restaurant_id): Path<Uuid>,
    JsonBody(payload): JsonBody<AssignRolePayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let member = app_state
        .rbac_service
        .assign_member(restaurant_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(member))
}

// GET /api/restaurants/{restaurant_id}/my-permissions
// Entrada efetiva: a do restaurante, senão a de dono
pub async fn my_restaurant_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(restaurant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = app_state
        .rbac_service
        .restaurant_permissions(user.id, restaurant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(entry))
}

// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::{error::ApiError, response::ApiResponse},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermInventoryView, RequirePermission},
    },
    models::unit::DocumentTypeQuery,
};

// GET /api/subscriptions/plans (pública, usada no cadastro)
pub async fn list_plans(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .catalog_service
        .plans()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(plans))
}

// GET /api/subscriptions/plans/{plan_id}
pub async fn get_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .catalog_service
        .plan(plan_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(plan))
}

// GET /api/units
pub async fn list_units(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let units = app_state
        .catalog_service
        .units()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(units))
}

// GET /api/document-types?countryCode=CO
pub async fn list_document_types(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DocumentTypeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let document_types = app_state
        .catalog_service
        .document_types(query.country_code.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(document_types))
}

// GET /api/suppliers (fornecedores da conta)
pub async fn list_suppliers(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInventoryView>,
) -> Result<impl IntoResponse, ApiError> {
    let suppliers = app_state
        .catalog_service
        .suppliers(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(suppliers))
}

// src/handlers/invoices.rs

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
        rbac::{PermInvoicesCreate, PermInvoicesView, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::invoice::RegisterInvoicePayload,
};

// POST /api/restaurants/{restaurant_id}/invoices/preview
// Calcula totais e alertas de preço sem gravar nada
pub async fn preview_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesCreate>,
    RestaurantContext(restaurant): RestaurantContext,
    JsonBody(payload): JsonBody<RegisterInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, RegisterInvoicePayload::validate_consistency, &locale, &app_state)?;

    let preview = app_state
        .invoice_service
        .preview(&restaurant, &payload, &locale, &app_state.i18n_store)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(preview))
}

// POST /api/restaurants/{restaurant_id}/invoices
pub async fn register_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermInvoicesCreate>,
    RestaurantContext(restaurant): RestaurantContext,
    JsonBody(payload): JsonBody<RegisterInvoicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, RegisterInvoicePayload::validate_consistency, &locale, &app_state)?;

    let invoice = app_state
        .invoice_service
        .register(&restaurant, user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(invoice))
}

// GET /api/restaurants/{restaurant_id}/invoices?search=
pub async fn list_invoices(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesView>,
    RestaurantContext(restaurant): RestaurantContext,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let invoices = app_state
        .invoice_service
        .list(restaurant.id, &page)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(invoices))
}

// GET /api/restaurants/{restaurant_id}/invoices/{invoice_id}
pub async fn get_invoice(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesView>,
    Path((restaurant_id, invoice_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let invoice = app_state
        .invoice_service
        .detail(restaurant_id, invoice_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(invoice))
}

// GET /api/restaurants/{restaurant_id}/suppliers/{supplier_id}/items
// Itens do fornecedor para montar a fatura, com preço sugerido
pub async fn list_supplier_items(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermInvoicesCreate>,
    RestaurantContext(restaurant): RestaurantContext,
    Path((_, supplier_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .ingredient_service
        .supplier_items_for_invoice(restaurant.owner_id, supplier_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(items))
}

// src/handlers/restaurants.rs

use axum::{extract::State, response::IntoResponse};

use crate::{
    common::{error::ApiError, response::ApiResponse},
    config::AppState,
    handlers::validate_payload,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        json::JsonBody,
        rbac::{PermRestaurantsCreate, PermRestaurantsEdit, RequirePermission},
        tenancy::RestaurantContext,
    },
    models::restaurant::RestaurantPayload,
};

// POST /api/restaurants
pub async fn create_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermRestaurantsCreate>,
    JsonBody(payload): JsonBody<RestaurantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, RestaurantPayload::validate_consistency, &locale, &app_state)?;

    let restaurant = app_state
        .restaurant_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(restaurant))
}

// GET /api/restaurants/my-restaurants
pub async fn my_restaurants(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let restaurants = app_state
        .restaurant_service
        .my_restaurants(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(restaurants))
}

// GET /api/restaurants/{restaurant_id}
// Basta ter alguma entrada válida para o restaurante
pub async fn get_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    RestaurantContext(restaurant): RestaurantContext,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .rbac_service
        .restaurant_permissions(user.id, restaurant.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(restaurant))
}

// PUT /api/restaurants/{restaurant_id}
pub async fn update_restaurant(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermRestaurantsEdit>,
    RestaurantContext(restaurant): RestaurantContext,
    JsonBody(payload): JsonBody<RestaurantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, RestaurantPayload::validate_consistency, &locale, &app_state)?;

    let updated = app_state
        .restaurant_service
        .update(&restaurant, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!("✏️ Restaurante {} atualizado", updated.id);
    Ok(ApiResponse::ok(updated))
}

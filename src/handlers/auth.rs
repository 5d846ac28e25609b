// src/handlers/auth.rs

use axum::{extract::State, response::IntoResponse};

use crate::{
    common::{error::ApiError, response::ApiResponse},
    config::AppState,
    handlers::{no_extra_rules, validate_payload},
    middleware::{auth::AuthenticatedUser, i18n::Locale, json::JsonBody},
    models::auth::{LoginUserPayload, RegisterUserPayload},
};

// POST /api/auth/register
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let response = app_state
        .auth_service
        .register_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::created(response))
}

// POST /api/auth/login
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    JsonBody(payload): JsonBody<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_payload(&payload, no_extra_rules, &locale, &app_state)?;

    let response = app_state
        .auth_service
        .login_user(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(response))
}

// GET /api/auth/me
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    ApiResponse::ok(user)
}

// GET /api/auth/my-permissions
// Uma entrada por escopo: a de dono (restaurantId nulo) e as de cada restaurante.
pub async fn my_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .rbac_service
        .permissions_for(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(ApiResponse::ok(permissions.into_entries()))
}

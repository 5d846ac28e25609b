// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts, Path},
    http::{request::Parts, StatusCode},
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::i18n::Locale,
    models::restaurant::Restaurant,
};

// Nome do parâmetro de rota que identifica o restaurante
pub const RESTAURANT_PARAM: &str = "restaurant_id";

/// O restaurante da rota (`/restaurants/{restaurant_id}/...`), já carregado.
#[derive(Debug, Clone)]
pub struct RestaurantContext(pub Restaurant);

fn missing_restaurant(parts: &Parts, app_state: &AppState) -> ApiError {
    let locale = Locale::from_parts(parts);
    ApiError::new(
        StatusCode::BAD_REQUEST,
        app_state.i18n_store.translate(&locale.0, "error.missing_restaurant", &[]),
    )
}

/// Lê o id do restaurante da rota. `Ok(None)` quando a rota não tem esse parâmetro.
pub(crate) async fn restaurant_id_from_parts<S>(
    parts: &mut Parts,
    state: &S,
) -> Result<Option<Uuid>, ApiError>
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    let Ok(Path(params)) = Path::<HashMap<String, String>>::from_request_parts(parts, state).await else {
        return Ok(None);
    };

    match params.get(RESTAURANT_PARAM) {
        None => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| missing_restaurant(parts, &AppState::from_ref(state))),
    }
}

/// Carrega o restaurante da rota uma única vez por requisição (fica nas extensions).
pub(crate) async fn load_restaurant<S>(
    parts: &mut Parts,
    state: &S,
    restaurant_id: Uuid,
) -> Result<Restaurant, ApiError>
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    if let Some(RestaurantContext(restaurant)) = parts.extensions.get::<RestaurantContext>() {
        if restaurant.id == restaurant_id {
            return Ok(restaurant.clone());
        }
    }

    let app_state = AppState::from_ref(state);
    let restaurant = app_state
        .rbac_service
        .find_restaurant(restaurant_id)
        .await
        .map_err(|e| e.to_api_error(&Locale::from_parts(parts), &app_state.i18n_store))?;

    parts.extensions.insert(RestaurantContext(restaurant.clone()));
    Ok(restaurant)
}

impl<S> FromRequestParts<S> for RestaurantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(restaurant_id) = restaurant_id_from_parts(parts, state).await? else {
            return Err(missing_restaurant(parts, &AppState::from_ref(state)));
        };

        let restaurant = load_restaurant(parts, state, restaurant_id).await?;
        Ok(RestaurantContext(restaurant))
    }
}

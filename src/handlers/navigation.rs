// src/handlers/navigation.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    common::{
        error::{ApiError, AppError},
        response::ApiResponse,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::navigation::NavigationQuery,
    services::{navigation::navigation_for, rbac_service::Scope},
};

// GET /api/navigation?restaurantId=
// Sem restaurante, monta o menu da conta
pub async fn get_navigation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<NavigationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let (permissions, scope) = match query.restaurant_id {
        Some(restaurant_id) => {
            let restaurant = app_state.rbac_service.find_restaurant(restaurant_id).await.map_err(to_api)?;
            let set = app_state
                .rbac_service
                .permissions_in(user.id, &restaurant)
                .await
                .map_err(to_api)?;
            (set, Scope::Restaurant(restaurant_id))
        }
        None => (
            app_state.rbac_service.permissions_for(user.id).await.map_err(to_api)?,
            Scope::Account,
        ),
    };

    Ok(ApiResponse::ok(navigation_for(&permissions, scope)))
}

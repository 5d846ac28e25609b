// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        tenancy::{load_restaurant, restaurant_id_from_parts},
    },
    models::{
        auth::User,
        rbac::{PermissionAction, PermissionModule},
    },
    services::rbac_service::Scope,
};

/// Uma permissão exigida por rota: grupo + operação.
pub trait PermissionDef: Send + Sync + 'static {
    fn module() -> PermissionModule;
    fn action() -> PermissionAction;
}

/// Guardião tipado. Em rotas com `{restaurant_id}` a checagem usa o escopo do
/// restaurante; nas demais, o escopo da conta (entrada de dono).
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_parts(parts);
        let reject = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        // A. Usuário colocado pelo auth_guard
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or_else(|| reject(AppError::InvalidToken))?;

        // B. Escopo da rota
        let (permissions, scope) = match restaurant_id_from_parts(parts, state).await? {
            Some(restaurant_id) => {
                let restaurant = load_restaurant(parts, state, restaurant_id).await?;
                let set = app_state
                    .rbac_service
                    .permissions_in(user.id, &restaurant)
                    .await
                    .map_err(reject)?;
                (set, Scope::Restaurant(restaurant_id))
            }
            None => {
                let set = app_state.rbac_service.permissions_for(user.id).await.map_err(reject)?;
                (set, Scope::Account)
            }
        };

        // C. Resolve
        let (module, action) = (T::module(), T::action());
        if !permissions.can(action.as_str(), module.as_str(), scope) {
            tracing::warn!(
                "⛔ Usuário {} sem {} em {} ({:?})",
                user.id,
                action.as_str(),
                module.as_str(),
                scope
            );
            return Err(reject(AppError::PermissionDenied {
                module: module.as_str().to_string(),
                action: action.as_str().to_string(),
            }));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permission {
    ($name:ident, $module:ident, $action:ident) => {
        pub struct $name;
        impl PermissionDef for $name {
            fn module() -> PermissionModule {
                PermissionModule::$module
            }
            fn action() -> PermissionAction {
                PermissionAction::$action
            }
        }
    };
}

permission!(PermInventoryView, Inventory, View);
permission!(PermInventoryCreate, Inventory, Create);
permission!(PermInventoryEdit, Inventory, Edit);

permission!(PermInvoicesView, Invoices, View);
permission!(PermInvoicesCreate, Invoices, Create);

permission!(PermMenusView, Menus, View);
permission!(PermMenusCreate, Menus, Create);
permission!(PermMenusEdit, Menus, Edit);
permission!(PermMenusDelete, Menus, Delete);

permission!(PermRestaurantsCreate, Restaurants, Create);
permission!(PermRestaurantsEdit, Restaurants, Edit);
permission!(PermRestaurantsManage, Restaurants, Manage);

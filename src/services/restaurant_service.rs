// src/services/restaurant_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{CatalogStore, RestaurantStore, RoleStore},
    models::{
        auth::User,
        rbac::OWNER_ROLE,
        restaurant::{Restaurant, RestaurantPayload, RestaurantWithRole},
    },
};

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    }
}

/// Nome, endereço e telefone não se repetem entre os restaurantes do mesmo dono.
fn find_conflict(
    existing: &[Restaurant],
    payload: &RestaurantPayload,
    ignore: Option<Uuid>,
) -> Option<AppError> {
    let others = existing.iter().filter(|r| Some(r.id) != ignore);
    for other in others {
        if same_text(Some(&other.name), Some(&payload.name)) {
            return Some(AppError::RestaurantAlreadyExists { field: "name", value: payload.name.clone() });
        }
        if same_text(other.address.as_deref(), payload.address.as_deref()) {
            return Some(AppError::RestaurantAlreadyExists {
                field: "address",
                value: payload.address.clone().unwrap_or_default(),
            });
        }
        if same_text(other.phone_number.as_deref(), payload.phone_number.as_deref()) {
            return Some(AppError::RestaurantAlreadyExists {
                field: "phone number",
                value: payload.phone_number.clone().unwrap_or_default(),
            });
        }
    }
    None
}

#[derive(Clone)]
pub struct RestaurantService {
    restaurants: Arc<dyn RestaurantStore>,
    roles: Arc<dyn RoleStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl RestaurantService {
    pub fn new(
        restaurants: Arc<dyn RestaurantStore>,
        roles: Arc<dyn RoleStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self { restaurants, roles, catalog }
    }

    pub async fn create(&self, owner: &User, payload: RestaurantPayload) -> Result<RestaurantWithRole, AppError> {
        let payload = payload.normalized();

        // 1. Limite do plano
        let plan = self
            .catalog
            .find_plan(owner.subscription_plan_id)
            .await?
            .ok_or(AppError::SubscriptionPlanNotFound(owner.subscription_plan_id))?;
        let owned = self.restaurants.list_owned(owner.id).await?;
        let max = plan.features.max_restaurants;
        if owned.len() as i64 >= i64::from(max) {
            return Err(AppError::RestaurantLimitExceeded(max));
        }

        // 2. Unicidade por dono
        if let Some(conflict) = find_conflict(&owned, &payload, None) {
            return Err(conflict);
        }

        // 3. Restaurante + cargo de dono
        let owner_role = self
            .roles
            .find_role_by_name(OWNER_ROLE)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(OWNER_ROLE.to_string()))?;
        let restaurant = self.restaurants.create_restaurant(owner.id, &payload, owner_role.id).await?;

        tracing::info!("🏪 Restaurante '{}' ({}) criado por {}", restaurant.name, restaurant.id, owner.id);
        Ok(RestaurantWithRole { restaurant, role: owner_role.name })
    }

    pub async fn my_restaurants(&self, user_id: Uuid) -> Result<Vec<RestaurantWithRole>, AppError> {
        self.restaurants.list_for_user(user_id).await
    }

    pub async fn update(&self, restaurant: &Restaurant, payload: RestaurantPayload) -> Result<Restaurant, AppError> {
        let payload = payload.normalized();
        let owned = self.restaurants.list_owned(restaurant.owner_id).await?;
        if let Some(conflict) = find_conflict(&owned, &payload, Some(restaurant.id)) {
            return Err(conflict);
        }
        self.restaurants.update_restaurant(restaurant.id, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::store::Stores,
        models::restaurant::{OperationMode, RestaurantSettings},
        services::auth::AuthService,
        models::auth::RegisterUserPayload,
    };

    fn payload(name: &str, phone: Option<&str>) -> RestaurantPayload {
        RestaurantPayload {
            name: name.into(),
            address: None,
            email: None,
            phone_number: phone.map(String::from),
            operation_mode: OperationMode::Postpaid,
            settings: RestaurantSettings::default(),
        }
    }

    async fn owner(stores: &Stores, plan_name: &str) -> User {
        let plan = stores
            .catalog
            .list_plans()
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.name == plan_name)
            .unwrap();
        let auth = AuthService::new(
            stores.users.clone(),
            stores.roles.clone(),
            stores.catalog.clone(),
            "secret".into(),
            7,
            4,
        );
        auth.register_user(RegisterUserPayload {
            email: "owner@example.com".into(),
            password: "password123".into(),
            username: "owner".into(),
            first_name: "Luis".into(),
            second_name: None,
            first_lastname: "Pérez".into(),
            second_lastname: None,
            phone_number: "3000000000".into(),
            subscription_plan_id: plan.id,
        })
        .await
        .unwrap()
        .user
    }

    fn service(stores: &Stores) -> RestaurantService {
        RestaurantService::new(stores.restaurants.clone(), stores.roles.clone(), stores.catalog.clone())
    }

    #[tokio::test]
    async fn creating_assigns_owner_role_for_the_restaurant() {
        let stores = Stores::memory();
        let user = owner(&stores, "Pro").await;
        let created = service(&stores).create(&user, payload(" La Esquina ", None)).await.unwrap();

        assert_eq!(created.role, OWNER_ROLE);
        assert_eq!(created.restaurant.name, "La Esquina");

        let entries = stores.roles.permission_entries(user.id).await.unwrap();
        assert!(entries.iter().any(|e| e.restaurant_id == Some(created.restaurant.id)));

        let mine = service(&stores).my_restaurants(user.id).await.unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn enforces_plan_limit() {
        let stores = Stores::memory();
        let user = owner(&stores, "Basic").await;
        let svc = service(&stores);
        svc.create(&user, payload("Uno", None)).await.unwrap();

        let second = svc.create(&user, payload("Dos", None)).await;
        assert!(matches!(second, Err(AppError::RestaurantLimitExceeded(1))));
    }

    #[tokio::test]
    async fn rejects_duplicates_per_owner() {
        let stores = Stores::memory();
        let user = owner(&stores, "Pro").await;
        let svc = service(&stores);
        let first = svc.create(&user, payload("Uno", Some("6041234567"))).await.unwrap();

        let same_name = svc.create(&user, payload("uno", None)).await;
        assert!(matches!(same_name, Err(AppError::RestaurantAlreadyExists { field: "name", .. })));

        let same_phone = svc.create(&user, payload("Dos", Some("6041234567"))).await;
        assert!(matches!(same_phone, Err(AppError::RestaurantAlreadyExists { field: "phone number", .. })));

        // editar mantendo o próprio nome é permitido
        let updated = svc.update(&first.restaurant, payload("Uno", Some("6041234567"))).await.unwrap();
        assert_eq!(updated.name, "Uno");
    }
}

// src/services/menu_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::MenuStore,
    models::menu::{normalize_text, Menu, MenuPayload, MenuResponse, Submenu, SubmenuPayload},
};

#[derive(Clone)]
pub struct MenuService {
    menus: Arc<dyn MenuStore>,
}

impl MenuService {
    pub fn new(menus: Arc<dyn MenuStore>) -> Self {
        Self { menus }
    }

    pub async fn list(&self, restaurant_id: Uuid) -> Result<Vec<MenuResponse>, AppError> {
        self.menus.list_menus(restaurant_id).await
    }

    pub async fn create(&self, restaurant_id: Uuid, payload: MenuPayload) -> Result<Menu, AppError> {
        let (name, description) = normalize_text(&payload.name, payload.description.as_deref());
        let menu = self.menus.create_menu(restaurant_id, &name, description.as_deref()).await?;
        tracing::info!("📋 Menu '{}' criado no restaurante {}", menu.name, restaurant_id);
        Ok(menu)
    }

    pub async fn update(&self, restaurant_id: Uuid, menu_id: Uuid, payload: MenuPayload) -> Result<Menu, AppError> {
        let (name, description) = normalize_text(&payload.name, payload.description.as_deref());
        self.menus
            .update_menu(restaurant_id, menu_id, &name, description.as_deref())
            .await
    }

    pub async fn delete(&self, restaurant_id: Uuid, menu_id: Uuid) -> Result<(), AppError> {
        self.menus.delete_menu(restaurant_id, menu_id).await?;
        tracing::info!("🗑️ Menu {} removido do restaurante {}", menu_id, restaurant_id);
        Ok(())
    }

    // O menu precisa ser do restaurante da rota
    async fn owned_menu(&self, restaurant_id: Uuid, menu_id: Uuid) -> Result<Menu, AppError> {
        self.menus
            .find_menu(restaurant_id, menu_id)
            .await?
            .ok_or(AppError::MenuNotFound(menu_id))
    }

    pub async fn create_submenu(
        &self,
        restaurant_id: Uuid,
        menu_id: Uuid,
        payload: SubmenuPayload,
    ) -> Result<Submenu, AppError> {
        let menu = self.owned_menu(restaurant_id, menu_id).await?;
        let (name, description) = normalize_text(&payload.name, payload.description.as_deref());
        self.menus
            .create_submenu(menu.id, &name, description.as_deref(), payload.sort_order)
            .await
    }

    pub async fn update_submenu(
        &self,
        restaurant_id: Uuid,
        menu_id: Uuid,
        submenu_id: Uuid,
        payload: SubmenuPayload,
    ) -> Result<Submenu, AppError> {
        let menu = self.owned_menu(restaurant_id, menu_id).await?;
        let (name, description) = normalize_text(&payload.name, payload.description.as_deref());
        self.menus
            .update_submenu(menu.id, submenu_id, &name, description.as_deref(), payload.sort_order)
            .await
    }

    pub async fn delete_submenu(&self, restaurant_id: Uuid, menu_id: Uuid, submenu_id: Uuid) -> Result<(), AppError> {
        let menu = self.owned_menu(restaurant_id, menu_id).await?;
        self.menus.delete_submenu(menu.id, submenu_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::Stores;

    fn menu(name: &str) -> MenuPayload {
        MenuPayload { name: name.into(), description: Some("  ".into()) }
    }

    fn submenu(name: &str, sort_order: Option<i32>) -> SubmenuPayload {
        SubmenuPayload { name: name.into(), description: None, sort_order }
    }

    #[tokio::test]
    async fn menus_are_trimmed_and_unique_per_restaurant() {
        let svc = MenuService::new(Stores::memory().menus);
        let restaurant = Uuid::new_v4();

        let created = svc.create(restaurant, menu("  Carta  ")).await.unwrap();
        assert_eq!(created.name, "Carta");
        assert!(created.description.is_none());

        let dup = svc.create(restaurant, menu("carta")).await;
        assert!(matches!(dup, Err(AppError::MenuAlreadyExists(_))));

        assert!(svc.create(Uuid::new_v4(), menu("Carta")).await.is_ok());
    }

    #[tokio::test]
    async fn submenus_default_to_next_position() {
        let svc = MenuService::new(Stores::memory().menus);
        let restaurant = Uuid::new_v4();
        let carta = svc.create(restaurant, menu("Carta")).await.unwrap();

        let first = svc.create_submenu(restaurant, carta.id, submenu("Entradas", None)).await.unwrap();
        let second = svc.create_submenu(restaurant, carta.id, submenu("Platos fuertes", None)).await.unwrap();
        let pinned = svc.create_submenu(restaurant, carta.id, submenu("Bebidas", Some(10))).await.unwrap();
        assert_eq!((first.sort_order, second.sort_order, pinned.sort_order), (0, 1, 10));

        let listed = svc.list(restaurant).await.unwrap();
        let names: Vec<&str> = listed[0].submenus.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Entradas", "Platos fuertes", "Bebidas"]);

        let dup = svc.create_submenu(restaurant, carta.id, submenu("entradas", None)).await;
        assert!(matches!(dup, Err(AppError::SubmenuAlreadyExists(_))));
    }

    #[tokio::test]
    async fn other_restaurants_cannot_touch_the_menu() {
        let svc = MenuService::new(Stores::memory().menus);
        let restaurant = Uuid::new_v4();
        let carta = svc.create(restaurant, menu("Carta")).await.unwrap();

        let foreign = svc.create_submenu(Uuid::new_v4(), carta.id, submenu("Postres", None)).await;
        assert!(matches!(foreign, Err(AppError::MenuNotFound(_))));

        svc.delete(restaurant, carta.id).await.unwrap();
        assert!(matches!(svc.delete(restaurant, carta.id).await, Err(AppError::MenuNotFound(_))));
    }
}

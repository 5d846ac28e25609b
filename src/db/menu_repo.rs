// src/db/menu_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::MenuStore, unique_violation},
    models::menu::{Menu, MenuResponse, Submenu},
};

const MENU_COLUMNS: &str = "id, restaurant_id, name, description, created_at, updated_at";
const SUBMENU_COLUMNS: &str = "id, menu_id, name, description, sort_order, created_at, updated_at";

#[derive(Clone)]
pub struct MenuRepository {
    pool: PgPool,
}

impl MenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn menu_conflict(e: sqlx::Error, name: &str) -> AppError {
    match unique_violation(&e) {
        Some(_) => AppError::MenuAlreadyExists(name.to_string()),
        None => e.into(),
    }
}

fn submenu_conflict(e: sqlx::Error, name: &str) -> AppError {
    match unique_violation(&e) {
        Some(_) => AppError::SubmenuAlreadyExists(name.to_string()),
        None => e.into(),
    }
}

#[async_trait]
impl MenuStore for MenuRepository {
    async fn list_menus(&self, restaurant_id: Uuid) -> Result<Vec<MenuResponse>, AppError> {
        let menus = sqlx::query_as::<_, Menu>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE restaurant_id = $1 ORDER BY created_at"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        let submenus = sqlx::query_as::<_, Submenu>(&format!(
            r#"
            SELECT {SUBMENU_COLUMNS}
            FROM submenus
            WHERE menu_id IN (SELECT id FROM menus WHERE restaurant_id = $1)
            ORDER BY sort_order, name
            "#
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        // Agrupa os submenus por menu mantendo a ordem
        let mut by_menu: HashMap<Uuid, Vec<Submenu>> = HashMap::new();
        for submenu in submenus {
            by_menu.entry(submenu.menu_id).or_default().push(submenu);
        }

        Ok(menus
            .into_iter()
            .map(|menu| MenuResponse {
                submenus: by_menu.remove(&menu.id).unwrap_or_default(),
                menu,
            })
            .collect())
    }

    async fn find_menu(&self, restaurant_id: Uuid, id: Uuid) -> Result<Option<Menu>, AppError> {
        let menu = sqlx::query_as::<_, Menu>(&format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE id = $1 AND restaurant_id = $2"
        ))
        .bind(id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(menu)
    }

    async fn create_menu(&self, restaurant_id: Uuid, name: &str, description: Option<&str>) -> Result<Menu, AppError> {
        sqlx::query_as::<_, Menu>(&format!(
            "INSERT INTO menus (restaurant_id, name, description) VALUES ($1, $2, $3) RETURNING {MENU_COLUMNS}"
        ))
        .bind(restaurant_id)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| menu_conflict(e, name))
    }

    async fn update_menu(
        &self,
        restaurant_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Menu, AppError> {
        sqlx::query_as::<_, Menu>(&format!(
            r#"
            UPDATE menus SET name = $3, description = $4, updated_at = NOW()
            WHERE id = $1 AND restaurant_id = $2
            RETURNING {MENU_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(restaurant_id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| menu_conflict(e, name))?
        .ok_or(AppError::MenuNotFound(id))
    }

    async fn delete_menu(&self, restaurant_id: Uuid, id: Uuid) -> Result<(), AppError> {
        // Submenus saem junto (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM menus WHERE id = $1 AND restaurant_id = $2")
            .bind(id)
            .bind(restaurant_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::MenuNotFound(id));
        }
        Ok(())
    }

    async fn create_submenu(
        &self,
        menu_id: Uuid,
        name: &str,
        description: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<Submenu, AppError> {
        sqlx::query_as::<_, Submenu>(&format!(
            r#"
            INSERT INTO submenus (menu_id, name, description, sort_order)
            VALUES ($1, $2, $3, COALESCE($4, (SELECT COALESCE(MAX(sort_order) + 1, 0) FROM submenus WHERE menu_id = $1)))
            RETURNING {SUBMENU_COLUMNS}
            "#
        ))
        .bind(menu_id)
        .bind(name)
        .bind(description)
        .bind(sort_order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| submenu_conflict(e, name))
    }

    async fn update_submenu(
        &self,
        menu_id: Uuid,
        id: Uuid,
        name: &str,
        description: Option<&str>,
        sort_order: Option<i32>,
    ) -> Result<Submenu, AppError> {
        sqlx::query_as::<_, Submenu>(&format!(
            r#"
            UPDATE submenus
            SET name = $3, description = $4, sort_order = COALESCE($5, sort_order), updated_at = NOW()
            WHERE id = $1 AND menu_id = $2
            RETURNING {SUBMENU_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(menu_id)
        .bind(name)
        .bind(description)
        .bind(sort_order)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| submenu_conflict(e, name))?
        .ok_or(AppError::SubmenuNotFound(id))
    }

    async fn delete_submenu(&self, menu_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM submenus WHERE id = $1 AND menu_id = $2")
            .bind(id)
            .bind(menu_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::SubmenuNotFound(id));
        }
        Ok(())
    }
}

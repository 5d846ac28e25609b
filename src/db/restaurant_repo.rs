// src/db/restaurant_repo.rs

use async_trait::async_trait;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::RestaurantStore, unique_violation, RbacRepository},
    models::restaurant::{Restaurant, RestaurantPayload, RestaurantWithRole},
};

const RESTAURANT_COLUMNS: &str = "r.id, r.owner_id, r.name, r.address, r.email, r.phone_number, \
                                  r.operation_mode, r.is_active, r.settings, r.created_at, r.updated_at";

#[derive(Clone)]
pub struct RestaurantRepository {
    pool: PgPool,
    rbac: RbacRepository,
}

impl RestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { rbac: RbacRepository::new(pool.clone()), pool }
    }

    pub async fn insert_restaurant<'e, E>(
        &self,
        executor: E,
        owner_id: Uuid,
        payload: &RestaurantPayload,
    ) -> Result<Restaurant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO restaurants AS r (owner_id, name, address, email, phone_number, operation_mode, settings)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RESTAURANT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Restaurant>(&sql)
            .bind(owner_id)
            .bind(&payload.name)
            .bind(&payload.address)
            .bind(&payload.email)
            .bind(&payload.phone_number)
            .bind(payload.operation_mode)
            .bind(Json(&payload.settings))
            .fetch_one(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::RestaurantAlreadyExists { field: "name", value: payload.name.clone() },
                None => e.into(),
            })
    }
}

#[async_trait]
impl RestaurantStore for RestaurantRepository {
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Restaurant>, AppError> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants r WHERE r.owner_id = $1 ORDER BY r.created_at");
        let restaurants = sqlx::query_as::<_, Restaurant>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(restaurants)
    }

    async fn create_restaurant(
        &self,
        owner_id: Uuid,
        payload: &RestaurantPayload,
        owner_role_id: Uuid,
    ) -> Result<Restaurant, AppError> {
        let mut tx = self.pool.begin().await?;

        let restaurant = self.insert_restaurant(&mut *tx, owner_id, payload).await?;
        self.rbac
            .upsert_user_role(&mut *tx, owner_id, Some(restaurant.id), owner_role_id)
            .await?;

        tx.commit().await?;
        Ok(restaurant)
    }

    async fn find_restaurant(&self, id: Uuid) -> Result<Option<Restaurant>, AppError> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants r WHERE r.id = $1");
        let restaurant = sqlx::query_as::<_, Restaurant>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(restaurant)
    }

    async fn update_restaurant(&self, id: Uuid, payload: &RestaurantPayload) -> Result<Restaurant, AppError> {
        let sql = format!(
            r#"
            UPDATE restaurants AS r
            SET name = $2, address = $3, email = $4, phone_number = $5,
                operation_mode = $6, settings = $7, updated_at = NOW()
            WHERE r.id = $1
            RETURNING {RESTAURANT_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Restaurant>(&sql)
            .bind(id)
            .bind(&payload.name)
            .bind(&payload.address)
            .bind(&payload.email)
            .bind(&payload.phone_number)
            .bind(payload.operation_mode)
            .bind(Json(&payload.settings))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => AppError::RestaurantAlreadyExists { field: "name", value: payload.name.clone() },
                None => e.into(),
            })?
            .ok_or(AppError::RestaurantNotFound(id))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RestaurantWithRole>, AppError> {
        let sql = format!(
            r#"
            SELECT {RESTAURANT_COLUMNS}, ro.name AS role
            FROM user_roles ur
            JOIN restaurants r ON r.id = ur.restaurant_id
            JOIN roles ro ON ro.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY LOWER(r.name)
            "#
        );
        let restaurants = sqlx::query_as::<_, RestaurantWithRole>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(restaurants)
    }
}

// src/db/rbac_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::RoleStore,
    models::rbac::{PermissionEntry, Role},
};

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insere ou troca o cargo do usuário no escopo (um por escopo).
    pub async fn upsert_user_role<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        restaurant_id: Option<Uuid>,
        role_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, restaurant_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT user_roles_scope_key
            DO UPDATE SET role_id = EXCLUDED.role_id
            "#,
        )
        .bind(user_id)
        .bind(restaurant_id)
        .bind(role_id)
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for RbacRepository {
    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, description, permissions FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, permissions FROM roles WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    async fn permission_entries(&self, user_id: Uuid) -> Result<Vec<PermissionEntry>, AppError> {
        // Escopo da conta (NULL) primeiro
        let entries = sqlx::query_as::<_, PermissionEntry>(
            r#"
            SELECT ur.restaurant_id, r.name AS role, r.permissions
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY ur.restaurant_id NULLS FIRST
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn assign_role(&self, user_id: Uuid, restaurant_id: Uuid, role_id: Uuid) -> Result<(), AppError> {
        self.upsert_user_role(&self.pool, user_id, Some(restaurant_id), role_id).await
    }
}

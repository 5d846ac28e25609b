// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{store::UserStore, unique_violation},
    models::auth::{NewUser, User},
};

const USER_COLUMNS: &str = "id, email, username, first_name, second_name, first_lastname, second_lastname, \
                            phone_number, password_hash, subscription_plan_id, created_at, updated_at";

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user<'e, E>(&self, executor: E, user: &NewUser) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (
                email, username, first_name, second_name, first_lastname,
                second_lastname, phone_number, password_hash, subscription_plan_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.second_name)
            .bind(&user.first_lastname)
            .bind(&user.second_lastname)
            .bind(&user.phone_number)
            .bind(&user.password_hash)
            .bind(user.subscription_plan_id)
            .fetch_one(executor)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some("users_email_key") => AppError::EmailAlreadyExists,
                Some("users_username_key") => AppError::UsernameAlreadyExists,
                _ => e.into(),
            })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_owner_account(&self, user: NewUser, owner_role_id: Uuid) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let created = self.create_user(&mut *tx, &user).await?;

        // Cargo de dono no escopo da conta
        sqlx::query("INSERT INTO user_roles (user_id, restaurant_id, role_id) VALUES ($1, NULL, $2)")
            .bind(created.id)
            .bind(owner_role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }
}

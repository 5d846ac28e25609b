// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{CatalogStore, RoleStore, UserStore},
    models::{
        auth::{Claims, LoginResponse, LoginUserPayload, NewUser, RegisterUserPayload, User},
        rbac::OWNER_ROLE,
    },
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleStore>,
    catalog: Arc<dyn CatalogStore>,
    jwt_secret: String,
    jwt_expiration_days: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleStore>,
        catalog: Arc<dyn CatalogStore>,
        jwt_secret: String,
        jwt_expiration_days: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self { users, roles, catalog, jwt_secret, jwt_expiration_days, bcrypt_cost }
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<LoginResponse, AppError> {
        // 1. Plano precisa existir
        self.catalog
            .find_plan(payload.subscription_plan_id)
            .await?
            .ok_or(AppError::SubscriptionPlanNotFound(payload.subscription_plan_id))?;

        let owner_role = self
            .roles
            .find_role_by_name(OWNER_ROLE)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(OWNER_ROLE.to_string()))?;

        // 2. Hashing fora do runtime assíncrono
        let password = payload.password.clone();
        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let new_user = NewUser {
            email: payload.email.trim().to_lowercase(),
            username: payload.username.trim().to_string(),
            first_name: payload.first_name.trim().to_string(),
            second_name: payload.second_name.filter(|s| !s.trim().is_empty()),
            first_lastname: payload.first_lastname.trim().to_string(),
            second_lastname: payload.second_lastname.filter(|s| !s.trim().is_empty()),
            phone_number: payload.phone_number.trim().to_string(),
            password_hash,
            subscription_plan_id: payload.subscription_plan_id,
        };

        // 3. Usuário + cargo de dono, atômico
        let user = self.users.create_owner_account(new_user, owner_role.id).await?;
        tracing::info!("✅ Usuário {} registrado", user.id);

        let token = self.create_token(user.id)?;
        Ok(LoginResponse { token, user })
    }

    pub async fn login_user(&self, payload: LoginUserPayload) -> Result<LoginResponse, AppError> {
        let email = payload.email.trim().to_lowercase();
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password = payload.password;
        let password_hash = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(user.id)?;
        Ok(LoginResponse { token, user })
    }

    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        self.users
            .find_user_by_id(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    pub fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.jwt_expiration_days);

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

// src/config.rs

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::{env, str::FromStr, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::store::Stores,
    services::{
        auth::AuthService, catalog_service::CatalogService, ingredient_service::IngredientService,
        inventory_service::InventoryService, invoice_service::InvoiceService, menu_service::MenuService,
        rbac_service::RbacService, restaurant_service::RestaurantService, unit_conversion::validate_unit_catalog,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    Memory,
    Postgres,
}

impl FromStr for DataBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => anyhow::bail!("DATA_BACKEND inválido: '{}' (use memory ou postgres)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_backend: DataBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiration_days: i64,
    pub bcrypt_cost: u32,
    pub bind_addr: String,
    pub allow_negative_stock: bool,
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} inválido ('{}'): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Lê as variáveis de ambiente (e o `.env`, se existir).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_backend = var_or("DATA_BACKEND", DataBackend::Postgres)?;
        let database_url = env::var("DATABASE_URL").ok();
        if data_backend == DataBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida quando DATA_BACKEND=postgres");
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        Ok(Self {
            data_backend,
            database_url,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_expiration_days: var_or("JWT_EXPIRATION_DAYS", 7)?,
            bcrypt_cost: var_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            allow_negative_stock: var_or("ALLOW_NEGATIVE_STOCK", false)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub restaurant_service: RestaurantService,
    pub catalog_service: CatalogService,
    pub ingredient_service: IngredientService,
    pub inventory_service: InventoryService,
    pub invoice_service: InvoiceService,
    pub menu_service: MenuService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let stores = match config.data_backend {
            DataBackend::Memory => {
                tracing::warn!("⚠️ DATA_BACKEND=memory: os dados se perdem ao reiniciar");
                Stores::memory()
            }
            DataBackend::Postgres => {
                let database_url = config.database_url.as_deref().unwrap_or_default();
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!("./migrations")
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Stores::postgres(db_pool)
            }
        };

        ensure_unit_catalog(&stores).await?;
        Self::from_stores(config, stores)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_stores(config: Config, stores: Stores) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);

        let auth_service = AuthService::new(
            stores.users.clone(),
            stores.roles.clone(),
            stores.catalog.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_days,
            config.bcrypt_cost,
        );
        let rbac_service = RbacService::new(stores.roles.clone(), stores.users.clone(), stores.restaurants.clone());
        let restaurant_service =
            RestaurantService::new(stores.restaurants.clone(), stores.roles.clone(), stores.catalog.clone());
        let catalog_service = CatalogService::new(stores.catalog.clone());
        let ingredient_service = IngredientService::new(stores.ingredients.clone(), stores.catalog.clone());
        let inventory_service =
            InventoryService::new(stores.inventory.clone(), stores.ingredients.clone(), config.allow_negative_stock);
        let invoice_service =
            InvoiceService::new(stores.invoices.clone(), stores.ingredients.clone(), stores.catalog.clone());
        let menu_service = MenuService::new(stores.menus.clone());

        Ok(Self {
            config: Arc::new(config),
            i18n_store,
            auth_service,
            rbac_service,
            restaurant_service,
            catalog_service,
            ingredient_service,
            inventory_service,
            invoice_service,
            menu_service,
        })
    }
}

/// Seed ou migração com unidades inconsistentes derruba o startup.
async fn ensure_unit_catalog(stores: &Stores) -> anyhow::Result<()> {
    let units = stores
        .catalog
        .list_units()
        .await
        .context("Falha ao carregar o catálogo de unidades")?;
    validate_unit_catalog(&units).context("Catálogo de unidades inválido")?;
    tracing::info!("✅ Catálogo de unidades verificado ({} unidades)", units.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_unit_catalog_passes_the_startup_check() {
        ensure_unit_catalog(&Stores::memory()).await.unwrap();
    }

    #[test]
    fn parses_data_backend() {
        assert_eq!("memory".parse::<DataBackend>().unwrap(), DataBackend::Memory);
        assert_eq!(" Postgres ".parse::<DataBackend>().unwrap(), DataBackend::Postgres);
        assert!("mysql".parse::<DataBackend>().is_err());
    }
}

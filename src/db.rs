pub mod store;
pub mod memory;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod restaurant_repo;
pub use restaurant_repo::RestaurantRepository;
pub mod ingredient_repo;
pub use ingredient_repo::IngredientRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
pub mod menu_repo;
pub use menu_repo::MenuRepository;

/// Nome da constraint violada quando o erro é de chave única.
pub(crate) fn unique_violation(e: &sqlx::Error) -> Option<&str> {
    match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => Some(db_err.constraint().unwrap_or_default()),
        _ => None,
    }
}

pub mod auth;
pub mod catalog_service;
pub mod ingredient_service;
pub mod inventory_service;
pub mod invoice_calculator;
pub mod invoice_service;
pub mod menu_service;
pub mod navigation;
pub mod rbac_service;
pub mod restaurant_service;
pub mod unit_conversion;

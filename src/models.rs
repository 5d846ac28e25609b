// src/models.rs

pub mod auth;
pub mod ingredient;
pub mod inventory;
pub mod invoice;
pub mod menu;
pub mod navigation;
pub mod rbac;
pub mod restaurant;
pub mod subscription;
pub mod supplier;
pub mod unit;

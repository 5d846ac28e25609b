// src/common.rs

pub mod error;
pub mod formatters;
pub mod i18n;
pub mod response;
pub mod validation;

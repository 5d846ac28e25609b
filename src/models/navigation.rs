// src/models/navigation.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::rbac::PermissionModule;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub title: &'static str,
    pub href: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<PermissionModule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavSection {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<PermissionModule>,
    pub items: Vec<NavItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationQuery {
    pub restaurant_id: Option<Uuid>,
}

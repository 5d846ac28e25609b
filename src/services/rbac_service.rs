// src/services/rbac_service.rs

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{RestaurantStore, RoleStore, UserStore},
    models::{
        rbac::{
            AssignRolePayload, MemberResponse, PermissionAction, PermissionCatalog, PermissionEntry,
            PermissionMap, PermissionModule, Role, OWNER_ROLE, WILDCARD,
        },
        restaurant::Restaurant,
    },
};

/// Escopo de uma verificação: a conta inteira ou um restaurante específico.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Account,
    Restaurant(Uuid),
}

/// Todas as permissões de um usuário, uma entrada por escopo.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    entries: Vec<PermissionEntry>,
}

impl PermissionSet {
    /// Entradas repetidas para o mesmo escopo: vale a primeira.
    pub fn new(entries: Vec<PermissionEntry>) -> Self {
        let mut unique: Vec<PermissionEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.restaurant_id == entry.restaurant_id) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    pub fn into_entries(self) -> Vec<PermissionEntry> {
        self.entries
    }

    /// Remove a entrada de dono (usado quando o restaurante é de outra conta).
    pub fn without_owner_entry(mut self) -> Self {
        self.entries.retain(|e| e.restaurant_id.is_some());
        self
    }

    fn owner_entry(&self) -> Option<&PermissionEntry> {
        self.entries.iter().find(|e| e.restaurant_id.is_none())
    }

    /// Entrada efetiva: a do restaurante, senão a de dono. No escopo da conta, só a de dono.
    pub fn entry_for(&self, scope: Scope) -> Option<&PermissionEntry> {
        match scope {
            Scope::Account => self.owner_entry(),
            Scope::Restaurant(id) => self
                .entries
                .iter()
                .find(|e| e.restaurant_id == Some(id))
                .or_else(|| self.owner_entry()),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.owner_entry().is_some()
    }

    pub fn can(&self, action: &str, module: &str, scope: Scope) -> bool {
        self.entry_for(scope)
            .is_some_and(|entry| map_grants(&entry.permissions, action, module))
    }

    /// Acesso ao módulo com qualquer operação (usado no menu lateral).
    pub fn can_access_module(&self, module: &str, scope: Scope) -> bool {
        self.entry_for(scope).is_some_and(|entry| {
            grants_everything(&entry.permissions)
                || entry.permissions.get(module).is_some_and(|ops| !ops.is_empty())
        })
    }
}

fn grants_everything(map: &PermissionMap) -> bool {
    map.get(WILDCARD).is_some_and(|ops| ops.contains(WILDCARD))
}

// Um cargo de restaurante sem o grupo nega, sem recorrer à entrada de dono.
fn map_grants(map: &PermissionMap, action: &str, module: &str) -> bool {
    if grants_everything(map) {
        return true;
    }
    map.get(module)
        .is_some_and(|ops| ops.contains(WILDCARD) || ops.contains(action))
}

#[derive(Clone)]
pub struct RbacService {
    roles: Arc<dyn RoleStore>,
    users: Arc<dyn UserStore>,
    restaurants: Arc<dyn RestaurantStore>,
}

impl RbacService {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        users: Arc<dyn UserStore>,
        restaurants: Arc<dyn RestaurantStore>,
    ) -> Self {
        Self { roles, users, restaurants }
    }

    pub async fn permissions_for(&self, user_id: Uuid) -> Result<PermissionSet, AppError> {
        let entries = self.roles.permission_entries(user_id).await?;
        Ok(PermissionSet::new(entries))
    }

    /// Permissões válidas dentro de um restaurante. A entrada de dono só vale
    /// para restaurantes da própria conta.
    pub async fn permissions_in(&self, user_id: Uuid, restaurant: &Restaurant) -> Result<PermissionSet, AppError> {
        let set = self.permissions_for(user_id).await?;
        if restaurant.owner_id == user_id {
            Ok(set)
        } else {
            Ok(set.without_owner_entry())
        }
    }

    pub async fn find_restaurant(&self, restaurant_id: Uuid) -> Result<Restaurant, AppError> {
        self.restaurants
            .find_restaurant(restaurant_id)
            .await?
            .ok_or(AppError::RestaurantNotFound(restaurant_id))
    }

    /// Entrada efetiva do usuário para o restaurante.
    pub async fn restaurant_permissions(
        &self,
        user_id: Uuid,
        restaurant_id: Uuid,
    ) -> Result<PermissionEntry, AppError> {
        let restaurant = self.find_restaurant(restaurant_id).await?;
        let set = self.permissions_in(user_id, &restaurant).await?;
        set.entry_for(Scope::Restaurant(restaurant_id))
            .cloned()
            .ok_or(AppError::PermissionEntryNotFound(restaurant_id))
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.roles.list_roles().await
    }

    pub fn catalog(&self) -> PermissionCatalog {
        PermissionCatalog {
            modules: PermissionModule::ALL.to_vec(),
            actions: PermissionAction::ALL.to_vec(),
            wildcard: WILDCARD,
        }
    }

    /// Atribui (ou troca) o cargo de um usuário no restaurante.
    pub async fn assign_member(
        &self,
        restaurant_id: Uuid,
        payload: AssignRolePayload,
    ) -> Result<MemberResponse, AppError> {
        // 1. O dono só nasce pelo cadastro ou pela criação do restaurante
        if payload.role_name.trim().eq_ignore_ascii_case(OWNER_ROLE) {
            return Err(AppError::RoleNotAssignable(OWNER_ROLE.to_string()));
        }

        let role = self
            .roles
            .find_role_by_name(payload.role_name.trim())
            .await?
            .ok_or_else(|| AppError::RoleNotFound(payload.role_name.clone()))?;

        let email = payload.email.trim().to_lowercase();
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.roles.assign_role(user.id, restaurant_id, role.id).await?;

        tracing::info!(
            "👥 Cargo '{}' atribuído ao usuário {} no restaurante {}",
            role.name, user.id, restaurant_id
        );

        Ok(MemberResponse {
            user_id: user.id,
            restaurant_id,
            role: role.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::permission_map;

    fn entry(restaurant_id: Option<Uuid>, role: &str, map: &[(&str, &[&str])]) -> PermissionEntry {
        PermissionEntry {
            restaurant_id,
            role: role.to_string(),
            permissions: permission_map(map),
        }
    }

    #[test]
    fn owner_wildcard_grants_any_restaurant() {
        let restaurant = Uuid::new_v4();
        let set = PermissionSet::new(vec![entry(None, "Owner", &[("ALL", &["ALL"])])]);

        assert!(set.can("DELETE", "INVENTORY", Scope::Restaurant(restaurant)));
        assert!(set.can("ANYTHING", "WHATEVER", Scope::Account));
        assert!(set.is_owner());
    }

    #[test]
    fn tenant_role_limits_operations() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![entry(Some(r1), "Viewer", &[("INVENTORY", &["VIEW"])])]);

        assert!(set.can("VIEW", "INVENTORY", Scope::Restaurant(r1)));
        assert!(!set.can("EDIT", "INVENTORY", Scope::Restaurant(r1)));
        assert!(!set.can("VIEW", "MENUS", Scope::Restaurant(r1)));
        assert!(!set.is_owner());
    }

    #[test]
    fn account_scope_ignores_tenant_entries() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![entry(Some(r1), "Manager", &[("ALL", &["ALL"])])]);

        assert!(!set.can("VIEW", "INVENTORY", Scope::Account));
        assert!(set.can("VIEW", "INVENTORY", Scope::Restaurant(r1)));
    }

    #[test]
    fn unknown_restaurant_falls_back_to_owner_entry() {
        let r1 = Uuid::new_v4();
        let other = Uuid::new_v4();
        let set = PermissionSet::new(vec![
            entry(Some(r1), "Chef", &[("KITCHEN", &["ALL"])]),
            entry(None, "Owner", &[("INVENTORY", &["VIEW"])]),
        ]);

        assert!(set.can("VIEW", "INVENTORY", Scope::Restaurant(other)));
        assert!(!set.can("EDIT", "INVENTORY", Scope::Restaurant(other)));
    }

    #[test]
    fn tenant_entry_without_group_does_not_fall_back() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![
            entry(None, "Owner", &[("ALL", &["ALL"])]),
            entry(Some(r1), "Chef", &[("KITCHEN", &["ALL"])]),
        ]);

        assert!(set.can("CLOSE", "KITCHEN", Scope::Restaurant(r1)));
        assert!(!set.can("VIEW", "INVENTORY", Scope::Restaurant(r1)));
    }

    #[test]
    fn no_entries_deny() {
        let set = PermissionSet::default();
        assert!(!set.can("VIEW", "INVENTORY", Scope::Account));
        assert!(!set.can("VIEW", "INVENTORY", Scope::Restaurant(Uuid::new_v4())));
        assert!(!set.can_access_module("INVENTORY", Scope::Account));
    }

    #[test]
    fn group_wildcard_grants_every_operation_of_the_group() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![entry(Some(r1), "Manager", &[("MENUS", &["ALL"])])]);
        assert!(set.can("DELETE", "MENUS", Scope::Restaurant(r1)));
        assert!(!set.can("DELETE", "INVOICES", Scope::Restaurant(r1)));
    }

    #[test]
    fn duplicate_scopes_keep_the_first_entry() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![
            entry(Some(r1), "Waiter", &[("ORDERS", &["VIEW"])]),
            entry(Some(r1), "Manager", &[("ALL", &["ALL"])]),
        ]);
        assert!(!set.can("VIEW", "INVENTORY", Scope::Restaurant(r1)));
        assert_eq!(set.into_entries().len(), 1);
    }

    #[test]
    fn dropping_owner_entry_keeps_tenant_roles() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![
            entry(None, "Owner", &[("ALL", &["ALL"])]),
            entry(Some(r1), "Waiter", &[("ORDERS", &["VIEW"])]),
        ])
        .without_owner_entry();

        assert!(!set.is_owner());
        assert!(set.can("VIEW", "ORDERS", Scope::Restaurant(r1)));
        assert!(!set.can("VIEW", "INVENTORY", Scope::Restaurant(Uuid::new_v4())));
    }

    #[test]
    fn module_access_needs_a_non_empty_group() {
        let r1 = Uuid::new_v4();
        let set = PermissionSet::new(vec![entry(
            Some(r1),
            "Custom",
            &[("INVENTORY", &["EDIT"]), ("FINANCE", &[])],
        )]);
        assert!(set.can_access_module("INVENTORY", Scope::Restaurant(r1)));
        assert!(!set.can_access_module("FINANCE", Scope::Restaurant(r1)));
        assert!(!set.can_access_module("ORDERS", Scope::Restaurant(r1)));
    }
}

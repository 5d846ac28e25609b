// src/services/navigation.rs
//
// Menu lateral do painel. Itens com módulo só aparecem para quem acessa o módulo.

use crate::{
    models::{
        navigation::{NavItem, NavSection},
        rbac::PermissionModule,
    },
    services::rbac_service::{PermissionSet, Scope},
};

fn item(title: &'static str, href: &'static str, module: Option<PermissionModule>) -> NavItem {
    NavItem { title, href, module }
}

fn restaurant_sections() -> Vec<NavSection> {
    use PermissionModule::*;
    vec![
        NavSection {
            title: "Operation",
            module: None,
            items: vec![
                item("Dashboard", "/dashboard", None),
                item("POS", "/pos", Some(Orders)),
                item("Tables", "/tables", Some(Tables)),
                item("Live Orders (KDS)", "/orders/active", Some(Kds)),
            ],
        },
        NavSection {
            title: "Inventory & Catalog",
            module: Some(Inventory),
            items: vec![
                item("Ingredients", "/ingredients", None),
                item("Recipes", "/recipes", Some(Recipes)),
                item("Products", "/products", Some(Catalog)),
                item("Menus", "/menus", Some(Menus)),
                item("Purchases", "/purchases", Some(Invoices)),
            ],
        },
        NavSection {
            title: "Management",
            module: None,
            items: vec![
                item("Sales & Reports", "/reports", Some(Finance)),
                item("Staff", "/staff", Some(Restaurants)),
                item("Suppliers", "/suppliers", Some(Inventory)),
            ],
        },
        NavSection {
            title: "Configuration",
            module: Some(Restaurants),
            items: vec![
                item("Settings", "/settings", None),
                item("Devices", "/devices", Some(Operations)),
            ],
        },
    ]
}

fn account_sections() -> Vec<NavSection> {
    vec![NavSection {
        title: "Account",
        module: None,
        items: vec![
            item("Dashboard", "/dashboard", None),
            item("Restaurants", "/restaurants", Some(PermissionModule::Restaurants)),
            item("Ingredients", "/ingredients", Some(PermissionModule::Inventory)),
        ],
    }]
}

// Na conta, itens com módulo são só do dono
fn visible(permissions: &PermissionSet, scope: Scope, module: PermissionModule) -> bool {
    match scope {
        Scope::Account => permissions.is_owner() && permissions.can("VIEW", module.as_str(), Scope::Account),
        Scope::Restaurant(_) => permissions.can_access_module(module.as_str(), scope),
    }
}

/// Seções visíveis no escopo pedido. Seções que ficam sem itens somem.
pub fn navigation_for(permissions: &PermissionSet, scope: Scope) -> Vec<NavSection> {
    let sections = match scope {
        Scope::Account => account_sections(),
        Scope::Restaurant(_) => restaurant_sections(),
    };

    sections
        .into_iter()
        .filter(|section| section.module.is_none_or(|m| visible(permissions, scope, m)))
        .filter_map(|mut section| {
            section.items.retain(|i| i.module.is_none_or(|m| visible(permissions, scope, m)));
            (!section.items.is_empty()).then_some(section)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rbac::{permission_map, PermissionEntry};
    use uuid::Uuid;

    fn set(restaurant_id: Option<Uuid>, map: &[(&str, &[&str])]) -> PermissionSet {
        PermissionSet::new(vec![PermissionEntry {
            restaurant_id,
            role: "Test".into(),
            permissions: permission_map(map),
        }])
    }

    fn hrefs(sections: &[NavSection]) -> Vec<&'static str> {
        sections.iter().flat_map(|s| s.items.iter().map(|i| i.href)).collect()
    }

    #[test]
    fn owner_sees_everything() {
        let owner = set(None, &[("ALL", &["ALL"])]);
        let restaurant = navigation_for(&owner, Scope::Restaurant(Uuid::new_v4()));
        assert_eq!(restaurant.len(), 4);
        assert!(hrefs(&restaurant).contains(&"/purchases"));

        let account = navigation_for(&owner, Scope::Account);
        assert_eq!(hrefs(&account), ["/dashboard", "/restaurants", "/ingredients"]);
    }

    #[test]
    fn waiter_sees_only_granted_modules() {
        let r1 = Uuid::new_v4();
        let waiter = set(Some(r1), &[("ORDERS", &["VIEW", "CREATE"]), ("TABLES", &["VIEW"])]);
        let sections = navigation_for(&waiter, Scope::Restaurant(r1));

        assert_eq!(hrefs(&sections), ["/dashboard", "/pos", "/tables"]);
        assert!(sections.iter().all(|s| s.title != "Inventory & Catalog"));
    }

    #[test]
    fn section_module_hides_the_whole_section() {
        let r1 = Uuid::new_v4();
        let buyer = set(Some(r1), &[("INVOICES", &["VIEW"])]);
        let sections = navigation_for(&buyer, Scope::Restaurant(r1));
        assert!(!hrefs(&sections).contains(&"/purchases"));
    }

    #[test]
    fn tenant_only_user_has_a_bare_account_menu() {
        let staff = set(Some(Uuid::new_v4()), &[("ALL", &["ALL"])]);
        assert_eq!(hrefs(&navigation_for(&staff, Scope::Account)), ["/dashboard"]);
    }
}

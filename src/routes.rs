// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

use crate::{config::AppState, handlers, middleware::auth::auth_guard};

pub fn create_router(app_state: AppState) -> Router {
    // Rotas públicas (cadastro, login e dados de referência do formulário de cadastro)
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/subscriptions/plans", get(handlers::catalog::list_plans))
        .route("/subscriptions/plans/{plan_id}", get(handlers::catalog::get_plan))
        .route("/units", get(handlers::catalog::list_units))
        .route("/document-types", get(handlers::catalog::list_document_types));

    // Escopo da conta
    let account_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/auth/my-permissions", get(handlers::auth::my_permissions))
        .route("/navigation", get(handlers::navigation::get_navigation))
        .route("/roles", get(handlers::rbac::list_roles))
        .route("/roles/permissions", get(handlers::rbac::list_permissions))
        .route("/suppliers", get(handlers::catalog::list_suppliers))
        .route(
            "/ingredients",
            post(handlers::ingredients::create_ingredient).get(handlers::ingredients::list_ingredients),
        )
        .route("/ingredients/{ingredient_id}", get(handlers::ingredients::get_ingredient))
        .route("/restaurants", post(handlers::restaurants::create_restaurant))
        .route("/restaurants/my-restaurants", get(handlers::restaurants::my_restaurants));

    // Escopo do restaurante: tudo abaixo de /restaurants/{restaurant_id}
    let restaurant_routes = Router::new()
        .route(
            "/",
            get(handlers::restaurants::get_restaurant).put(handlers::restaurants::update_restaurant),
        )
        .route("/my-permissions", get(handlers::rbac::my_restaurant_permissions))
        .route("/members", post(handlers::rbac::assign_member))
        // Estoque
        .route("/inventory", get(handlers::inventory::list_inventory))
        .route("/inventory/activate", post(handlers::inventory::activate_ingredient))
        .route("/inventory/available", get(handlers::inventory::list_available_ingredients))
        .route("/inventory/{stock_id}/adjust", put(handlers::inventory::adjust_stock))
        .route("/inventory/{stock_id}/transactions", get(handlers::inventory::list_transactions))
        // Faturas de compra
        .route(
            "/invoices",
            post(handlers::invoices::register_invoice).get(handlers::invoices::list_invoices),
        )
        .route("/invoices/preview", post(handlers::invoices::preview_invoice))
        .route("/invoices/{invoice_id}", get(handlers::invoices::get_invoice))
        .route("/suppliers/{supplier_id}/items", get(handlers::invoices::list_supplier_items))
        // Menus
        .route(
            "/menus",
            get(handlers::menus::list_menus).post(handlers::menus::create_menu),
        )
        .route(
            "/menus/{menu_id}",
            put(handlers::menus::update_menu).delete(handlers::menus::delete_menu),
        )
        .route("/menus/{menu_id}/submenus", post(handlers::menus::create_submenu))
        .route(
            "/menus/{menu_id}/submenus/{submenu_id}",
            put(handlers::menus::update_submenu).delete(handlers::menus::delete_submenu),
        );

    let protected_routes = account_routes
        .nest("/restaurants/{restaurant_id}", restaurant_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, DataBackend},
        db::store::Stores,
    };
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config {
            data_backend: DataBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "router-test-secret".into(),
            jwt_expiration_days: 7,
            bcrypt_cost: 4,
            bind_addr: "127.0.0.1:0".into(),
            allow_negative_stock: false,
        };
        create_router(AppState::from_stores(config, Stores::memory()).unwrap())
    }

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn first_plan(app: &Router) -> String {
        let (_, plans) = call(app, Method::GET, "/api/subscriptions/plans", None, None).await;
        plans["data"][0]["id"].as_str().unwrap().to_string()
    }

    /// Cadastra e devolve o token.
    async fn register(app: &Router, email: &str, username: &str) -> String {
        let plan = first_plan(app).await;
        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": "super-secret",
                "username": username,
                "firstName": "Ana",
                "firstLastname": "Gómez",
                "phoneNumber": "3001234567",
                "subscriptionPlanId": plan,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_restaurant(app: &Router, token: &str, name: &str) -> String {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/restaurants",
            Some(token),
            Some(json!({ "name": name, "operationMode": "POSTPAID" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["data"]["role"], "Owner");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn unit_id(app: &Router, abbreviation: &str) -> String {
        let (_, units) = call(app, Method::GET, "/api/units", None, None).await;
        units["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|u| u["abbreviation"] == abbreviation)
            .map(|u| u["id"].as_str().unwrap().to_string())
            .unwrap()
    }

    /// Arroz (base g), comprado em bolsa de 1 kg por 1800, fornecedor criado na hora.
    async fn create_rice(app: &Router, token: &str) -> Value {
        let (_, docs) = call(app, Method::GET, "/api/document-types?countryCode=CO", None, None).await;
        let nit = docs["data"][0]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            app,
            Method::POST,
            "/api/ingredients",
            Some(token),
            Some(json!({
                "masterIngredient": { "name": "Arroz", "baseUnitId": unit_id(app, "g").await },
                "supplier": { "name": "Distribuidora La 14", "documentTypeId": nit, "documentNumber": "900123456" },
                "supplierItem": {
                    "purchaseUnitName": "Bolsa 1 kg",
                    "conversionFactor": 1,
                    "conversionUnitId": unit_id(app, "kg").await,
                    "totalPrice": 1800
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = test_app();
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let app = test_app();
        register(&app, "ana@example.com", "ana").await;

        let (status, login) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "super-secret" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["success"], true);
        let token = login["data"]["token"].as_str().unwrap();

        let (status, me) = call(&app, Method::GET, "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["data"]["email"], "ana@example.com");
        assert!(me["data"].get("passwordHash").is_none());

        let (status, perms) = call(&app, Method::GET, "/api/auth/my-permissions", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(perms["data"][0]["role"], "Owner");
        assert!(perms["data"][0]["restaurantId"].is_null());
    }

    #[tokio::test]
    async fn rejects_missing_or_bad_tokens_and_wrong_passwords() {
        let app = test_app();
        register(&app, "ana@example.com", "ana").await;

        let (status, body) = call(&app, Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, Method::GET, "/api/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_payload_reports_field_details_in_the_requested_language() {
        let app = test_app();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "es-CO,es;q=0.9")
            .body(Body::from(json!({ "email": "not-an-email", "password": "" }).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["password"].is_array());
        assert_ne!(body["errorMessage"], "One or more fields are invalid.");
    }

    #[tokio::test]
    async fn permission_guard_follows_the_member_role() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;

        let staff = register(&app, "staff@example.com", "staff").await;
        let inventory = format!("/api/restaurants/{restaurant}/inventory");

        // Dono de outra conta não entra
        let (status, body) = call(&app, Method::GET, &inventory, Some(&staff), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

        let members = format!("/api/restaurants/{restaurant}/members");
        let (status, _) = call(
            &app,
            Method::POST,
            &members,
            Some(&staff),
            Some(json!({ "email": "staff@example.com", "roleName": "Manager" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Garçom: sem INVENTORY
        let (status, _) = call(
            &app,
            Method::POST,
            &members,
            Some(&owner),
            Some(json!({ "email": "staff@example.com", "roleName": "Waiter" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::GET, &inventory, Some(&staff), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Chef: INVENTORY VIEW, mas não EDIT
        call(
            &app,
            Method::POST,
            &members,
            Some(&owner),
            Some(json!({ "email": "staff@example.com", "roleName": "Chef" })),
        )
        .await;
        let (status, _) = call(&app, Method::GET, &inventory, Some(&staff), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, entry) = call(
            &app,
            Method::GET,
            &format!("/api/restaurants/{restaurant}/my-permissions"),
            Some(&staff),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entry["data"]["role"], "Chef");

        // O dono não pode ser atribuído
        let (status, _) = call(
            &app,
            Method::POST,
            &members,
            Some(&owner),
            Some(json!({ "email": "staff@example.com", "roleName": "Owner" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_restaurant_is_not_found() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let uri = format!("/api/restaurants/{}/inventory", uuid::Uuid::new_v4());
        let (status, _) = call(&app, Method::GET, &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invoice_registration_updates_stock_and_history() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;
        let rice = create_rice(&app, &owner).await;
        let supplier_id = rice["supplierItem"]["supplierId"].as_str().unwrap().to_string();

        let (status, items) = call(
            &app,
            Method::GET,
            &format!("/api/restaurants/{restaurant}/suppliers/{supplier_id}/items"),
            Some(&owner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let item = &items["data"][0];
        assert_eq!(item["suggestedUnitPrice"].as_f64(), Some(1800.0));
        let item_id = item["id"].as_str().unwrap().to_string();

        let invoice = json!({
            "supplierId": supplier_id,
            "supplierInvoiceNumber": "FV-001",
            "emissionDate": "2026-10-01",
            "taxPercentage": 0,
            "items": [{
                "supplierItemId": item_id,
                "quantityPurchased": 3,
                "unitPricePurchased": 2000,
                "conversionFactorUsed": 1000
            }]
        });

        // Pré-visualização avisa do aumento de preço e não grava nada
        let (status, preview) = call(
            &app,
            Method::POST,
            &format!("/api/restaurants/{restaurant}/invoices/preview"),
            Some(&owner),
            Some(invoice.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{preview}");
        assert_eq!(preview["data"]["totalAmount"].as_f64(), Some(6000.0));
        assert_eq!(preview["data"]["advisories"].as_array().unwrap().len(), 1);

        let invoices_uri = format!("/api/restaurants/{restaurant}/invoices");
        let (status, registered) = call(&app, Method::POST, &invoices_uri, Some(&owner), Some(invoice.clone())).await;
        assert_eq!(status, StatusCode::CREATED, "{registered}");

        let (status, _) = call(&app, Method::POST, &invoices_uri, Some(&owner), Some(invoice)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // 3 bolsas x 1000 g
        let (_, stock) = call(
            &app,
            Method::GET,
            &format!("/api/restaurants/{restaurant}/inventory"),
            Some(&owner),
            None,
        )
        .await;
        let row = &stock["data"]["content"][0];
        assert_eq!(row["ingredientName"], "Arroz");
        assert_eq!(row["currentStock"].as_f64(), Some(3000.0));
        let stock_id = row["id"].as_str().unwrap().to_string();

        let (_, history) = call(
            &app,
            Method::GET,
            &format!("/api/restaurants/{restaurant}/inventory/{stock_id}/transactions"),
            Some(&owner),
            None,
        )
        .await;
        assert_eq!(history["data"]["content"][0]["reason"], "PURCHASE");
        assert_eq!(history["data"]["content"][0]["invoiceId"], registered["data"]["id"]);

        let (_, list) = call(&app, Method::GET, &invoices_uri, Some(&owner), None).await;
        assert_eq!(list["data"]["totalElements"], 1);
    }

    #[tokio::test]
    async fn stock_adjustments_write_history_newest_first() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;
        let rice = create_rice(&app, &owner).await;

        let (status, stock) = call(
            &app,
            Method::POST,
            &format!("/api/restaurants/{restaurant}/inventory/activate"),
            Some(&owner),
            Some(json!({ "masterIngredientId": rice["id"], "initialStock": 10, "minStock": 2 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{stock}");
        let stock_id = stock["data"]["id"].as_str().unwrap().to_string();
        let adjust = format!("/api/restaurants/{restaurant}/inventory/{stock_id}/adjust");

        let (status, waste) = call(
            &app,
            Method::PUT,
            &adjust,
            Some(&owner),
            Some(json!({ "mode": "DELTA", "value": -2.5, "reason": "WASTE", "notes": "derramado" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{waste}");
        assert_eq!(waste["data"]["previousStock"].as_f64(), Some(10.0));
        assert_eq!(waste["data"]["resultingStock"].as_f64(), Some(7.5));

        let (status, _) = call(
            &app,
            Method::PUT,
            &adjust,
            Some(&owner),
            Some(json!({ "mode": "DELTA", "value": -100, "reason": "WASTE" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::PUT,
            &adjust,
            Some(&owner),
            Some(json!({ "mode": "REPLACE", "value": 4, "reason": "SALE" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::PUT,
            &adjust,
            Some(&owner),
            Some(json!({ "mode": "REPLACE", "value": 4, "reason": "CORRECTION" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, history) = call(
            &app,
            Method::GET,
            &format!("/api/restaurants/{restaurant}/inventory/{stock_id}/transactions"),
            Some(&owner),
            None,
        )
        .await;
        let reasons: Vec<&str> = history["data"]["content"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["reason"].as_str().unwrap())
            .collect();
        assert_eq!(reasons, vec!["CORRECTION", "WASTE", "INITIAL"]);
        assert_eq!(history["data"]["content"][0]["resultingStock"].as_f64(), Some(4.0));
    }

    #[tokio::test]
    async fn navigation_is_filtered_by_scope() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;

        let (status, account) = call(&app, Method::GET, "/api/navigation", Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!account["data"].as_array().unwrap().is_empty());

        let staff = register(&app, "staff@example.com", "staff").await;
        call(
            &app,
            Method::POST,
            &format!("/api/restaurants/{restaurant}/members"),
            Some(&owner),
            Some(json!({ "email": "staff@example.com", "roleName": "Waiter" })),
        )
        .await;

        let uri = format!("/api/navigation?restaurantId={restaurant}");
        let (_, full) = call(&app, Method::GET, &uri, Some(&owner), None).await;
        let (_, waiter) = call(&app, Method::GET, &uri, Some(&staff), None).await;
        let count = |v: &Value| v["data"].as_array().unwrap().len();
        assert!(count(&waiter) < count(&full));
    }

    #[tokio::test]
    async fn menus_are_scoped_to_the_restaurant() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;
        let menus = format!("/api/restaurants/{restaurant}/menus");

        let (status, menu) = call(&app, Method::POST, &menus, Some(&owner), Some(json!({ "name": "  Bebidas " }))).await;
        assert_eq!(status, StatusCode::CREATED, "{menu}");
        assert_eq!(menu["data"]["name"], "Bebidas");
        let menu_id = menu["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::POST, &menus, Some(&owner), Some(json!({ "name": "bebidas" }))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, submenu) = call(
            &app,
            Method::POST,
            &format!("{menus}/{menu_id}/submenus"),
            Some(&owner),
            Some(json!({ "name": "Jugos" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(submenu["data"]["sortOrder"], 0);

        let (status, _) = call(&app, Method::DELETE, &format!("{menus}/{menu_id}"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, list) = call(&app, Method::GET, &menus, Some(&owner), None).await;
        assert!(list["data"].as_array().unwrap().is_empty());
    }

    /// Ingrediente extra do mesmo fornecedor. O preço vai como texto do formulário.
    async fn create_ingredient_for(app: &Router, token: &str, name: &str, supplier_id: &str) -> Value {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/ingredients",
            Some(token),
            Some(json!({
                "masterIngredient": { "name": name, "baseUnitId": unit_id(app, "g").await },
                "supplier": { "id": supplier_id },
                "supplierItem": {
                    "purchaseUnitName": "Bolsa 500 g",
                    "conversionFactor": 500,
                    "conversionUnitId": unit_id(app, "g").await,
                    "totalPrice": "2.500"
                }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"].clone()
    }

    #[tokio::test]
    async fn low_stock_flag_filter_and_stock_ordering() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;
        let rice = create_rice(&app, &owner).await;
        let supplier_id = rice["supplierItem"]["supplierId"].as_str().unwrap().to_string();
        let sugar = create_ingredient_for(&app, &owner, "Azúcar", &supplier_id).await;

        let detail_uri = format!("/api/ingredients/{}", sugar["id"].as_str().unwrap());
        let (_, detail) = call(&app, Method::GET, &detail_uri, Some(&owner), None).await;
        assert_eq!(detail["data"]["costPerBaseUnit"].as_f64(), Some(5.0), "{detail}");

        let activate = format!("/api/restaurants/{restaurant}/inventory/activate");
        // Arroz abaixo do mínimo, azúcar acima
        for (id, initial, min) in [(&rice["id"], 1, 5), (&sugar["id"], 20, 5)] {
            let (status, body) = call(
                &app,
                Method::POST,
                &activate,
                Some(&owner),
                Some(json!({ "masterIngredientId": id, "initialStock": initial, "minStock": min })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED, "{body}");
        }

        let inventory = format!("/api/restaurants/{restaurant}/inventory");
        let names = |v: &Value| -> Vec<String> {
            v["data"]["content"]
                .as_array()
                .unwrap()
                .iter()
                .map(|r| r["ingredientName"].as_str().unwrap().to_string())
                .collect()
        };

        let (status, all) = call(&app, Method::GET, &inventory, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        for row in all["data"]["content"].as_array().unwrap() {
            let low = row["currentStock"].as_f64() < row["minStock"].as_f64();
            assert_eq!(row["lowStock"].as_bool(), Some(low), "{row}");
        }

        let (_, low) = call(&app, Method::GET, &format!("{inventory}?lowStock=true"), Some(&owner), None).await;
        assert_eq!(names(&low), ["Arroz"]);
        assert_eq!(low["data"]["content"][0]["lowStock"], true);

        let (_, healthy) = call(&app, Method::GET, &format!("{inventory}?lowStock=false"), Some(&owner), None).await;
        assert_eq!(names(&healthy), ["Azúcar"]);

        let (_, by_stock) = call(
            &app,
            Method::GET,
            &format!("{inventory}?sortBy=stock&sortDesc=true"),
            Some(&owner),
            None,
        )
        .await;
        assert_eq!(names(&by_stock), ["Azúcar", "Arroz"]);

        let (_, ascending) = call(&app, Method::GET, &format!("{inventory}?sortBy=stock"), Some(&owner), None).await;
        assert_eq!(names(&ascending), ["Arroz", "Azúcar"]);

        let (status, far) = call(&app, Method::GET, &format!("{inventory}?page=9223372036854775807"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(far["data"]["content"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversized_invoice_lines_are_rejected() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;
        let rice = create_rice(&app, &owner).await;

        let invoice = json!({
            "supplierId": rice["supplierItem"]["supplierId"],
            "supplierInvoiceNumber": "FV-002",
            "emissionDate": "2026-10-01",
            "items": [{
                "supplierItemId": rice["supplierItem"]["id"],
                "quantityPurchased": 1e15,
                "unitPricePurchased": 1e15,
                "conversionFactorUsed": 1000
            }]
        });

        for uri in ["invoices/preview", "invoices"] {
            let (status, body) = call(
                &app,
                Method::POST,
                &format!("/api/restaurants/{restaurant}/{uri}"),
                Some(&owner),
                Some(invoice.clone()),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(body["success"], false);
            let details = body["details"].as_object().unwrap();
            assert!(details.keys().any(|k| k.starts_with("items[0].")), "{body}");
        }
    }

    #[tokio::test]
    async fn invoice_prices_accept_display_text_and_advisories_follow_the_locale() {
        let app = test_app();
        let owner = register(&app, "owner@example.com", "owner").await;
        let restaurant = create_restaurant(&app, &owner, "La Cocina").await;
        let rice = create_rice(&app, &owner).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/restaurants/{restaurant}/invoices/preview"))
            .header(header::AUTHORIZATION, format!("Bearer {owner}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "es-CO")
            .body(Body::from(
                json!({
                    "supplierId": rice["supplierItem"]["supplierId"],
                    "supplierInvoiceNumber": "FV-003",
                    "emissionDate": "2026-10-01",
                    "taxPercentage": 0,
                    "items": [{
                        "supplierItemId": rice["supplierItem"]["id"],
                        "quantityPurchased": 1,
                        "unitPricePurchased": "2.000",
                        "conversionFactorUsed": 1000
                    }]
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let preview: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(preview["data"]["totalAmount"].as_f64(), Some(2000.0));
        let message = preview["data"]["advisories"][0]["message"].as_str().unwrap();
        assert!(message.starts_with("El precio subió 11.1%"), "{message}");
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let app = test_app();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "pt-BR")
            .body(Body::from(r#"{"email": 5"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["timestamp"].is_string());
        assert_eq!(
            body["errorMessage"],
            "O corpo da requisição não é um JSON válido para esta operação."
        );
        assert!(body["details"]["body"][0].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": 5, "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}

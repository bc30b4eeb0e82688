// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers::{api, auth, customers, pages, products},
    middleware::auth::{api_guard, auth_gate},
};

pub fn build_router(app_state: AppState) -> Router {
    // Páginas protegidas pelo portão (redirecionam para /login)
    let page_routes = Router::new()
        .route("/", get(pages::dashboard))
        .route(
            "/customers",
            get(customers::customers_page).post(customers::create_customer),
        )
        .route("/customers/{id}", post(customers::update_customer))
        .route(
            "/products",
            get(products::products_page).post(products::create_product),
        )
        .route("/products/{id}", post(products::update_product))
        .route("/inventory", get(pages::inventory))
        .route("/sales", get(pages::sales))
        .route("/purchases", get(pages::purchases))
        .route("/accounting", get(pages::accounting))
        .route("/payroll", get(pages::payroll))
        .route("/reports", get(pages::reports))
        .route("/documents", get(pages::documents))
        .route("/settings", get(pages::settings))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_gate,
        ));

    // API JSON protegida (responde 401)
    let api_routes = Router::new()
        .route(
            "/api/customers",
            get(api::list_customers).post(api::create_customer),
        )
        .route("/api/customers/{id}", axum::routing::put(api::update_customer))
        .route(
            "/api/products",
            get(api::list_products).post(api::create_product),
        )
        .route("/api/products/{id}", axum::routing::put(api::update_product))
        .route(
            "/api/stock-movements",
            get(api::list_stock_movements).post(api::create_stock_movement),
        )
        .route("/api/sales-orders", get(api::list_sales_orders))
        .route("/api/sales-orders/{id}/items", get(api::list_sales_order_items))
        .route("/api/purchase-orders", get(api::list_purchase_orders))
        .route(
            "/api/purchase-orders/{id}/items",
            get(api::list_purchase_order_items),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            api_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(auth::api_login))
        .merge(page_routes)
        .merge(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common::error::ApiError;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::api_login,

        // --- Customers ---
        handlers::api::list_customers,
        handlers::api::create_customer,
        handlers::api::update_customer,

        // --- Products ---
        handlers::api::list_products,
        handlers::api::create_product,
        handlers::api::update_product,

        // --- Inventory ---
        handlers::api::list_stock_movements,
        handlers::api::create_stock_movement,

        // --- Orders ---
        handlers::api::list_sales_orders,
        handlers::api::list_sales_order_items,
        handlers::api::list_purchase_orders,
        handlers::api::list_purchase_order_items,
    ),
    components(
        schemas(
            ApiError,

            // --- Auth ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- CRM ---
            models::crm::CustomerStatus,
            models::crm::Customer,
            models::crm::NewCustomer,
            models::crm::CustomerChanges,

            // --- Inventory ---
            models::inventory::Product,
            models::inventory::NewProduct,
            models::inventory::ProductChanges,
            models::inventory::MovementType,
            models::inventory::ReferenceType,
            models::inventory::NamedRef,
            models::inventory::StockMovement,
            models::inventory::NewStockMovement,

            // --- Orders ---
            models::operations::SalesOrderStatus,
            models::operations::PurchaseOrderStatus,
            models::operations::SalesOrder,
            models::operations::SalesOrderItem,
            models::operations::PurchaseOrder,
            models::operations::PurchaseOrderItem,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Customers", description = "Clientes (CRM)"),
        (name = "Products", description = "Catálogo de Produtos"),
        (name = "Inventory", description = "Movimentações de Estoque"),
        (name = "Orders", description = "Pedidos de Venda e de Compra (somente leitura)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

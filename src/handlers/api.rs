// src/handlers/api.rs
//
// API JSON sobre os mesmos hooks das páginas.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError, SharedError},
    config::AppState,
    hooks::{
        use_customers, use_inventory, use_products, use_purchase_order_items, use_purchase_orders,
        use_sales_order_items, use_sales_orders, HookState,
    },
    middleware::auth::CurrentSession,
    models::{
        crm::{Customer, CustomerChanges, NewCustomer},
        inventory::{NewProduct, NewStockMovement, Product, ProductChanges, StockMovement},
        operations::{PurchaseOrder, PurchaseOrderItem, SalesOrder, SalesOrderItem},
    },
};

// Estado do hook -> resposta: erro da lista vira ApiError, senão as linhas.
fn into_rows<T>(state: HookState<T>) -> Result<Json<Vec<T>>, ApiError> {
    if let Some(err) = state.error {
        return Err(err.into());
    }
    Ok(Json(state.data.unwrap_or_default()))
}

fn shared(err: SharedError) -> ApiError {
    ApiError::from(err)
}

// --- CLIENTES ---

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses(
        (status = 200, description = "Clientes da empresa, por nome", body = Vec<Customer>),
        (status = 502, description = "Serviço remoto falhou", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Customer>>, ApiError> {
    into_rows(use_customers(&app_state, &session).load().await)
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = NewCustomer,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<NewCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = use_customers(&app_state, &session)
        .create(payload)
        .await
        .map_err(shared)?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    request_body = CustomerChanges,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Nenhuma linha (ou mais de uma) para o filtro", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerChanges>,
) -> Result<Json<Customer>, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = use_customers(&app_state, &session)
        .update(id, payload)
        .await
        .map_err(shared)?;

    Ok(Json(customer))
}

// --- PRODUTOS ---

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    responses(
        (status = 200, description = "Produtos da empresa, por nome", body = Vec<Product>),
        (status = 502, description = "Serviço remoto falhou", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<Product>>, ApiError> {
    into_rows(use_products(&app_state, &session).load().await)
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = NewProduct,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = use_products(&app_state, &session)
        .create(payload)
        .await
        .map_err(shared)?;

    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    request_body = ProductChanges,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Nenhuma linha (ou mais de uma) para o filtro", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductChanges>,
) -> Result<Json<Product>, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = use_products(&app_state, &session)
        .update(id, payload)
        .await
        .map_err(shared)?;

    Ok(Json(product))
}

// --- ESTOQUE ---

// GET /api/stock-movements
#[utoipa::path(
    get,
    path = "/api/stock-movements",
    tag = "Inventory",
    responses(
        (status = 200, description = "Movimentações, mais recentes primeiro", body = Vec<StockMovement>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_stock_movements(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    into_rows(use_inventory(&app_state, &session).load().await)
}

// POST /api/stock-movements
#[utoipa::path(
    post,
    path = "/api/stock-movements",
    tag = "Inventory",
    request_body = NewStockMovement,
    responses(
        (status = 201, description = "Movimentação registrada", body = StockMovement),
        (status = 400, description = "Dados inválidos", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_stock_movement(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<NewStockMovement>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let movement = use_inventory(&app_state, &session)
        .create(payload)
        .await
        .map_err(shared)?;

    Ok((StatusCode::CREATED, Json(movement)))
}

// --- PEDIDOS ---

// GET /api/sales-orders
#[utoipa::path(
    get,
    path = "/api/sales-orders",
    tag = "Orders",
    responses((status = 200, description = "Pedidos de venda", body = Vec<SalesOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_sales_orders(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<SalesOrder>>, ApiError> {
    into_rows(use_sales_orders(&app_state, &session).load().await)
}

// GET /api/sales-orders/{id}/items
#[utoipa::path(
    get,
    path = "/api/sales-orders/{id}/items",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido de venda")),
    responses(
        (status = 200, description = "Itens do pedido", body = Vec<SalesOrderItem>),
        (status = 404, description = "Pedido inexistente ou de outra empresa", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales_order_items(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SalesOrderItem>>, ApiError> {
    into_rows(use_sales_order_items(&app_state, &session, id).load().await)
}

// GET /api/purchase-orders
#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    tag = "Orders",
    responses((status = 200, description = "Pedidos de compra", body = Vec<PurchaseOrder>)),
    security(("api_jwt" = []))
)]
pub async fn list_purchase_orders(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<PurchaseOrder>>, ApiError> {
    into_rows(use_purchase_orders(&app_state, &session).load().await)
}

// GET /api/purchase-orders/{id}/items
#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}/items",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido de compra")),
    responses(
        (status = 200, description = "Itens do pedido", body = Vec<PurchaseOrderItem>),
        (status = 404, description = "Pedido inexistente ou de outra empresa", body = ApiError)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_purchase_order_items(
    State(app_state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PurchaseOrderItem>>, ApiError> {
    into_rows(use_purchase_order_items(&app_state, &session, id).load().await)
}

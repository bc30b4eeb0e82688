// src/hooks/orders.rs
//
// Pedidos são somente leitura: lista de cabeçalhos e itens de um pedido.

use uuid::Uuid;

use crate::{
    config::AppState,
    db::{Order, Table},
    hooks::resource::{ParentScope, Resource, ResourceHook},
    models::{
        auth::Session,
        operations::{PurchaseOrder, PurchaseOrderItem, SalesOrder, SalesOrderItem},
    },
};

impl Resource for SalesOrder {
    const TABLE: Table = Table::SalesOrders;
    const KEY: &'static str = "sales_orders";

    fn order() -> Order {
        Order::desc("order_date")
    }
}

// Itens não têm `company_id`: o pedido pai precisa ser da empresa da sessão.
impl Resource for SalesOrderItem {
    const TABLE: Table = Table::SalesOrderItems;
    const KEY: &'static str = "sales_order_items";
    const TENANT_SCOPED: bool = false;
    const PARENT: Option<ParentScope> = Some(ParentScope { table: Table::SalesOrders, foreign_key: "order_id" });

    fn order() -> Order {
        Order::asc("created_at")
    }
}

impl Resource for PurchaseOrder {
    const TABLE: Table = Table::PurchaseOrders;
    const KEY: &'static str = "purchase_orders";

    fn order() -> Order {
        Order::desc("order_date")
    }
}

impl Resource for PurchaseOrderItem {
    const TABLE: Table = Table::PurchaseOrderItems;
    const KEY: &'static str = "purchase_order_items";
    const TENANT_SCOPED: bool = false;
    const PARENT: Option<ParentScope> = Some(ParentScope { table: Table::PurchaseOrders, foreign_key: "po_id" });

    fn order() -> Order {
        Order::asc("created_at")
    }
}

pub type SalesOrdersHook = ResourceHook<SalesOrder>;
pub type PurchaseOrdersHook = ResourceHook<PurchaseOrder>;

pub fn use_sales_orders(app_state: &AppState, session: &Session) -> SalesOrdersHook {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
}

pub fn use_sales_order_items(
    app_state: &AppState,
    session: &Session,
    order_id: Uuid,
) -> ResourceHook<SalesOrderItem> {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
        .with_filter("order_id", order_id)
}

pub fn use_purchase_orders(app_state: &AppState, session: &Session) -> PurchaseOrdersHook {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
}

pub fn use_purchase_order_items(
    app_state: &AppState,
    session: &Session,
    po_id: Uuid,
) -> ResourceHook<PurchaseOrderItem> {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
        .with_filter("po_id", po_id)
}

// src/hooks/inventory.rs

use serde_json::{Map, Value};

use crate::{
    config::AppState,
    db::{Embed, Order, Table},
    hooks::resource::{Creatable, Resource, ResourceHook},
    models::{
        auth::Session,
        inventory::{NewStockMovement, Product, StockMovement},
    },
};

impl Resource for StockMovement {
    const TABLE: Table = Table::StockMovements;
    const KEY: &'static str = "stock_movements";

    // Mais recentes primeiro.
    fn order() -> Order {
        Order::desc("created_at")
    }

    fn embeds() -> Vec<Embed> {
        vec![
            Embed { alias: "product", table: Table::Products, foreign_key: "product_id", columns: &["name"] },
            Embed { alias: "warehouse", table: Table::Warehouses, foreign_key: "warehouse_id", columns: &["name"] },
            Embed {
                alias: "location",
                table: Table::WarehouseLocations,
                foreign_key: "location_id",
                columns: &["name"],
            },
        ]
    }

    // Uma movimentação mexe no saldo exibido em produtos.
    fn invalidated_keys() -> Vec<&'static str> {
        vec![Self::KEY, <Product as Resource>::KEY]
    }
}

impl Creatable for StockMovement {
    type New = NewStockMovement;

    fn stamp(row: &mut Map<String, Value>, session: &Session) {
        row.insert("company_id".into(), Value::String(session.company_id.to_string()));
        row.insert("created_by".into(), Value::String(session.user_id.to_string()));
    }
}

pub type InventoryHook = ResourceHook<StockMovement>;

pub fn use_inventory(app_state: &AppState, session: &Session) -> InventoryHook {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
}

// src/hooks/products.rs

use crate::{
    config::AppState,
    db::{Order, Table},
    hooks::resource::{Creatable, Editable, Resource, ResourceHook},
    models::{
        auth::Session,
        inventory::{NewProduct, Product, ProductChanges},
    },
};

impl Resource for Product {
    const TABLE: Table = Table::Products;
    const KEY: &'static str = "products";

    fn order() -> Order {
        Order::asc("name")
    }
}

impl Creatable for Product {
    type New = NewProduct;
}

impl Editable for Product {
    type Changes = ProductChanges;
}

pub type ProductsHook = ResourceHook<Product>;

pub fn use_products(app_state: &AppState, session: &Session) -> ProductsHook {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn new_product(code: &str, name: &str) -> NewProduct {
        NewProduct {
            code: code.into(),
            name: name.into(),
            description: None,
            unit_price: Decimal::new(1990, 2),
            stock_quantity: Decimal::new(5, 0),
        }
    }

    #[tokio::test]
    async fn loading_while_a_mutation_is_in_flight() {
        let ctx = TestContext::gated().await;
        let hook = Arc::new(use_products(&ctx.app_state, &ctx.session));

        let first = hook.load().await;
        assert!(!first.is_loading);

        let running = {
            let hook = hook.clone();
            tokio::spawn(async move { hook.create(new_product("P-1", "Caneta")).await })
        };

        ctx.wait_for_blocked_write().await;
        assert!(hook.state().is_loading);

        ctx.release_writes();
        running.await.unwrap().unwrap();
        assert!(!hook.state().is_loading);
    }

    #[tokio::test]
    async fn loading_while_the_list_is_fetching() {
        let ctx = TestContext::gated_reads().await;
        let hook = Arc::new(use_products(&ctx.app_state, &ctx.session));
        assert!(!hook.state().is_loading);

        let running = {
            let hook = hook.clone();
            tokio::spawn(async move { hook.load().await })
        };

        ctx.wait_for_blocked_read().await;
        let during = hook.state();
        assert!(during.is_loading);
        assert!(during.data.is_none());

        ctx.release_reads();
        let done = running.await.unwrap();
        assert!(!done.is_loading);
        assert_eq!(done.data.map(|rows| rows.len()), Some(0));
        assert!(!hook.state().is_loading);
    }

    #[tokio::test]
    async fn update_round_trips_decimal_fields() {
        let ctx = TestContext::new().await;
        let hook = use_products(&ctx.app_state, &ctx.session);
        let created = hook.create(new_product("P-2", "Caderno")).await.unwrap();

        let updated = hook
            .update(
                created.id,
                ProductChanges {
                    unit_price: Some(Decimal::new(2550, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.unit_price, Decimal::new(2550, 2));
        assert_eq!(updated.stock_quantity, Decimal::new(5, 0));
        assert_eq!(updated.code, "P-2");
    }
}

// src/hooks/customers.rs

use crate::{
    config::AppState,
    db::{Order, Table},
    hooks::resource::{Creatable, Editable, Resource, ResourceHook},
    models::{
        auth::Session,
        crm::{Customer, CustomerChanges, NewCustomer},
    },
};

impl Resource for Customer {
    const TABLE: Table = Table::Customers;
    const KEY: &'static str = "customers";

    fn order() -> Order {
        Order::asc("name")
    }
}

impl Creatable for Customer {
    type New = NewCustomer;
}

impl Editable for Customer {
    type Changes = CustomerChanges;
}

pub type CustomersHook = ResourceHook<Customer>;

pub fn use_customers(app_state: &AppState, session: &Session) -> CustomersHook {
    ResourceHook::new(app_state.query_client.clone(), app_state.store.clone(), session.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::{CacheEvent, QueryKey},
        db::RemoteError,
        common::error::AppError,
        models::crm::CustomerStatus,
        test_support::{customer_row, TestContext},
    };
    use rust_decimal::Decimal;

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            tax_id: None,
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: None,
            address: None,
            status: CustomerStatus::Active,
            account_balance: Decimal::ZERO,
            salesperson_id: None,
        }
    }

    #[tokio::test]
    async fn lists_only_the_tenant_rows_ordered_by_name() {
        let ctx = TestContext::new().await;
        ctx.memory
            .seed(
                Table::Customers,
                vec![
                    customer_row(ctx.session.company_id, "Zeta"),
                    customer_row(ctx.session.company_id, "Alfa"),
                    customer_row(uuid::Uuid::new_v4(), "Outra Empresa"),
                ],
            )
            .await;

        let state = use_customers(&ctx.app_state, &ctx.session).load().await;

        let names: Vec<_> = state.data.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Alfa", "Zeta"]);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn create_stamps_tenant_and_invalidates_list_once() {
        let ctx = TestContext::new().await;
        let hook = use_customers(&ctx.app_state, &ctx.session);
        hook.load().await;
        let mut events = ctx.app_state.query_client.subscribe();

        let created = hook.create(new_customer("Padaria")).await.unwrap();

        assert_eq!(created.company_id, ctx.session.company_id);
        assert_eq!(created.status, CustomerStatus::Active);

        let expected = QueryKey::new(["customers".to_string(), ctx.session.company_id.to_string()]);
        let mut invalidations = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let CacheEvent::Invalidated { prefix, .. } = event {
                invalidations.push(prefix);
            }
        }
        assert_eq!(invalidations, vec![expected]);

        let names: Vec<_> = hook.load().await.data.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Padaria"]);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let ctx = TestContext::new().await;
        let hook = use_customers(&ctx.app_state, &ctx.session);
        let created = hook.create(new_customer("Mercado")).await.unwrap();

        let updated = hook
            .update(
                created.id,
                CustomerChanges {
                    status: Some(CustomerStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, CustomerStatus::Inactive);
        assert_eq!(updated.name, "Mercado");
        assert_eq!(updated.email, created.email);
    }

    #[tokio::test]
    async fn update_cannot_reach_another_tenant() {
        let ctx = TestContext::new().await;
        let foreign = customer_row(uuid::Uuid::new_v4(), "Alheio");
        let foreign_id = uuid::Uuid::parse_str(foreign["id"].as_str().unwrap()).unwrap();
        ctx.memory.seed(Table::Customers, vec![foreign]).await;

        let hook = use_customers(&ctx.app_state, &ctx.session);
        let err = hook
            .update(
                foreign_id,
                CustomerChanges {
                    name: Some("Invadido".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), AppError::Remote(RemoteError::NotSingle { rows: 0, .. })));
        // O erro da mutação aparece no estado combinado.
        assert!(hook.state().error.is_some());
        let rows = ctx.memory.rows(Table::Customers).await;
        assert_eq!(rows[0]["name"], "Alheio");
    }

    #[tokio::test]
    async fn list_error_is_surfaced() {
        let ctx = TestContext::failing().await;

        let state = use_customers(&ctx.app_state, &ctx.session).load().await;

        assert!(state.data.is_none());
        assert!(!state.is_loading);
        assert!(matches!(
            state.error.as_deref(),
            Some(AppError::Remote(RemoteError::Unavailable(_)))
        ));
    }
}

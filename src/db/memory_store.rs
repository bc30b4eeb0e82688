// src/db/memory_store.rs

use std::{cmp::Ordering, collections::HashMap};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::{
    check_column, expect_object, value_text, Filter, InsertQuery, Order, RemoteError, RemoteStore,
    SelectQuery, Table, UpdateQuery,
};

/// Backend em memória com a mesma semântica do `PgStore`.
/// Preenche `id`, `created_at` e `updated_at` como os defaults do banco fariam.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere linhas prontas, sem passar pelos defaults.
    pub async fn seed(&self, table: Table, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.write().await;
        tables.entry(table).or_default().extend(rows);
    }

    pub async fn rows(&self, table: Table) -> Vec<Value> {
        let tables = self.tables.read().await;
        tables.get(&table).cloned().unwrap_or_default()
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| {
        let cell = row.get(&f.column).unwrap_or(&Value::Null);
        value_text(cell) == value_text(&f.value)
    })
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => value_text(a).cmp(&value_text(b)),
    }
}

// Postgres: NULLS LAST em ASC, NULLS FIRST em DESC.
fn sort_rows(rows: &mut [Value], order: Order) {
    rows.sort_by(|a, b| {
        let a = a.get(order.column).unwrap_or(&Value::Null);
        let b = b.get(order.column).unwrap_or(&Value::Null);
        let ord = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare_cells(a, b),
        };
        if order.ascending { ord } else { ord.reverse() }
    });
}

fn check_keys(row: &Map<String, Value>) -> Result<(), RemoteError> {
    for key in row.keys() {
        check_column(key)?;
    }
    Ok(())
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        for f in &query.filters {
            check_column(&f.column)?;
        }

        let tables = self.tables.read().await;
        let empty = Vec::new();
        let source = tables.get(&query.table).unwrap_or(&empty);

        let mut rows: Vec<Value> = source
            .iter()
            .filter(|row| matches(row, &query.filters))
            .cloned()
            .collect();

        if let Some(order) = query.order {
            check_column(order.column)?;
            sort_rows(&mut rows, order);
        }

        for embed in &query.embeds {
            let related = tables.get(&embed.table).unwrap_or(&empty);
            for row in rows.iter_mut() {
                let key = row.get(embed.foreign_key).and_then(value_text);
                let found = key.and_then(|key| {
                    related
                        .iter()
                        .find(|r| r.get("id").and_then(value_text).as_deref() == Some(key.as_str()))
                });

                let embedded = match found {
                    Some(target) => {
                        let mut obj = Map::new();
                        for col in embed.columns {
                            obj.insert(col.to_string(), target.get(*col).cloned().unwrap_or(Value::Null));
                        }
                        Value::Object(obj)
                    }
                    None => Value::Null,
                };

                if let Some(obj) = row.as_object_mut() {
                    obj.insert(embed.alias.to_string(), embedded);
                }
            }
        }

        Ok(rows)
    }

    async fn insert(&self, query: &InsertQuery) -> Result<Value, RemoteError> {
        let mut row = expect_object(&query.row, "A linha")?.clone();
        check_keys(&row)?;

        let now = Value::String(Utc::now().to_rfc3339());
        row.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("created_at").or_insert_with(|| now.clone());
        row.entry("updated_at").or_insert(now);

        let row = Value::Object(row);
        let mut tables = self.tables.write().await;
        tables.entry(query.table).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, query: &UpdateQuery) -> Result<Value, RemoteError> {
        let changes = expect_object(&query.changes, "As alterações")?;
        if changes.is_empty() {
            return Err(RemoteError::InvalidPayload("Nenhuma coluna para atualizar".into()));
        }
        check_keys(changes)?;
        for f in &query.filters {
            check_column(&f.column)?;
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(query.table).or_default();
        let hits: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches(row, &query.filters))
            .map(|(i, _)| i)
            .collect();

        if hits.len() != 1 {
            return Err(RemoteError::NotSingle { table: query.table.name(), rows: hits.len() });
        }

        let target = &mut rows[hits[0]];
        if let Some(obj) = target.as_object_mut() {
            for (k, v) in changes {
                obj.insert(k.clone(), v.clone());
            }
            if !changes.contains_key("updated_at") {
                obj.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
            }
        }
        Ok(target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{Embed, Scope};
    use serde_json::json;

    #[tokio::test]
    async fn select_filters_and_orders() {
        let store = MemoryStore::new();
        let tenant = Uuid::new_v4().to_string();
        store
            .seed(
                Table::Customers,
                vec![
                    json!({"id": "1", "company_id": tenant, "name": "Zeta"}),
                    json!({"id": "2", "company_id": tenant, "name": "Alfa"}),
                    json!({"id": "3", "company_id": "outra", "name": "Beta"}),
                ],
            )
            .await;

        let rows = store
            .select(
                &SelectQuery::from(Table::Customers)
                    .eq("company_id", tenant.clone())
                    .order(Order::asc("name")),
            )
            .await
            .unwrap();

        let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Alfa", "Zeta"]);
    }

    #[tokio::test]
    async fn descending_order_puts_nulls_first() {
        let store = MemoryStore::new();
        store
            .seed(
                Table::Products,
                vec![
                    json!({"id": "a", "unit_price": 10}),
                    json!({"id": "b", "unit_price": null}),
                    json!({"id": "c", "unit_price": 2.5}),
                ],
            )
            .await;

        let rows = store
            .select(&SelectQuery::from(Table::Products).order(Order::desc("unit_price")))
            .await
            .unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn embeds_related_names() {
        let store = MemoryStore::new();
        store.seed(Table::Products, vec![json!({"id": "p1", "name": "Café"})]).await;
        store
            .seed(
                Table::StockMovements,
                vec![
                    json!({"id": "m1", "product_id": "p1"}),
                    json!({"id": "m2", "product_id": "desconhecido"}),
                ],
            )
            .await;

        let rows = store
            .select(&SelectQuery::from(Table::StockMovements).embed(Embed {
                alias: "product",
                table: Table::Products,
                foreign_key: "product_id",
                columns: &["name"],
            }))
            .await
            .unwrap();

        assert_eq!(rows[0]["product"], json!({"name": "Café"}));
        assert_eq!(rows[1]["product"], Value::Null);
    }

    #[tokio::test]
    async fn insert_fills_defaults() {
        let store = MemoryStore::new();
        let row = store
            .insert(&InsertQuery {
                table: Table::Products,
                scope: Scope::anonymous(),
                row: json!({"code": "P-1", "name": "Caneta"}),
            })
            .await
            .unwrap();

        assert!(Uuid::parse_str(row["id"].as_str().unwrap()).is_ok());
        assert!(row["created_at"].is_string());
        assert_eq!(store.rows(Table::Products).await.len(), 1);
    }

    #[tokio::test]
    async fn update_requires_exactly_one_row() {
        let store = MemoryStore::new();
        store
            .seed(
                Table::Customers,
                vec![
                    json!({"id": "1", "status": "active", "name": "A"}),
                    json!({"id": "2", "status": "active", "name": "B"}),
                ],
            )
            .await;

        let many = UpdateQuery::new(Table::Customers, Scope::anonymous(), json!({"name": "X"}))
            .eq("status", "active");
        let err = store.update(&many).await.unwrap_err();
        assert!(matches!(err, RemoteError::NotSingle { rows: 2, .. }));

        let none = UpdateQuery::new(Table::Customers, Scope::anonymous(), json!({"name": "X"}))
            .eq("id", "99");
        assert!(matches!(
            store.update(&none).await.unwrap_err(),
            RemoteError::NotSingle { rows: 0, .. }
        ));

        // Nada mudou nas tentativas que falharam.
        let rows = store.rows(Table::Customers).await;
        assert!(rows.iter().all(|r| r["name"] != "X"));

        let one = UpdateQuery::new(Table::Customers, Scope::anonymous(), json!({"name": "Novo"}))
            .eq("id", "2");
        let updated = store.update(&one).await.unwrap();
        assert_eq!(updated["name"], "Novo");
        assert_eq!(updated["status"], "active");
    }

    #[tokio::test]
    async fn rejects_unsafe_columns() {
        let store = MemoryStore::new();
        let err = store
            .insert(&InsertQuery {
                table: Table::Customers,
                scope: Scope::anonymous(),
                row: json!({"name); --": "x"}),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RemoteError::InvalidColumn(_)));
    }
}

// src/db/pg_store.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::db::store::{
    check_column, expect_object, value_text, Filter, InsertQuery, RemoteError, RemoteStore, Scope,
    SelectQuery, UpdateQuery,
};

// O serviço remoto é um Postgres: cada linha sai como `to_jsonb(t.*)`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Helper RLS: abre a transação e define as variáveis de sessão.
    // ---
    async fn begin_scoped(&self, scope: &Scope) -> Result<Transaction<'static, Postgres>, RemoteError> {
        // Falha ao obter conexão = serviço fora do ar, não erro de consulta.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        if let Some(tenant_id) = scope.tenant_id {
            sqlx::query("SELECT set_config('app.tenant_id', $1, true)")
                .bind(tenant_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        if let Some(user_id) = scope.user_id {
            sqlx::query("SELECT set_config('app.user_id', $1, true)")
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await?;
        }

        Ok(tx)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &[Filter]) -> Result<(), RemoteError> {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        let column = check_column(&filter.column)?;

        match value_text(&filter.value) {
            Some(text) => {
                builder.push(format!("t.{}::text = ", column));
                builder.push_bind(text);
            }
            None => {
                builder.push(format!("t.{} IS NULL", column));
            }
        }
    }
    Ok(())
}

fn column_list(row: &serde_json::Map<String, Value>) -> Result<Vec<&str>, RemoteError> {
    row.keys().map(|k| check_column(k)).collect()
}

// UPDATE ... FROM jsonb_populate_record; `updated_at` é carimbado pelo banco
// quando as alterações não trazem um valor próprio.
fn update_builder(query: &UpdateQuery) -> Result<QueryBuilder<'static, Postgres>, RemoteError> {
    let changes = expect_object(&query.changes, "As alterações")?;
    let columns = column_list(changes)?;
    if columns.is_empty() {
        return Err(RemoteError::InvalidPayload("Nenhuma coluna para atualizar".into()));
    }
    let table = query.table.name();

    let mut assignments: Vec<String> = columns.iter().map(|c| format!("{c} = r.{c}")).collect();
    if !columns.contains(&"updated_at") {
        assignments.push("updated_at = now()".to_string());
    }
    let assignments = assignments.join(", ");

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "UPDATE {table} AS t SET {assignments} FROM jsonb_populate_record(NULL::{table}, "
    ));
    builder.push_bind(query.changes.clone());
    builder.push(") AS r");
    push_filters(&mut builder, &query.filters)?;
    builder.push(" RETURNING to_jsonb(t.*)");
    Ok(builder)
}

#[async_trait]
impl RemoteStore for PgStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT to_jsonb(t.*)");

        for (i, embed) in query.embeds.iter().enumerate() {
            let fk = check_column(embed.foreign_key)?;
            let fields = embed
                .columns
                .iter()
                .map(|c| check_column(c).map(|c| format!("'{c}', e{i}.{c}")))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");

            builder.push(format!(
                " || jsonb_build_object('{alias}', (SELECT jsonb_build_object({fields}) FROM {table} e{i} WHERE e{i}.id = t.{fk}))",
                alias = check_column(embed.alias)?,
                table = embed.table.name(),
            ));
        }

        builder.push(format!(" FROM {} t", query.table.name()));
        push_filters(&mut builder, &query.filters)?;

        if let Some(order) = query.order {
            builder.push(format!(
                " ORDER BY t.{} {}",
                check_column(order.column)?,
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }

        let mut tx = self.begin_scoped(&query.scope).await?;
        let rows = builder
            .build_query_scalar::<Value>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(table = query.table.name(), rows = rows.len(), "select");
        Ok(rows)
    }

    async fn insert(&self, query: &InsertQuery) -> Result<Value, RemoteError> {
        let row = expect_object(&query.row, "A linha")?;
        let columns = column_list(row)?;
        let table = query.table.name();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!("INSERT INTO {} AS t", table));
        if columns.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            let list = columns.join(", ");
            builder.push(format!(" ({list}) SELECT {list} FROM jsonb_populate_record(NULL::{table}, "));
            builder.push_bind(query.row.clone());
            builder.push(")");
        }
        builder.push(" RETURNING to_jsonb(t.*)");

        let mut tx = self.begin_scoped(&query.scope).await?;
        let inserted = builder
            .build_query_scalar::<Value>()
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(table, "insert");
        Ok(inserted)
    }

    async fn update(&self, query: &UpdateQuery) -> Result<Value, RemoteError> {
        let table = query.table.name();
        let mut builder = update_builder(query)?;

        let mut tx = self.begin_scoped(&query.scope).await?;
        let mut rows = builder
            .build_query_scalar::<Value>()
            .fetch_all(&mut *tx)
            .await?;

        // `.single()`: qualquer coisa diferente de uma linha desfaz a transação (drop).
        if rows.len() != 1 {
            return Err(RemoteError::NotSingle { table, rows: rows.len() });
        }
        tx.commit().await?;

        tracing::debug!(table, "update");
        Ok(rows.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::Table;
    use serde_json::json;
    use uuid::Uuid;

    fn scope() -> Scope {
        Scope::new(Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn update_stamps_updated_at_when_missing() {
        let query = UpdateQuery::new(Table::Customers, scope(), json!({"name": "Ana"})).eq("id", "c1");

        let builder = update_builder(&query).unwrap();

        assert_eq!(
            builder.sql(),
            "UPDATE customers AS t SET name = r.name, updated_at = now() \
             FROM jsonb_populate_record(NULL::customers, $1) AS r WHERE t.id::text = $2 \
             RETURNING to_jsonb(t.*)"
        );
    }

    #[test]
    fn update_keeps_explicit_updated_at() {
        let query = UpdateQuery::new(
            Table::Products,
            scope(),
            json!({"price": 10, "updated_at": "2024-01-01T00:00:00Z"}),
        );

        let sql = update_builder(&query).unwrap().sql().to_string();

        assert!(sql.contains("updated_at = r.updated_at"));
        assert!(!sql.contains("now()"));
    }

    #[test]
    fn empty_update_is_rejected() {
        let query = UpdateQuery::new(Table::Customers, scope(), json!({}));

        assert!(matches!(update_builder(&query), Err(RemoteError::InvalidPayload(_))));
    }
}

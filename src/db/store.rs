// src/db/store.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

// --- TABELAS ---

// Só estas tabelas existem no serviço remoto; o nome nunca vem do usuário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Customers,
    Products,
    StockMovements,
    Warehouses,
    WarehouseLocations,
    SalesOrders,
    SalesOrderItems,
    PurchaseOrders,
    PurchaseOrderItems,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Customers => "customers",
            Table::Products => "products",
            Table::StockMovements => "stock_movements",
            Table::Warehouses => "warehouses",
            Table::WarehouseLocations => "warehouse_locations",
            Table::SalesOrders => "sales_orders",
            Table::SalesOrderItems => "sales_order_items",
            Table::PurchaseOrders => "purchase_orders",
            Table::PurchaseOrderItems => "purchase_order_items",
        }
    }
}

// --- ERROS ---

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Serviço remoto indisponível: {0}")]
    Unavailable(String),

    #[error("Erro no serviço remoto: {0}")]
    Database(#[from] sqlx::Error),

    // Equivalente ao `.single()`: a operação precisa afetar exatamente uma linha.
    #[error("Esperava exatamente uma linha em '{table}', encontrou {rows}")]
    NotSingle { table: &'static str, rows: usize },

    #[error("Payload inválido: {0}")]
    InvalidPayload(String),

    #[error("Coluna inválida: '{0}'")]
    InvalidColumn(String),
}

// --- CONSULTAS ---

/// Filtro de igualdade (`.eq(coluna, valor)`).
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self { column, ascending: true }
    }

    pub fn desc(column: &'static str) -> Self {
        Self { column, ascending: false }
    }
}

/// Relação embutida, ex.: `product:products(name)` ligada por `product_id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Embed {
    pub alias: &'static str,
    pub table: Table,
    pub foreign_key: &'static str,
    pub columns: &'static [&'static str],
}

/// Contexto RLS: quem está pedindo e em nome de qual empresa.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Scope {
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl Scope {
    pub fn new(tenant_id: Uuid, user_id: Uuid) -> Self {
        Self { tenant_id: Some(tenant_id), user_id: Some(user_id) }
    }

    /// Sem contexto: usado pela autenticação, antes de existir uma sessão.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct SelectQuery {
    pub table: Table,
    pub scope: Scope,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub embeds: Vec<Embed>,
}

impl SelectQuery {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            scope: Scope::anonymous(),
            filters: Vec::new(),
            order: None,
            embeds: Vec::new(),
        }
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { column: column.into(), value: value.into() });
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }
}

#[derive(Debug, Clone)]
pub struct InsertQuery {
    pub table: Table,
    pub scope: Scope,
    pub row: Value,
}

#[derive(Debug, Clone)]
pub struct UpdateQuery {
    pub table: Table,
    pub scope: Scope,
    pub filters: Vec<Filter>,
    pub changes: Value,
}

impl UpdateQuery {
    pub fn new(table: Table, scope: Scope, changes: Value) -> Self {
        Self { table, scope, filters: Vec::new(), changes }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter { column: column.into(), value: value.into() });
        self
    }
}

// --- O CONTRATO ---

/// O serviço de tabelas remoto. Todas as linhas trafegam como objetos JSON.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError>;

    /// Insere uma linha e devolve a linha gravada (`insert().select().single()`).
    async fn insert(&self, query: &InsertQuery) -> Result<Value, RemoteError>;

    /// Atualiza exatamente uma linha e a devolve (`update().eq().select().single()`).
    async fn update(&self, query: &UpdateQuery) -> Result<Value, RemoteError>;
}

// --- AUXILIARES COMPARTILHADOS PELOS BACKENDS ---

/// Nomes de coluna vão direto para o SQL, então só aceitamos `[a-z0-9_]`.
pub(crate) fn check_column(column: &str) -> Result<&str, RemoteError> {
    let valid = !column.is_empty()
        && column.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !column.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(column)
    } else {
        Err(RemoteError::InvalidColumn(column.to_string()))
    }
}

/// Representação textual usada para comparar valores (igual a `coluna::text`).
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn expect_object<'a>(
    value: &'a Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, Value>, RemoteError> {
    value
        .as_object()
        .ok_or_else(|| RemoteError::InvalidPayload(format!("{} precisa ser um objeto JSON", what)))
}

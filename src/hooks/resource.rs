// src/hooks/resource.rs

use std::{marker::PhantomData, sync::Arc};

use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    cache::{Mutation, QueryClient, QueryFn, QueryKey, QuerySnapshot},
    common::error::{AppError, SharedError},
    db::{Embed, InsertQuery, Order, RemoteError, RemoteStore, Scope, SelectQuery, Table, UpdateQuery},
    models::auth::Session,
};

/// Linhas sem `company_id` herdam a empresa do registro pai.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParentScope {
    pub table: Table,
    /// Coluna da linha filha que aponta para o pai; o hook precisa filtrar por ela.
    pub foreign_key: &'static str,
}

/// Uma entidade lida de uma tabela remota.
pub trait Resource: DeserializeOwned + Serialize + Send + Sync + 'static {
    const TABLE: Table;
    /// Primeiro segmento da chave de cache.
    const KEY: &'static str;
    /// As linhas têm `company_id`.
    const TENANT_SCOPED: bool = true;
    /// Pai que precisa pertencer à empresa da sessão antes de listar as linhas.
    const PARENT: Option<ParentScope> = None;

    /// Ordem natural da lista.
    fn order() -> Order;

    fn embeds() -> Vec<Embed> {
        Vec::new()
    }

    /// Listas invalidadas depois de uma mutação bem-sucedida.
    fn invalidated_keys() -> Vec<&'static str> {
        vec![Self::KEY]
    }
}

pub trait Creatable: Resource {
    type New: Serialize + Send + Sync + 'static;

    /// Carimba na linha nova o que vem da sessão.
    fn stamp(row: &mut Map<String, Value>, session: &Session) {
        row.insert("company_id".into(), Value::String(session.company_id.to_string()));
    }
}

pub trait Editable: Resource {
    type Changes: Serialize + Send + Sync + 'static;
}

/// Estado devolvido ao chamador: leitura e mutações combinadas.
#[derive(Debug, Clone)]
pub struct HookState<T> {
    pub data: Option<Vec<T>>,
    pub is_loading: bool,
    pub error: Option<SharedError>,
}

/// Uma instância de hook por requisição (a "montagem"); o cache é compartilhado.
pub struct ResourceHook<R: Resource> {
    client: QueryClient,
    store: Arc<dyn RemoteStore>,
    session: Session,
    filters: Vec<(&'static str, String)>,
    create: Mutation,
    update: Mutation,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceHook<R> {
    pub fn new(client: QueryClient, store: Arc<dyn RemoteStore>, session: Session) -> Self {
        let invalidates: Vec<QueryKey> = R::invalidated_keys()
            .into_iter()
            .map(|key| QueryKey::new([key.to_string(), session.company_id.to_string()]))
            .collect();

        Self {
            create: Mutation::new(client.clone(), "create", invalidates.clone()),
            update: Mutation::new(client.clone(), "update", invalidates),
            client,
            store,
            session,
            filters: Vec::new(),
            _resource: PhantomData,
        }
    }

    /// Restringe a lista por igualdade; o filtro entra na chave de cache.
    pub fn with_filter(mut self, column: &'static str, value: impl ToString) -> Self {
        self.filters.push((column, value.to_string()));
        self
    }

    pub fn query_key(&self) -> QueryKey {
        let mut key = QueryKey::new([R::KEY.to_string(), self.session.company_id.to_string()]);
        for (column, value) in &self.filters {
            key = key.push(*column).push(value.clone());
        }
        key
    }

    fn scope(&self) -> Scope {
        Scope::new(self.session.company_id, self.session.user_id)
    }

    fn list_query(&self) -> SelectQuery {
        let mut query = SelectQuery::from(R::TABLE).scope(self.scope()).order(R::order());
        if R::TENANT_SCOPED {
            query = query.eq("company_id", self.session.company_id.to_string());
        }
        for (column, value) in &self.filters {
            query = query.eq(*column, value.clone());
        }
        for embed in R::embeds() {
            query = query.embed(embed);
        }
        query
    }

    // Consulta do pai, restrita à empresa da sessão.
    fn parent_query(&self) -> Result<Option<SelectQuery>, String> {
        let Some(parent) = R::PARENT else {
            return Ok(None);
        };

        let parent_id = self
            .filters
            .iter()
            .find(|(column, _)| *column == parent.foreign_key)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                format!("Filtro '{}' obrigatório para listar {}", parent.foreign_key, R::TABLE.name())
            })?;

        Ok(Some(
            SelectQuery::from(parent.table)
                .scope(self.scope())
                .eq("id", parent_id)
                .eq("company_id", self.session.company_id.to_string()),
        ))
    }

    fn query_fn(&self) -> QueryFn {
        let store = self.store.clone();
        let query = self.list_query();
        let parent = self.parent_query();
        Arc::new(move || {
            let store = store.clone();
            let query = query.clone();
            let parent = parent.clone();
            async move {
                match parent {
                    Ok(Some(parent)) => {
                        // Pai de outra empresa (ou inexistente) = nada a listar.
                        let found = store.select(&parent).await?;
                        if found.len() != 1 {
                            return Err(AppError::Remote(RemoteError::NotSingle {
                                table: parent.table.name(),
                                rows: found.len(),
                            }));
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => return Err(AppError::Remote(RemoteError::InvalidPayload(msg))),
                }

                let rows = store.select(&query).await?;
                Ok::<_, AppError>(Value::Array(rows))
            }
            .boxed()
        })
    }

    /// Lê a lista (pelo cache) e devolve o estado combinado.
    pub async fn load(&self) -> HookState<R> {
        let snapshot = self.client.fetch_query(&self.query_key(), self.query_fn()).await;
        self.combine(snapshot)
    }

    /// Estado atual sem disparar busca.
    pub fn state(&self) -> HookState<R> {
        self.combine(self.client.snapshot(&self.query_key()))
    }

    fn combine(&self, snapshot: QuerySnapshot) -> HookState<R> {
        let is_loading = snapshot.is_loading() || self.create.is_pending() || self.update.is_pending();

        let (data, decode_error) = match snapshot.data {
            Some(rows) => match serde_json::from_value::<Vec<R>>(rows) {
                Ok(rows) => (Some(rows), None),
                Err(e) => {
                    tracing::error!(table = R::TABLE.name(), "linhas em formato inesperado: {}", e);
                    (None, Some(Arc::new(AppError::Decode(e))))
                }
            },
            None => (None, None),
        };

        let error = snapshot
            .error
            .or(decode_error)
            .or_else(|| self.create.error())
            .or_else(|| self.update.error());

        HookState { data, is_loading, error }
    }
}

impl<R: Creatable> ResourceHook<R> {
    pub async fn create(&self, new: R::New) -> Result<R, SharedError> {
        let store = self.store.clone();
        let session = self.session.clone();
        let scope = self.scope();

        self.create
            .mutate(async move {
                let mut row = serde_json::to_value(&new)?;
                let fields = row
                    .as_object_mut()
                    .ok_or_else(|| RemoteError::InvalidPayload("A linha precisa ser um objeto JSON".into()))?;
                R::stamp(fields, &session);

                let inserted = store.insert(&InsertQuery { table: R::TABLE, scope, row }).await?;
                Ok::<R, AppError>(serde_json::from_value(inserted)?)
            })
            .await
    }
}

impl<R: Editable> ResourceHook<R> {
    pub async fn update(&self, id: Uuid, changes: R::Changes) -> Result<R, SharedError> {
        let store = self.store.clone();
        let scope = self.scope();
        let tenant = R::TENANT_SCOPED.then(|| self.session.company_id.to_string());

        self.update
            .mutate(async move {
                let changes = serde_json::to_value(&changes)?;
                let mut query = UpdateQuery::new(R::TABLE, scope, changes).eq("id", id.to_string());
                if let Some(tenant) = tenant {
                    query = query.eq("company_id", tenant);
                }

                let updated = store.update(&query).await?;
                Ok::<R, AppError>(serde_json::from_value(updated)?)
            })
            .await
    }
}

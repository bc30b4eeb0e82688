// src/test_support.rs
//
// Montagem compartilhada pelos testes: AppState sobre o MemoryStore com um
// usuário já cadastrado, e backends que falham ou seguram chamadas.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{Notify, Semaphore};
use uuid::Uuid;

use crate::{
    cache::QueryOptions,
    config::{AppConfig, AppState, Backend},
    db::{InsertQuery, MemoryStore, RemoteError, RemoteStore, SelectQuery, Table, UpdateQuery},
    models::auth::Session,
    services::auth::AuthService,
};

pub const DEMO_EMAIL: &str = "admin@synercore.test";
pub const DEMO_PASSWORD: &str = "segredo123";

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".into(),
        backend: Backend::Memory,
        database_url: None,
        db_max_connections: 1,
        jwt_secret: "segredo-de-teste".into(),
        session_ttl: chrono::Duration::hours(1),
        cookie_secure: false,
        query: QueryOptions {
            retry: 0,
            retry_delay_base: Duration::from_millis(1),
            ..QueryOptions::default()
        },
        demo_user: None,
    }
}

pub fn customer_row(company_id: Uuid, name: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "company_id": company_id,
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        "phone": null,
        "status": "active",
        "account_balance": 0,
        "created_at": "2024-01-01T00:00:00+00:00",
        "updated_at": "2024-01-01T00:00:00+00:00"
    })
}

/// Serviço remoto fora do ar.
pub struct FailingStore;

#[async_trait]
impl RemoteStore for FailingStore {
    async fn select(&self, _query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        Err(RemoteError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _query: &InsertQuery) -> Result<Value, RemoteError> {
        Err(RemoteError::Unavailable("connection refused".into()))
    }

    async fn update(&self, _query: &UpdateQuery) -> Result<Value, RemoteError> {
        Err(RemoteError::Unavailable("connection refused".into()))
    }
}

/// Uma catraca: avisa que alguém chegou e espera a liberação.
struct Gate {
    permits: Semaphore,
    arrived: Notify,
}

impl Gate {
    fn closed() -> Self {
        Self { permits: Semaphore::new(0), arrived: Notify::new() }
    }

    async fn pass(&self) -> Result<(), RemoteError> {
        self.arrived.notify_one();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;
        Ok(())
    }

    fn open(&self) {
        self.permits.add_permits(Semaphore::MAX_PERMITS);
    }
}

/// Delega ao MemoryStore, mas segura leituras e/ou escritas até serem liberadas.
pub struct GatedStore {
    inner: Arc<MemoryStore>,
    reads: Option<Gate>,
    writes: Option<Gate>,
}

impl GatedStore {
    async fn pass(gate: &Option<Gate>) -> Result<(), RemoteError> {
        match gate {
            Some(gate) => gate.pass().await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        Self::pass(&self.reads).await?;
        self.inner.select(query).await
    }

    async fn insert(&self, query: &InsertQuery) -> Result<Value, RemoteError> {
        Self::pass(&self.writes).await?;
        self.inner.insert(query).await
    }

    async fn update(&self, query: &UpdateQuery) -> Result<Value, RemoteError> {
        Self::pass(&self.writes).await?;
        self.inner.update(query).await
    }
}

pub struct TestContext {
    pub app_state: AppState,
    pub memory: Arc<MemoryStore>,
    pub session: Session,
    gated: Option<Arc<GatedStore>>,
}

impl TestContext {
    pub async fn new() -> Self {
        let memory = Arc::new(MemoryStore::new());
        let session = seed_user(&memory).await;
        let app_state = AppState::with_store(test_config(), memory.clone());
        Self { app_state, memory, session, gated: None }
    }

    pub async fn failing() -> Self {
        let memory = Arc::new(MemoryStore::new());
        let session = seed_user(&memory).await;
        let app_state = AppState::with_store(test_config(), Arc::new(FailingStore));
        Self { app_state, memory, session, gated: None }
    }

    /// Escritas ficam presas até `release_writes`.
    pub async fn gated() -> Self {
        Self::with_gates(None, Some(Gate::closed())).await
    }

    /// Leituras ficam presas até `release_reads`.
    pub async fn gated_reads() -> Self {
        Self::with_gates(Some(Gate::closed()), None).await
    }

    async fn with_gates(reads: Option<Gate>, writes: Option<Gate>) -> Self {
        let memory = Arc::new(MemoryStore::new());
        let session = seed_user(&memory).await;
        let gated = Arc::new(GatedStore { inner: memory.clone(), reads, writes });
        let app_state = AppState::with_store(test_config(), gated.clone());
        Self { app_state, memory, session, gated: Some(gated) }
    }

    fn gate(&self, pick: fn(&GatedStore) -> &Option<Gate>) -> Option<&Gate> {
        self.gated.as_deref().and_then(|store| pick(store).as_ref())
    }

    pub async fn wait_for_blocked_write(&self) {
        if let Some(gate) = self.gate(|s| &s.writes) {
            gate.arrived.notified().await;
        }
    }

    pub fn release_writes(&self) {
        if let Some(gate) = self.gate(|s| &s.writes) {
            gate.open();
        }
    }

    pub async fn wait_for_blocked_read(&self) {
        if let Some(gate) = self.gate(|s| &s.reads) {
            gate.arrived.notified().await;
        }
    }

    pub fn release_reads(&self) {
        if let Some(gate) = self.gate(|s| &s.reads) {
            gate.open();
        }
    }

    /// Token de sessão válido para o usuário semeado.
    pub async fn token(&self) -> String {
        let auth = AuthService::new(
            self.memory.clone(),
            self.app_state.config.jwt_secret.clone(),
            chrono::Duration::hours(1),
        );
        auth.login_user(DEMO_EMAIL, DEMO_PASSWORD).await.unwrap()
    }
}

async fn seed_user(memory: &MemoryStore) -> Session {
    let user_id = Uuid::new_v4();
    let company_id = Uuid::new_v4();
    // Custo mínimo do bcrypt para os testes não ficarem lentos.
    let password_hash = bcrypt::hash(DEMO_PASSWORD, 4).unwrap();

    memory
        .seed(
            Table::Users,
            vec![json!({
                "id": user_id,
                "email": DEMO_EMAIL,
                "password_hash": password_hash,
                "company_id": company_id,
            })],
        )
        .await;

    Session { user_id, company_id, email: DEMO_EMAIL.to_string() }
}

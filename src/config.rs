// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::{
    cache::{QueryClient, QueryOptions},
    db::{MemoryStore, PgStore, RemoteStore, Table},
    services::auth::AuthService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub backend: Backend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub cookie_secure: bool,
    pub query: QueryOptions,
    // (e-mail, senha) do usuário de demonstração do backend em memória
    pub demo_user: Option<(String, String)>,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("Valor inválido para {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend = match env::var("REMOTE_BACKEND").as_deref() {
            Ok("memory") => Backend::Memory,
            Ok("postgres") | Err(_) => Backend::Postgres,
            Ok(other) => anyhow::bail!("REMOTE_BACKEND desconhecido: '{}'", other),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if backend == Backend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL deve ser definida (ou use REMOTE_BACKEND=memory)");
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let demo_user = match (env::var("DEMO_USER_EMAIL"), env::var("DEMO_USER_PASSWORD")) {
            (Ok(email), Ok(password)) => Some((email, password)),
            _ => None,
        };

        let defaults = QueryOptions::default();
        let query = QueryOptions {
            stale_time: Duration::from_secs(env_or("QUERY_STALE_TIME_SECS", 0u64)?),
            retry: env_or("QUERY_RETRY", defaults.retry)?,
            refetch_on_invalidate: env_or("QUERY_REFETCH_ON_INVALIDATE", defaults.refetch_on_invalidate)?,
            gc_time: Duration::from_secs(env_or("QUERY_GC_TIME_SECS", defaults.gc_time.as_secs())?),
            ..defaults
        };

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            backend,
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5u32)?,
            jwt_secret,
            session_ttl: chrono::Duration::hours(env_or("SESSION_TTL_HOURS", 168i64)?),
            cookie_secure: env_or("COOKIE_SECURE", false)?,
            query,
            demo_user,
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RemoteStore>,
    pub query_client: QueryClient,
    pub auth_service: AuthService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn RemoteStore> = match config.backend {
            Backend::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                Arc::new(PgStore::new(db_pool))
            }
            Backend::Memory => {
                let store = MemoryStore::new();
                if let Some((email, password)) = &config.demo_user {
                    seed_demo_user(&store, email, password).await?;
                }
                tracing::warn!("⚠️ Usando o backend em memória: os dados somem ao reiniciar.");
                Arc::new(store)
            }
        };

        Ok(Self::with_store(config, store))
    }

    /// Monta o gráfico de dependências sobre um backend já pronto.
    pub fn with_store(config: AppConfig, store: Arc<dyn RemoteStore>) -> Self {
        let query_client = QueryClient::new(config.query.clone());
        let auth_service = AuthService::new(store.clone(), config.jwt_secret.clone(), config.session_ttl);

        Self {
            config: Arc::new(config),
            store,
            query_client,
            auth_service,
        }
    }
}

async fn seed_demo_user(store: &MemoryStore, email: &str, password: &str) -> anyhow::Result<()> {
    let password_hash = AuthService::hash_password(password)
        .await
        .map_err(|e| anyhow::anyhow!("Falha ao gerar hash da senha de demonstração: {}", e))?;
    let company_id = Uuid::new_v4();

    store
        .seed(
            Table::Users,
            vec![json!({
                "id": Uuid::new_v4(),
                "email": email,
                "password_hash": password_hash,
                "company_id": company_id,
                "full_name": "Demonstração",
            })],
        )
        .await;

    tracing::info!(%company_id, "👤 Usuário de demonstração criado: {}", email);
    Ok(())
}

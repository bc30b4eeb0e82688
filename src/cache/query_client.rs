// src/cache/query_client.rs

use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use crate::{
    cache::key::QueryKey,
    common::error::{AppError, SharedError},
};

/// Função de consulta registrada por chave; reexecutada em refetch.
pub type QueryFn = Arc<dyn Fn() -> BoxFuture<'static, Result<Value, AppError>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Depois disso o dado é considerado velho e a próxima leitura busca de novo.
    pub stale_time: Duration,
    /// Tentativas extras de uma consulta que falhou.
    pub retry: u32,
    pub retry_delay_base: Duration,
    pub retry_delay_max: Duration,
    pub refetch_on_invalidate: bool,
    /// Entradas sem leitura por mais que isso são descartadas na próxima leitura de qualquer chave.
    pub gc_time: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: Duration::ZERO,
            retry: 3,
            retry_delay_base: Duration::from_secs(1),
            retry_delay_max: Duration::from_secs(30),
            refetch_on_invalidate: true,
            gc_time: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Pending,
    Success,
    Error,
}

/// Foto de uma entrada, entregue aos hooks.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    pub data: Option<Value>,
    pub error: Option<SharedError>,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl QuerySnapshot {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Pending,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: true,
        }
    }

    /// Ainda sem dado e buscando.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending && self.is_fetching
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    Fetched { key: QueryKey, ok: bool },
    Invalidated { prefix: QueryKey, matched: usize },
}

struct Entry {
    status: QueryStatus,
    data: Option<Value>,
    error: Option<SharedError>,
    is_fetching: bool,
    is_invalidated: bool,
    invalidation_epoch: u64,
    fetch_count: u64,
    data_updated_at: Option<Instant>,
    last_accessed: Instant,
    query_fn: Option<QueryFn>,
    fetch_lock: Arc<Mutex<()>>,
}

impl Entry {
    fn new() -> Self {
        Self {
            status: QueryStatus::Pending,
            data: None,
            error: None,
            is_fetching: false,
            is_invalidated: false,
            invalidation_epoch: 0,
            fetch_count: 0,
            data_updated_at: None,
            last_accessed: Instant::now(),
            query_fn: None,
            fetch_lock: Arc::new(Mutex::new(())),
        }
    }

    fn is_stale(&self, stale_time: Duration) -> bool {
        if self.status != QueryStatus::Success || self.is_invalidated {
            return true;
        }
        match self.data_updated_at {
            Some(at) => at.elapsed() >= stale_time,
            None => true,
        }
    }

    // Em uso: buscando, com alguém esperando o lock, ou lida há pouco.
    fn is_live(&self, gc_time: Duration) -> bool {
        self.is_fetching || Arc::strong_count(&self.fetch_lock) > 1 || self.last_accessed.elapsed() < gc_time
    }

    fn snapshot(&self, stale_time: Duration) -> QuerySnapshot {
        QuerySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_stale: self.is_stale(stale_time),
        }
    }
}

struct Inner {
    entries: RwLock<HashMap<QueryKey, Entry>>,
    options: QueryOptions,
    events: broadcast::Sender<CacheEvent>,
}

/// O cache de consultas compartilhado pela aplicação inteira.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl QueryClient {
    pub fn new(options: QueryOptions) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(HashMap::new()),
                options,
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }

    // Um lock envenenado só significa que outra task entrou em pânico; o mapa continua válido.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<QueryKey, Entry>> {
        self.inner.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self, key: &QueryKey) -> QuerySnapshot {
        let stale_time = self.inner.options.stale_time;
        self.read_entries()
            .get(key)
            .map(|e| e.snapshot(stale_time))
            .unwrap_or_else(QuerySnapshot::idle)
    }

    /// Lê a consulta pelo cache: devolve o dado fresco ou busca de novo.
    /// Leituras simultâneas da mesma chave compartilham uma única busca.
    pub async fn fetch_query(&self, key: &QueryKey, query_fn: QueryFn) -> QuerySnapshot {
        let (lock, seen) = {
            let mut entries = self.write_entries();
            self.collect_garbage(&mut entries, key);
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.query_fn = Some(query_fn.clone());
            entry.last_accessed = Instant::now();
            (entry.fetch_lock.clone(), entry.fetch_count)
        };

        let _guard = lock.lock().await;

        {
            let stale_time = self.inner.options.stale_time;
            let entries = self.read_entries();
            if let Some(entry) = entries.get(key) {
                // Alguém terminou uma busca enquanto esperávamos o lock.
                let fetched_meanwhile = entry.fetch_count > seen && !entry.is_invalidated;
                if fetched_meanwhile || !entry.is_stale(stale_time) {
                    return entry.snapshot(stale_time);
                }
            }
        }

        self.run_fetch(key, query_fn).await
    }

    fn collect_garbage(&self, entries: &mut HashMap<QueryKey, Entry>, current: &QueryKey) {
        let gc_time = self.inner.options.gc_time;
        let before = entries.len();
        entries.retain(|key, entry| key == current || entry.is_live(gc_time));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "entradas ociosas descartadas do cache");
        }
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.read_entries().len()
    }

    /// Marca como inválidas todas as entradas sob `prefix` e dispara o refetch
    /// das que têm função de consulta registrada. Devolve quantas casaram.
    pub fn invalidate_queries(&self, prefix: &QueryKey) -> usize {
        let mut to_refetch = Vec::new();
        let matched = {
            let mut entries = self.write_entries();
            let mut matched = 0;
            for (key, entry) in entries.iter_mut().filter(|(k, _)| k.starts_with(prefix)) {
                entry.is_invalidated = true;
                entry.invalidation_epoch += 1;
                matched += 1;
                if let Some(query_fn) = &entry.query_fn {
                    to_refetch.push((key.clone(), query_fn.clone()));
                }
            }
            matched
        };

        tracing::debug!(%prefix, matched, "consultas invalidadas");
        let _ = self.inner.events.send(CacheEvent::Invalidated { prefix: prefix.clone(), matched });

        if self.inner.options.refetch_on_invalidate {
            // Fora de um runtime não há como buscar agora; a próxima leitura busca.
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                for (key, query_fn) in to_refetch {
                    let client = self.clone();
                    handle.spawn(async move {
                        client.refetch(&key, query_fn).await;
                    });
                }
            }
        }

        matched
    }

    async fn refetch(&self, key: &QueryKey, query_fn: QueryFn) {
        let lock = match self.read_entries().get(key) {
            Some(entry) => entry.fetch_lock.clone(),
            None => return,
        };
        let _guard = lock.lock().await;

        let still_invalid = self
            .read_entries()
            .get(key)
            .map(|e| e.is_invalidated)
            .unwrap_or(false);
        if still_invalid {
            self.run_fetch(key, query_fn).await;
        }
    }

    // Deve ser chamado com o fetch_lock da chave em mãos.
    async fn run_fetch(&self, key: &QueryKey, query_fn: QueryFn) -> QuerySnapshot {
        let started_epoch = {
            let mut entries = self.write_entries();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.is_fetching = true;
            entry.invalidation_epoch
        };

        let result = self.fetch_with_retry(key, &query_fn).await;
        let ok = result.is_ok();

        let snapshot = {
            let mut entries = self.write_entries();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.is_fetching = false;
            entry.fetch_count += 1;
            entry.last_accessed = Instant::now();
            // Uma invalidação durante a busca continua valendo.
            entry.is_invalidated = entry.invalidation_epoch != started_epoch;

            match result {
                Ok(data) => {
                    entry.status = QueryStatus::Success;
                    entry.data = Some(data);
                    entry.error = None;
                    entry.data_updated_at = Some(Instant::now());
                }
                Err(err) => {
                    // O dado anterior é mantido junto com o erro.
                    entry.status = QueryStatus::Error;
                    entry.error = Some(Arc::new(err));
                }
            }
            entry.snapshot(self.inner.options.stale_time)
        };

        let _ = self.inner.events.send(CacheEvent::Fetched { key: key.clone(), ok });
        snapshot
    }

    async fn fetch_with_retry(&self, key: &QueryKey, query_fn: &QueryFn) -> Result<Value, AppError> {
        let mut attempt = 0;
        loop {
            match query_fn().await {
                Ok(data) => return Ok(data),
                Err(err) if attempt < self.inner.options.retry && err.is_retryable() => {
                    let delay = self.retry_delay(attempt);
                    tracing::warn!(%key, attempt, ?delay, "consulta falhou, tentando de novo: {}", err);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(%key, "consulta falhou: {}", err);
                    return Err(err);
                }
            }
        }
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.inner
            .options
            .retry_delay_base
            .saturating_mul(factor)
            .min(self.inner.options.retry_delay_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RemoteError;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick_options() -> QueryOptions {
        QueryOptions {
            retry: 0,
            retry_delay_base: Duration::from_millis(1),
            refetch_on_invalidate: false,
            ..QueryOptions::default()
        }
    }

    fn counting_fn(calls: Arc<AtomicUsize>) -> QueryFn {
        Arc::new(move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(json!([n]))
            }
            .boxed()
        })
    }

    fn failing_fn(calls: Arc<AtomicUsize>) -> QueryFn {
        Arc::new(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Remote(RemoteError::Unavailable("offline".into())))
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn fresh_data_is_served_from_cache() {
        let client = QueryClient::new(QueryOptions {
            stale_time: Duration::from_secs(60),
            ..quick_options()
        });
        let key = QueryKey::new(["customers", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let first = client.fetch_query(&key, counting_fn(calls.clone())).await;
        let second = client.fetch_query(&key, counting_fn(calls.clone())).await;

        assert_eq!(first.status, QueryStatus::Success);
        assert_eq!(second.data, Some(json!([1])));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_stale_time_refetches_every_read() {
        let client = QueryClient::new(quick_options());
        let key = QueryKey::new(["customers", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));

        client.fetch_query(&key, counting_fn(calls.clone())).await;
        let second = client.fetch_query(&key, counting_fn(calls.clone())).await;

        assert_eq!(second.data, Some(json!([2])));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let client = QueryClient::new(quick_options());
        let key = QueryKey::new(["products", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let slow: QueryFn = {
            let calls = calls.clone();
            Arc::new(move || {
                let calls = calls.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!([]))
                }
                .boxed()
            })
        };

        let (a, b) = tokio::join!(
            client.fetch_query(&key, slow.clone()),
            client.fetch_query(&key, slow.clone())
        );

        assert_eq!(a.status, QueryStatus::Success);
        assert_eq!(b.status, QueryStatus::Success);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_marks_prefix_stale() {
        let client = QueryClient::new(QueryOptions {
            stale_time: Duration::from_secs(60),
            ..quick_options()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let products = QueryKey::new(["products", "t1"]);
        let customers = QueryKey::new(["customers", "t1"]);

        client.fetch_query(&products, counting_fn(calls.clone())).await;
        client.fetch_query(&customers, counting_fn(calls.clone())).await;

        let matched = client.invalidate_queries(&QueryKey::new(["products"]));

        assert_eq!(matched, 1);
        assert!(client.snapshot(&products).is_stale);
        assert!(!client.snapshot(&customers).is_stale);
    }

    #[tokio::test]
    async fn invalidation_refetches_registered_queries() {
        let client = QueryClient::new(QueryOptions {
            stale_time: Duration::from_secs(60),
            refetch_on_invalidate: true,
            ..quick_options()
        });
        let key = QueryKey::new(["stock_movements", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let mut events = client.subscribe();

        client.fetch_query(&key, counting_fn(calls.clone())).await;
        client.invalidate_queries(&key);

        // Fetched (inicial), Invalidated, Fetched (refetch em background).
        let mut fetched = 0;
        while fetched < 2 {
            if let CacheEvent::Fetched { ok, .. } = events.recv().await.unwrap() {
                assert!(ok);
                fetched += 1;
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.snapshot(&key).data, Some(json!([2])));
        assert!(!client.snapshot(&key).is_stale);
    }

    #[tokio::test]
    async fn retries_stop_after_configured_count() {
        let client = QueryClient::new(QueryOptions {
            retry: 2,
            ..quick_options()
        });
        let key = QueryKey::new(["customers", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));

        let snapshot = client.fetch_query(&key, failing_fn(calls.clone())).await;

        assert_eq!(snapshot.status, QueryStatus::Error);
        assert!(snapshot.error.is_some());
        assert!(!snapshot.is_loading());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn error_keeps_previous_data() {
        let client = QueryClient::new(quick_options());
        let key = QueryKey::new(["customers", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));

        client.fetch_query(&key, counting_fn(calls.clone())).await;
        let snapshot = client.fetch_query(&key, failing_fn(calls.clone())).await;

        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(snapshot.data, Some(json!([1])));
    }

    #[tokio::test]
    async fn missing_row_is_not_retried() {
        let client = QueryClient::new(QueryOptions {
            retry: 3,
            retry_delay_base: Duration::from_secs(30),
            ..quick_options()
        });
        let key = QueryKey::new(["sales_order_items", "t1"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let not_found: QueryFn = {
            let calls = calls.clone();
            Arc::new(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::Remote(RemoteError::NotSingle { table: "sales_orders", rows: 0 }))
                }
                .boxed()
            })
        };

        let snapshot = tokio::time::timeout(Duration::from_secs(5), client.fetch_query(&key, not_found))
            .await
            .expect("sem espera de retry");

        assert_eq!(snapshot.status, QueryStatus::Error);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn idle_entries_are_dropped_after_gc_time() {
        let client = QueryClient::new(QueryOptions {
            stale_time: Duration::from_secs(60),
            gc_time: Duration::from_millis(30),
            ..quick_options()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let old = QueryKey::new(["sales_order_items", "t1", "order_id", "a"]);
        let recent = QueryKey::new(["sales_order_items", "t1", "order_id", "b"]);

        client.fetch_query(&old, counting_fn(calls.clone())).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        client.fetch_query(&recent, counting_fn(calls.clone())).await;

        assert_eq!(client.entry_count(), 1);
        assert!(client.snapshot(&old).data.is_none());
        assert_eq!(client.snapshot(&recent).data, Some(json!([2])));
    }

    #[tokio::test]
    async fn many_distinct_keys_do_not_pile_up() {
        let client = QueryClient::new(QueryOptions {
            gc_time: Duration::ZERO,
            ..quick_options()
        });
        let calls = Arc::new(AtomicUsize::new(0));

        for i in 0..500 {
            let key = QueryKey::new(["sales_order_items".to_string(), "t1".to_string(), i.to_string()]);
            client.fetch_query(&key, counting_fn(calls.clone())).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 500);
        assert_eq!(client.entry_count(), 1);
    }

    #[tokio::test]
    async fn default_gc_time_keeps_recent_entries() {
        let client = QueryClient::new(quick_options());
        let calls = Arc::new(AtomicUsize::new(0));
        let a = QueryKey::new(["customers", "t1"]);
        let b = QueryKey::new(["products", "t1"]);

        client.fetch_query(&a, counting_fn(calls.clone())).await;
        client.fetch_query(&b, counting_fn(calls.clone())).await;

        assert_eq!(client.entry_count(), 2);
    }

    #[test]
    fn retry_delay_doubles_up_to_the_cap() {
        let client = QueryClient::new(QueryOptions::default());

        assert_eq!(client.retry_delay(0), Duration::from_secs(1));
        assert_eq!(client.retry_delay(2), Duration::from_secs(4));
        assert_eq!(client.retry_delay(10), Duration::from_secs(30));
        assert_eq!(client.retry_delay(40), Duration::from_secs(30));
    }

    #[test]
    fn unknown_key_is_idle() {
        let client = QueryClient::new(QueryOptions::default());
        let snapshot = client.snapshot(&QueryKey::new(["nada"]));

        assert_eq!(snapshot.status, QueryStatus::Pending);
        assert!(!snapshot.is_loading());
        assert!(snapshot.data.is_none());
    }
}

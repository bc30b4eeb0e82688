// src/cache/mutation.rs

use std::{
    future::Future,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    cache::{key::QueryKey, query_client::QueryClient},
    common::error::{AppError, SharedError},
};

#[derive(Default)]
struct MutationState {
    pending: AtomicUsize,
    error: Mutex<Option<SharedError>>,
}

// Decrementa o contador mesmo se o future for abandonado no meio.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Uma mutação: executa a escrita, guarda o estado (pendente / erro) e,
/// em caso de sucesso, invalida as chaves declaradas. Nunca tenta de novo.
#[derive(Clone)]
pub struct Mutation {
    name: &'static str,
    client: QueryClient,
    invalidates: Arc<Vec<QueryKey>>,
    state: Arc<MutationState>,
}

impl Mutation {
    pub fn new(client: QueryClient, name: &'static str, invalidates: Vec<QueryKey>) -> Self {
        Self {
            name,
            client,
            invalidates: Arc::new(invalidates),
            state: Arc::new(MutationState::default()),
        }
    }

    pub async fn mutate<T, F>(&self, write: F) -> Result<T, SharedError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        self.state.pending.fetch_add(1, Ordering::SeqCst);
        let _pending = PendingGuard(&self.state.pending);
        self.set_error(None);

        match write.await {
            Ok(value) => {
                for key in self.invalidates.iter() {
                    self.client.invalidate_queries(key);
                }
                tracing::info!(mutation = self.name, "✅ mutação concluída");
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(mutation = self.name, "mutação falhou: {}", err);
                let err = Arc::new(err);
                self.set_error(Some(err.clone()));
                Err(err)
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.pending.load(Ordering::SeqCst) > 0
    }

    pub fn error(&self) -> Option<SharedError> {
        self.state.error.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_error(&self, err: Option<SharedError>) {
        *self.state.error.lock().unwrap_or_else(|e| e.into_inner()) = err;
    }
}

//! Latest-only query sessions.
//!
//! An interactive client that moves the query point rapidly only cares about
//! its newest request. A [`QuerySession`] runs each query as its own task
//! and aborts the previous one when a new query is submitted; the superseded
//! caller receives [`EngineError::Cancelled`].

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Runs at most one live query at a time.
#[derive(Default)]
pub struct QuerySession {
    current: Mutex<Option<AbortHandle>>,
    submitted: AtomicU64,
    superseded: AtomicU64,
}

impl QuerySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `query`, aborting whatever query this session was running before.
    pub async fn run<F, T>(&self, query: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::spawn(query);

        let previous = {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            current.replace(task.abort_handle())
        };
        let sequence = self.submitted.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(previous) = previous {
            if !previous.is_finished() {
                self.superseded.fetch_add(1, Ordering::Relaxed);
                debug!(sequence, "Superseding previous query");
            }
            previous.abort();
        }

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(EngineError::Cancelled),
            Err(e) => Err(EngineError::Internal(format!("query task failed: {}", e))),
        }
    }

    /// Number of queries submitted.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Number of queries aborted while still running.
    pub fn superseded(&self) -> u64 {
        self.superseded.load(Ordering::Relaxed)
    }
}

/// Sessions keyed by client-chosen id, least recently used evicted first.
pub struct SessionRegistry {
    sessions: Mutex<LruCache<String, Arc<QuerySession>>>,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get or create the session for `id`.
    pub fn session(&self, id: &str) -> Arc<QuerySession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = sessions.get(id) {
            return Arc::clone(session);
        }
        let session = Arc::new(QuerySession::new());
        sessions.put(id.to_string(), Arc::clone(&session));
        session
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use tokio::sync::broadcast;

use docstream_core::api::{CancellationToken, Services, StreamConfig};

/// Request counters surfaced by `/health`.
#[derive(Debug)]
pub struct ServerStats {
    started_at: Instant,
    pub requests_total: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            requests_total: 0,
            errors_total: 0,
            requests_by_endpoint: HashMap::new(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Operations still streaming, keyed by operation id.
#[derive(Clone, Default)]
pub struct OperationTable {
    inner: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl OperationTable {
    pub fn register(&self, op_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op_id.to_string(), token.clone());
        token
    }

    pub fn finish(&self, op_id: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(op_id);
    }

    /// Returns false when no such operation is running.
    pub fn cancel(&self, op_id: &str) -> bool {
        match self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(op_id)
        {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session_id: String,
    pub services: Services,
    pub stream: StreamConfig,
    pub stats: Arc<RwLock<ServerStats>>,
    pub operations: OperationTable,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        session_id: String,
        services: Services,
        stream: StreamConfig,
        shutdown_tx: broadcast::Sender<()>,
    ) -> Self {
        Self {
            session_id,
            services,
            stream,
            stats: Arc::new(RwLock::new(ServerStats::new())),
            operations: OperationTable::default(),
            shutdown_tx,
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .increment_request(endpoint);
    }

    pub fn record_error(&self) {
        self.stats
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .increment_error();
    }
}

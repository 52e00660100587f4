//! MemoryEndpoint - in-process key/value store with injectable faults

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use contracts::{saturating_millis, ContractError, Endpoint, EndpointConfig};
use tracing::{debug, info, instrument};

/// Key/value endpoint kept in memory
///
/// Every operation sleeps for the configured latency before touching the
/// store, so an attempt abandoned by the dispatcher still applies its write
/// once it wakes up.
pub struct MemoryEndpoint {
    name: String,
    store: Mutex<HashMap<String, Bytes>>,
    latency_ms: AtomicU64,
    /// Forced failure switch
    failing: AtomicBool,
    /// Probability in [0, 1] of a random failure
    failure_rate: f64,
    applied: AtomicU64,
    closed: AtomicBool,
}

impl MemoryEndpoint {
    /// Create an empty endpoint with no latency
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Mutex::new(HashMap::new()),
            latency_ms: AtomicU64::new(0),
            failing: AtomicBool::new(false),
            failure_rate: 0.0,
            applied: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self::new(config.name.clone())
            .with_latency(config.latency())
            .with_failure_rate(config.failure_rate)
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(saturating_millis(latency), Ordering::Relaxed);
    }

    /// Make every following operation fail until cleared
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Operations that reached the store
    pub fn applied_ops(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Bytes>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latency plus fault injection shared by every operation
    async fn enter(&self, operation: &str) -> Result<(), ContractError> {
        if self.is_closed() {
            return Err(ContractError::endpoint_closed(&self.name));
        }

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.failing.load(Ordering::Relaxed) {
            return Err(ContractError::endpoint_unavailable(
                &self.name,
                format!("forced failure during {operation}"),
            ));
        }
        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            return Err(ContractError::endpoint_unavailable(
                &self.name,
                format!("injected failure during {operation}"),
            ));
        }

        self.applied.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Bytes>, ContractError> {
        self.enter("get").await?;
        Ok(self.lock().get(key).cloned())
    }

    /// Store `value`, returning the previous one
    pub async fn put(&self, key: &str, value: Bytes) -> Result<Option<Bytes>, ContractError> {
        self.enter("put").await?;
        Ok(self.lock().insert(key.to_string(), value))
    }

    /// Store `value` only if `key` is absent
    pub async fn insert(&self, key: &str, value: Bytes) -> Result<(), ContractError> {
        self.enter("insert").await?;
        let mut store = self.lock();
        if store.contains_key(key) {
            return Err(ContractError::endpoint_operation(
                &self.name,
                "insert",
                format!("duplicate key '{key}'"),
            ));
        }
        store.insert(key.to_string(), value);
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<bool, ContractError> {
        self.enter("delete").await?;
        Ok(self.lock().remove(key).is_some())
    }

    /// Add `by` to the integer stored at `key` (missing counts as 0)
    #[instrument(name = "memory_endpoint_increment", skip(self), fields(endpoint = %self.name))]
    pub async fn increment(&self, key: &str, by: i64) -> Result<i64, ContractError> {
        self.enter("increment").await?;
        let mut store = self.lock();

        let current = match store.get(key) {
            None => 0,
            Some(raw) => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| {
                    ContractError::endpoint_operation(
                        &self.name,
                        "increment",
                        format!("value at '{key}' is not an integer"),
                    )
                })?,
        };

        let next = current.checked_add(by).ok_or_else(|| {
            ContractError::endpoint_operation(&self.name, "increment", "counter overflow")
        })?;
        store.insert(key.to_string(), Bytes::from(next.to_string()));
        debug!(key, value = next, "Counter incremented");
        Ok(next)
    }

    /// Replace the value at `key` if it currently equals `expected`
    ///
    /// `expected = None` means the key must be absent.
    pub async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Bytes,
    ) -> Result<(), ContractError> {
        self.enter("compare_and_set").await?;
        let mut store = self.lock();

        if store.get(key).map(|v| &v[..]) != expected {
            return Err(ContractError::PreconditionFailed {
                endpoint: self.name.clone(),
                key: key.to_string(),
            });
        }
        store.insert(key.to_string(), value);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEndpoint")
            .field("name", &self.name)
            .field("keys", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Endpoint for MemoryEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "memory_endpoint_close", skip(self), fields(endpoint = %self.name))]
    async fn close(&self) -> Result<(), ContractError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(ContractError::endpoint_closed(&self.name));
        }
        info!(endpoint = %self.name, keys = self.len(), "MemoryEndpoint closed");
        Ok(())
    }
}

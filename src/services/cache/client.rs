//! Cache client interface used by the identity resolver.
use async_trait::async_trait;
use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors (connection/command).
///
/// Kept independent from `RpcError` so callers decide how to fail: the
/// resolver treats a failed first read as a miss but reports a failed
/// re-read after refresh.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// A minimal byte-oriented cache.
///
/// The identity payload is stored by the identity service under the session
/// token; this crate only ever reads it. `set_bytes` exists for whoever owns
/// the refresh path (and for the in-memory backend).
#[async_trait]
pub trait CacheClient: Send + Sync + 'static {
    // Returns the cache backend name (for logging).
    fn backend_name(&self) -> &'static str;

    // Raw value stored under `key`, if any.
    async fn get_bytes(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    async fn set_bytes(&self, key: &str, value: &[u8]) -> CacheResult<()>;
}

/// Cache key for `raw` inside `namespace`. An empty namespace keeps the raw key.
pub fn namespaced_key(namespace: &str, raw: &str) -> String {
    if namespace.is_empty() {
        raw.to_string()
    } else {
        format!("{}:{}", namespace, raw)
    }
}

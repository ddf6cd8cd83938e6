//! Cache-first lookup of a caller's identity payload.

use std::sync::Arc;

use thiserror::Error;

use crate::services::cache::{CacheClient, CacheError, client::namespaced_key};
use crate::services::identity::refresh::{IdentityRefresher, RefreshError, RefreshOutcome};

/// Infrastructure failures while resolving a token.
///
/// These are kept apart from "no identity" (`Ok(None)`) so the interceptor
/// can choose whether to surface them or collapse them into a rejection.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    #[error("identity cache unavailable: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Clone)]
pub struct IdentityResolver {
    cache: Arc<dyn CacheClient>,
    refresher: Arc<dyn IdentityRefresher>,
    namespace: String,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("cache", &self.cache.backend_name())
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl IdentityResolver {
    pub fn new(cache: Arc<dyn CacheClient>, refresher: Arc<dyn IdentityRefresher>) -> Self {
        Self {
            cache,
            refresher,
            namespace: String::new(),
        }
    }

    /// Prefix cache keys with `namespace` (empty = token as-is).
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Resolve `token` to the raw identity payload.
    ///
    /// - cache hit: returned without any remote call
    /// - miss: one refresh call, then the cache is read again
    /// - refresh answered with a non-200 status: `Ok(None)`
    ///
    /// The cache is never written from here.
    pub async fn resolve(&self, token: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        let key = namespaced_key(&self.namespace, token);

        match self.cache.get_bytes(&key).await {
            Ok(Some(payload)) if !payload.is_empty() => return Ok(Some(payload)),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    backend = self.cache.backend_name(),
                    error = %err,
                    "identity cache read failed; refreshing"
                );
            }
        }

        match self.refresher.refresh(token).await {
            Ok(RefreshOutcome::Refreshed) => {}
            Ok(RefreshOutcome::Rejected(status)) => {
                tracing::debug!(status, "identity refresh rejected");
                return Ok(None);
            }
            Err(err) => {
                tracing::error!(error = %err, "identity refresh request failed");
                return Err(err.into());
            }
        }

        let payload = self.cache.get_bytes(&key).await.map_err(|err| {
            tracing::warn!(
                backend = self.cache.backend_name(),
                error = %err,
                "identity cache re-read after refresh failed"
            );
            err
        })?;
        Ok(payload.filter(|p| !p.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::services::cache::MemoryCache;
    use crate::services::identity::testing::{
        CapturedLogs, FailingCache, FailsAfterFirstRead, StubRefresher,
    };

    const PAYLOAD: &[u8] = br#"{"id":7}"#;

    fn resolver(cache: &MemoryCache, refresher: &StubRefresher) -> IdentityResolver {
        IdentityResolver::new(Arc::new(cache.clone()), Arc::new(refresher.clone()))
    }

    #[tokio::test]
    async fn test_cache_hit_skips_refresh() {
        let cache = MemoryCache::new();
        cache.set_bytes("abc", PAYLOAD).await.unwrap();
        let refresher = StubRefresher::populating(cache.clone(), b"{}");

        let got = resolver(&cache, &refresher).resolve("abc").await.unwrap();

        assert_eq!(got.as_deref(), Some(PAYLOAD));
        assert_eq!(refresher.calls(), 0);
        assert_eq!(cache.reads(), 1);
    }

    #[tokio::test]
    async fn test_miss_refreshes_once_then_rereads() {
        let cache = MemoryCache::new();
        let refresher = StubRefresher::populating(cache.clone(), PAYLOAD);

        let got = resolver(&cache, &refresher).resolve("abc").await.unwrap();

        assert_eq!(got.as_deref(), Some(PAYLOAD));
        assert_eq!(refresher.calls(), 1);
        assert_eq!(cache.reads(), 2);
        assert_eq!(refresher.tokens(), vec!["abc".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_that_leaves_cache_empty() {
        let cache = MemoryCache::new();
        let refresher = StubRefresher::answering(RefreshOutcome::Refreshed);

        let got = resolver(&cache, &refresher).resolve("abc").await.unwrap();

        assert_eq!(got, None);
        assert_eq!(refresher.calls(), 1);
        assert_eq!(cache.reads(), 2);
    }

    #[tokio::test]
    async fn test_non_200_returns_none_without_reread() {
        let cache = MemoryCache::new();
        let refresher = StubRefresher::answering(RefreshOutcome::Rejected(401));

        let got = resolver(&cache, &refresher).resolve("abc").await.unwrap();

        assert_eq!(got, None);
        assert_eq!(cache.reads(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct_error() {
        let cache = MemoryCache::new();
        let refresher = StubRefresher::failing();

        let err = resolver(&cache, &refresher)
            .resolve("abc")
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Refresh(RefreshError::Timeout)));
        assert_eq!(cache.reads(), 1);
    }

    #[tokio::test]
    async fn test_empty_cached_value_is_a_miss() {
        let cache = MemoryCache::new();
        cache.set_bytes("abc", b"").await.unwrap();
        let refresher = StubRefresher::populating(cache.clone(), PAYLOAD);

        let got = resolver(&cache, &refresher).resolve("abc").await.unwrap();

        assert_eq!(got.as_deref(), Some(PAYLOAD));
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn test_namespace_prefixes_cache_key() {
        let cache = MemoryCache::new();
        cache.set_bytes("user:abc", PAYLOAD).await.unwrap();
        let refresher = StubRefresher::answering(RefreshOutcome::Refreshed);

        let got = resolver(&cache, &refresher)
            .with_namespace("user")
            .resolve("abc")
            .await
            .unwrap();

        assert_eq!(got.as_deref(), Some(PAYLOAD));
        assert_eq!(refresher.calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_outage_falls_back_then_reports() {
        let refresher = StubRefresher::answering(RefreshOutcome::Refreshed);
        let resolver = IdentityResolver::new(Arc::new(FailingCache), Arc::new(refresher.clone()));

        let err = resolver.resolve("abc").await.unwrap_err();

        assert!(matches!(err, ResolveError::Cache(_)));
        assert_eq!(refresher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_reread_is_reported_and_logged() {
        let (logs, _guard) = CapturedLogs::install();
        let refresher = StubRefresher::answering(RefreshOutcome::Refreshed);
        let resolver = IdentityResolver::new(
            Arc::new(FailsAfterFirstRead::default()),
            Arc::new(refresher.clone()),
        );

        let err = resolver.resolve("abc").await.unwrap_err();

        assert!(matches!(err, ResolveError::Cache(_)));
        assert_eq!(refresher.calls(), 1);
        let out = logs.contents();
        assert!(out.contains("WARN"), "{out}");
        assert!(out.contains("identity cache re-read after refresh failed"), "{out}");
    }
}

//! Test doubles shared by the identity, auth and API tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::services::cache::{CacheClient, CacheError, CacheResult, MemoryCache};
use crate::services::identity::refresh::{IdentityRefresher, RefreshError, RefreshOutcome};

/// Refresher that answers without a network and counts calls.
///
/// In "populating" mode it writes the payload into the shared cache before
/// answering 200, like the real identity service does.
#[derive(Clone)]
pub struct StubRefresher {
    outcome: Result<RefreshOutcome, ()>,
    populate: Option<(MemoryCache, Vec<u8>)>,
    calls: Arc<AtomicUsize>,
    tokens: Arc<Mutex<Vec<String>>>,
}

impl StubRefresher {
    pub fn answering(outcome: RefreshOutcome) -> Self {
        Self {
            outcome: Ok(outcome),
            populate: None,
            calls: Arc::default(),
            tokens: Arc::default(),
        }
    }

    pub fn populating(cache: MemoryCache, payload: &[u8]) -> Self {
        Self {
            populate: Some((cache, payload.to_vec())),
            ..Self::answering(RefreshOutcome::Refreshed)
        }
    }

    /// Every call times out.
    pub fn failing() -> Self {
        Self {
            outcome: Err(()),
            ..Self::answering(RefreshOutcome::Refreshed)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityRefresher for StubRefresher {
    async fn refresh(&self, token: &str) -> Result<RefreshOutcome, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.to_string());

        let outcome = self.outcome.map_err(|_| RefreshError::Timeout)?;
        if let Some((cache, payload)) = &self.populate {
            cache.set_bytes(token, payload).await.unwrap();
        }
        Ok(outcome)
    }
}

/// Cache whose backend is always down.
pub struct FailingCache;

#[async_trait]
impl CacheClient for FailingCache {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn get_bytes(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }

    async fn set_bytes(&self, _key: &str, _value: &[u8]) -> CacheResult<()> {
        Err(CacheError::BackendConnection("connection refused".into()))
    }
}

/// Cache that answers the first read with a miss and is down afterwards.
#[derive(Default)]
pub struct FailsAfterFirstRead {
    reads: AtomicUsize,
}

#[async_trait]
impl CacheClient for FailsAfterFirstRead {
    fn backend_name(&self) -> &'static str {
        "flaky"
    }

    async fn get_bytes(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        if self.reads.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(None)
        } else {
            Err(CacheError::BackendConnection("connection reset".into()))
        }
    }

    async fn set_bytes(&self, _key: &str, _value: &[u8]) -> CacheResult<()> {
        Ok(())
    }
}

/// Formatted log output of the current thread, for asserting on log lines.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events here until the guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Serve `router` on an ephemeral loopback port; returns `http://127.0.0.1:<port>`.
pub async fn spawn_service(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

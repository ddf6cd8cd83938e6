//! Outbound refresh call to the identity service.
//!
//! A successful refresh means the identity service has (re)written the
//! caller's payload into the shared cache; the body of the reply is ignored.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Header carrying the session token on the refresh call.
pub const SIGN_HEADER: &str = "SIGN";

/// Hard bound on one refresh call.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    // HTTP 200
    Refreshed,
    // Any other status code
    Rejected(u16),
}

/// The refresh call did not produce an HTTP response.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("identity service timed out")]
    Timeout,
    #[error("identity service request failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait IdentityRefresher: Send + Sync + 'static {
    async fn refresh(&self, token: &str) -> Result<RefreshOutcome, RefreshError>;
}

/// Refresher backed by `POST <base-address><refresh-path>` with an empty body.
#[derive(Debug, Clone)]
pub struct HttpRefresher {
    client: reqwest::Client,
    url: Url,
}

impl HttpRefresher {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, RefreshError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RefreshError::Transport(e.to_string()))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl IdentityRefresher for HttpRefresher {
    async fn refresh(&self, token: &str) -> Result<RefreshOutcome, RefreshError> {
        let resp = self
            .client
            .post(self.url.clone())
            .header(SIGN_HEADER, token)
            .body("")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RefreshError::Timeout
                } else {
                    RefreshError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::OK {
            Ok(RefreshOutcome::Refreshed)
        } else {
            Ok(RefreshOutcome::Rejected(status.as_u16()))
        }
    }
}

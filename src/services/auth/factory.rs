/// Factory: build the identity hook from application `Config`.
use std::sync::Arc;

use anyhow::Context as _;

use crate::config::{Config, ConfigError};
use crate::middleware::auth::{IdentityHook, TrustLevel};
use crate::services::auth::SignTokenDecoder;
use crate::services::cache::{CacheClient, MemoryCache, ValkeyClient};
use crate::services::identity::{HttpRefresher, IdentityResolver};

pub async fn build_identity_hook(config: &Config) -> anyhow::Result<Arc<IdentityHook>> {
    let hook = match config.trust_level {
        TrustLevel::Trusted => {
            let secret = config
                .sign_jwt_secret
                .as_deref()
                .ok_or(ConfigError::Missing("SIGN_JWT_SECRET"))?;
            IdentityHook::trusted(SignTokenDecoder::from_secret(
                secret.as_bytes(),
                config.sign_token_leeway_seconds,
            ))
        }
        TrustLevel::Untrusted => {
            let url = config
                .identity_refresh_url
                .clone()
                .ok_or(ConfigError::Missing("IDENTITY_SERVICE_ADDR"))?;
            let refresher = HttpRefresher::new(url, config.identity_timeout)
                .context("failed to build identity service client")?;
            let cache = build_cache(config).await?;

            let resolver = IdentityResolver::new(cache, Arc::new(refresher))
                .with_namespace(config.cache_namespace.clone());
            IdentityHook::untrusted(resolver, config.infra_failure_policy)
        }
    };

    tracing::info!(trust_level = ?hook.trust_level(), "identity hook ready");
    Ok(Arc::new(hook))
}

async fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn CacheClient>> {
    match &config.cache_url {
        Some(url) => {
            let client = ValkeyClient::new(url)
                .await
                .context("failed to connect to identity cache")?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::warn!("CACHE_URL not set; using in-process identity cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builds_trusted_hook() {
        let config = Config::from_vars(|key| match key {
            "TRUST_LEVEL" => Some("trusted".into()),
            "SIGN_JWT_SECRET" => Some("s3cret".into()),
            _ => None,
        })
        .unwrap();

        let hook = build_identity_hook(&config).await.unwrap();
        assert_eq!(hook.trust_level(), TrustLevel::Trusted);
    }

    #[tokio::test]
    async fn test_builds_untrusted_hook_with_memory_cache() {
        let config = Config::from_vars(|key| match key {
            "IDENTITY_SERVICE_ADDR" => Some("http://127.0.0.1:9".into()),
            "IDENTITY_REFRESH_PATH" => Some("/user/refresh".into()),
            _ => None,
        })
        .unwrap();

        let hook = build_identity_hook(&config).await.unwrap();
        assert_eq!(hook.trust_level(), TrustLevel::Untrusted);
    }
}

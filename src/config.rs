/*
 * Responsibility
 * - Load settings from the environment (.env supported)
 * - Validate them up front (missing or invalid values fail startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::middleware::auth::{InfraFailurePolicy, TrustLevel};
use crate::services::identity::refresh::DEFAULT_REFRESH_TIMEOUT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub trust_level: TrustLevel,
    pub infra_failure_policy: InfraFailurePolicy,

    // None: in-process cache (development only)
    pub cache_url: Option<String>,
    pub cache_namespace: String,

    // <IDENTITY_SERVICE_ADDR><IDENTITY_REFRESH_PATH>
    pub identity_refresh_url: Option<Url>,
    pub identity_timeout: Duration,

    pub sign_jwt_secret: Option<String>,
    pub sign_token_leeway_seconds: u64,

    pub http_body_limit_bytes: usize,
    pub http_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("trust_level", &self.trust_level)
            .field("infra_failure_policy", &self.infra_failure_policy)
            .field("cache_namespace", &self.cache_namespace)
            .field("identity_refresh_url", &self.identity_refresh_url)
            .field("identity_timeout", &self.identity_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&var, "PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let trust_level = match var("TRUST_LEVEL") {
            Some(raw) => raw
                .parse::<TrustLevel>()
                .map_err(|_| ConfigError::Invalid("TRUST_LEVEL"))?,
            None => TrustLevel::Untrusted,
        };

        let infra_failure_policy = match var("INFRA_FAILURE_POLICY") {
            Some(raw) => raw
                .parse::<InfraFailurePolicy>()
                .map_err(|_| ConfigError::Invalid("INFRA_FAILURE_POLICY"))?,
            None => InfraFailurePolicy::default(),
        };

        let cache_url = var("CACHE_URL").filter(|s| !s.trim().is_empty());
        if cache_url.is_none() && app_env.is_production() && trust_level == TrustLevel::Untrusted
        {
            return Err(ConfigError::Missing("CACHE_URL"));
        }

        let cache_namespace = var("CACHE_NAMESPACE").unwrap_or_default();

        let identity_refresh_url = match (
            var("IDENTITY_SERVICE_ADDR"),
            var("IDENTITY_REFRESH_PATH"),
        ) {
            (Some(addr), Some(path)) => Some(
                Url::parse(&format!("{}{}", addr.trim(), path.trim()))
                    .map_err(|_| ConfigError::Invalid("IDENTITY_SERVICE_ADDR"))?,
            ),
            (None, _) if trust_level == TrustLevel::Untrusted => {
                return Err(ConfigError::Missing("IDENTITY_SERVICE_ADDR"));
            }
            (_, None) if trust_level == TrustLevel::Untrusted => {
                return Err(ConfigError::Missing("IDENTITY_REFRESH_PATH"));
            }
            _ => None,
        };

        let identity_timeout = match parse_opt::<u64>(&var, "IDENTITY_TIMEOUT_MS")? {
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_REFRESH_TIMEOUT,
        };

        let sign_jwt_secret = var("SIGN_JWT_SECRET").filter(|s| !s.is_empty());
        if sign_jwt_secret.is_none() && trust_level == TrustLevel::Trusted {
            return Err(ConfigError::Missing("SIGN_JWT_SECRET"));
        }

        let sign_token_leeway_seconds = parse_or(&var, "SIGN_TOKEN_LEEWAY_SECONDS", 60)?;

        let http_body_limit_bytes = parse_or(&var, "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;

        let http_timeout = Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECONDS", 30)?);

        Ok(Self {
            addr,
            app_env,
            trust_level,
            infra_failure_policy,
            cache_url,
            cache_namespace,
            identity_refresh_url,
            identity_timeout,
            sign_jwt_secret,
            sign_token_leeway_seconds,
            http_body_limit_bytes,
            http_timeout,
        })
    }
}

// Unset or blank keeps the default; anything else must parse.
fn parse_opt<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match var(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(None),
    }
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    Ok(parse_opt(var, key)?.unwrap_or(default))
}

//! Caller identity hook: transport signals → (resolve → validate) → context.
//!
//! The same hook serves both deployment trust levels:
//! - trusted origin: the signed token is decoded best-effort for a caller id;
//!   any failure is ignored and the call proceeds without one (fail-open).
//! - untrusted origin: the token is resolved through the identity cache and
//!   service, then validated; any failure rejects the call (fail-closed).

use std::net::SocketAddr;
use std::str::FromStr;

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, request::Parts};

use crate::context::Context;
use crate::rpc::{RpcError, ServerHooks};
use crate::services::auth::SignTokenDecoder;
use crate::services::identity::{CallerRecord, IdentityResolver, VerifiedCaller, validate};

pub const SIGN_HEADER: &str = "Sign";
pub const DEVICE_HEADER: &str = "Device";
pub const MOBI_APP_HEADER: &str = "MobiApp";
pub const VERSION_HEADER: &str = "Version";
pub const PLATFORM_HEADER: &str = "Platform";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    Trusted,
    Untrusted,
}

impl FromStr for TrustLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted" | "internal" => Ok(Self::Trusted),
            "untrusted" | "public" => Ok(Self::Untrusted),
            _ => Err(()),
        }
    }
}

/// What an untrusted-origin call gets when the cache or identity service fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InfraFailurePolicy {
    /// Same as "no identity": rejected as not logged in.
    #[default]
    Collapse,
    /// Rejected as `unavailable`, distinguishable from a bad credential.
    Surface,
}

impl FromStr for InfraFailurePolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collapse" => Ok(Self::Collapse),
            "surface" => Ok(Self::Surface),
            _ => Err(()),
        }
    }
}

/// How the hook turns a token into a caller.
#[derive(Debug, Clone)]
pub enum IdentityStrategy {
    SignedToken(SignTokenDecoder),
    Resolve {
        resolver: IdentityResolver,
        policy: InfraFailurePolicy,
    },
}

/// Header and connection values copied verbatim into the context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportSignals {
    pub sign: Option<String>,
    pub device: Option<String>,
    pub mobi_app: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub caller_ip: Option<String>,
}

impl TransportSignals {
    pub fn from_parts(parts: &Parts) -> Self {
        let header = |name: &str| header_value(&parts.headers, name);

        Self {
            sign: header(SIGN_HEADER),
            device: header(DEVICE_HEADER),
            mobi_app: header(MOBI_APP_HEADER),
            version: header(VERSION_HEADER),
            platform: header(PLATFORM_HEADER),
            caller_ip: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        }
    }

    /// Absent signals are left unset rather than written as empty strings.
    pub fn write_into(&self, ctx: &Context) -> Context {
        let mut ctx = ctx.clone();
        if let Some(v) = &self.sign {
            ctx = ctx.with_sign(v.as_str());
        }
        if let Some(v) = &self.device {
            ctx = ctx.with_device(v.as_str());
        }
        if let Some(v) = &self.mobi_app {
            ctx = ctx.with_mobi_app(v.as_str());
        }
        if let Some(v) = &self.version {
            ctx = ctx.with_version(v.as_str());
        }
        if let Some(v) = &self.platform {
            ctx = ctx.with_platform(v.as_str());
        }
        if let Some(v) = &self.caller_ip {
            ctx = ctx.with_caller_ip(v.as_str());
        }
        ctx
    }
}

/// A present header is always reported, whatever bytes it carries; only a
/// missing header reads as `None`.
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn now_epoch_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Debug, Clone)]
pub struct IdentityHook {
    strategy: IdentityStrategy,
    clock: fn() -> i64,
}

impl IdentityHook {
    pub fn new(strategy: IdentityStrategy) -> Self {
        Self {
            strategy,
            clock: now_epoch_seconds,
        }
    }

    pub fn trusted(decoder: SignTokenDecoder) -> Self {
        Self::new(IdentityStrategy::SignedToken(decoder))
    }

    pub fn untrusted(resolver: IdentityResolver, policy: InfraFailurePolicy) -> Self {
        Self::new(IdentityStrategy::Resolve { resolver, policy })
    }

    /// Replace the wall clock used for the organization expiry check.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn trust_level(&self) -> TrustLevel {
        match self.strategy {
            IdentityStrategy::SignedToken(_) => TrustLevel::Trusted,
            IdentityStrategy::Resolve { .. } => TrustLevel::Untrusted,
        }
    }

    fn decode_caller(decoder: &SignTokenDecoder, ctx: Context, token: &str) -> Context {
        match decoder.caller_id(token) {
            Ok(caller_id) => ctx.with_caller_id(caller_id),
            Err(err) => {
                tracing::debug!(
                    error = %err,
                    "sign token not decodable; continuing anonymously"
                );
                ctx
            }
        }
    }

    async fn authorize(
        &self,
        resolver: &IdentityResolver,
        policy: InfraFailurePolicy,
        ctx: Context,
        token: &str,
    ) -> Result<Context, RpcError> {
        let payload = if token.is_empty() {
            None
        } else {
            match resolver.resolve(token).await {
                Ok(payload) => payload,
                Err(err) => match policy {
                    InfraFailurePolicy::Collapse => {
                        tracing::debug!(
                            error = %err,
                            "identity unavailable; treating caller as anonymous"
                        );
                        None
                    }
                    InfraFailurePolicy::Surface => {
                        return Err(RpcError::unavailable("identity service unavailable"));
                    }
                },
            }
        };

        let record = payload
            .map(|p| CallerRecord::decode(&p))
            .unwrap_or_default();

        let caller = validate(record, (self.clock)()).map_err(|rejection| {
            tracing::info!(
                method = ?ctx.method_name(),
                reason = %rejection,
                "caller rejected"
            );
            RpcError::unauthenticated(rejection.to_string())
        })?;

        Ok(enrich(&ctx, &caller))
    }
}

/// Write every field of a verified caller into the context, one key each.
fn enrich(ctx: &Context, caller: &VerifiedCaller) -> Context {
    let record = caller.record();
    ctx.with_caller_id(record.id)
        .with_user_name(record.user_name.as_str())
        .with_nick_name(record.nick_name.as_str())
        .with_company_id(record.company_id)
        .with_department_id(record.department_id)
        .with_part_ids(record.part_ids.as_str())
        .with_department_ids(record.department_ids.as_str())
        .with_roles_codes(record.roles_codes.as_str())
}

#[async_trait]
impl ServerHooks for IdentityHook {
    async fn request_routed(&self, ctx: Context) -> Result<Context, RpcError> {
        let Some(parts) = ctx.http_request() else {
            return Ok(ctx);
        };
        let signals = TransportSignals::from_parts(parts);
        let ctx = signals.write_into(&ctx);
        let token = signals.sign.as_deref().unwrap_or_default();

        match &self.strategy {
            IdentityStrategy::SignedToken(decoder) => {
                Ok(Self::decode_caller(decoder, ctx, token))
            }
            IdentityStrategy::Resolve { resolver, policy } => {
                self.authorize(resolver, *policy, ctx, token).await
            }
        }
    }
}

//! RPC service router.
//!
//! One `RpcServer` serves one `<package>.<Service>`. For every call it builds a
//! fresh `Context` carrying the routing names and the raw request head, hands
//! it to the hooks, and only then dispatches to the method handler.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::Value;

use crate::context::{Context, StagedHeaders};
use crate::rpc::{RpcError, ServerHooks};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, RpcError>> + Send>>;

type Handler = Arc<dyn Fn(Context, Bytes) -> HandlerFuture + Send + Sync>;

#[derive(Clone)]
pub struct RpcServer {
    package: String,
    service: String,
    methods: HashMap<String, Handler>,
    hooks: Option<Arc<dyn ServerHooks>>,
}

impl RpcServer {
    pub fn new(package: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            service: service.into(),
            methods: HashMap::new(),
            hooks: None,
        }
    }

    /// Register a method handler. The handler receives the context returned by
    /// the hooks and the raw JSON request body.
    pub fn method<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Context, Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx: Context, body: Bytes| -> HandlerFuture {
            Box::pin(handler(ctx, body))
        });
        self.methods.insert(name.into(), handler);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ServerHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// `/twirp/<package>.<Service>`
    pub fn path_prefix(&self) -> String {
        format!("/twirp/{}.{}", self.package, self.service)
    }

    pub fn into_router(self) -> Router {
        let path = format!("{}/{{method}}", self.path_prefix());
        Router::new()
            .route(&path, post(dispatch))
            .with_state(Arc::new(self))
    }

    async fn serve(
        &self,
        method: &str,
        parts: Parts,
        body: Result<Bytes, RpcError>,
        staged: &StagedHeaders,
    ) -> Result<(Context, Value), RpcError> {
        let handler = self.methods.get(method).cloned().ok_or_else(|| {
            RpcError::bad_route(format!("no handler for path {}/{}", self.path_prefix(), method))
        })?;
        let body = body?;

        let mut ctx = Context::new()
            .with_package_name(self.package.as_str())
            .with_service_name(self.service.as_str())
            .with_method_name(method)
            .with_http_request(Arc::new(parts))
            .with_response_headers(staged.clone());

        if let Some(hooks) = &self.hooks {
            ctx = hooks.request_routed(ctx).await?;
        }

        let value = handler(ctx.clone(), body).await?;
        Ok((ctx, value))
    }
}

async fn dispatch(
    State(server): State<Arc<RpcServer>>,
    Path(method): Path<String>,
    parts: Parts,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        // A body over the configured limit keeps its 413.
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::info!(
                service = %server.path_prefix(),
                method = %method,
                status = rejection.status().as_u16(),
                "rpc request body too large"
            );
            return rejection.into_response();
        }
        other => other
            .map_err(|e| RpcError::malformed(format!("failed to read request body: {e}"))),
    };

    let staged = StagedHeaders::new();

    let mut response = match server.serve(&method, parts, body, &staged).await {
        Ok((ctx, value)) => {
            let ctx = ctx.with_status_code(200);
            tracing::info!(
                package = ?ctx.package_name(),
                service = ?ctx.service_name(),
                method = ?ctx.method_name(),
                status = ?ctx.status_code(),
                caller_id = ?ctx.caller_id(),
                "rpc call served"
            );
            Json(value).into_response()
        }
        Err(err) => {
            tracing::info!(
                service = %server.path_prefix(),
                method = %method,
                code = %err.code(),
                status = err.code().http_status().as_u16(),
                "rpc call rejected"
            );
            err.into_response()
        }
    };

    response.headers_mut().extend(staged.take());
    response
}

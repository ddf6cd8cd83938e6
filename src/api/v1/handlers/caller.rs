/*
 * Responsibility
 * - identity.v1.Caller RPC handlers
 * - Read caller attributes only through the context accessors
 */
use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue};
use serde_json::Value;

use crate::api::v1::dto::caller::WhoAmIResponse;
use crate::context::Context;
use crate::rpc::RpcError;

const CALLER_ID_HEADER: HeaderName = HeaderName::from_static("x-caller-id");

pub async fn who_am_i(ctx: Context, _body: Bytes) -> Result<Value, RpcError> {
    if let (Some(caller_id), Some(headers)) = (ctx.caller_id(), ctx.response_headers()) {
        headers.insert(CALLER_ID_HEADER, HeaderValue::from(caller_id));
    }

    serde_json::to_value(WhoAmIResponse::from_context(&ctx)).map_err(|e| {
        tracing::error!(error = %e, "failed to encode WhoAmI response");
        RpcError::internal("failed to encode response")
    })
}

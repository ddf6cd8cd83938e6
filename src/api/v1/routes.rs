/*
 * Responsibility
 * - v1 URL structure
 * - HTTP routes stay outside the identity hook; RPC services run behind it
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{caller::who_am_i, health::health};
use crate::rpc::RpcServer;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub fn rpc_services(state: &AppState) -> Router {
    RpcServer::new("identity.v1", "Caller")
        .method("WhoAmI", who_am_i)
        .with_hooks(state.identity.clone())
        .into_router()
}

//! Per-call caller identity for JSON-over-HTTP RPC services.
//!
//! `middleware::auth::IdentityHook` runs before every RPC handler: it copies
//! transport signals into the call's `Context`, resolves the session token
//! (cache first, identity service on a miss), validates the caller and either
//! enriches the context or rejects the call as unauthenticated.

pub mod api;
pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
pub mod rpc;
pub mod services;
pub mod state;

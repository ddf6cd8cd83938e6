/*
 * Responsibility
 * - Public surface of v1 (HTTP routes and RPC services)
 */
pub mod dto;
pub mod handlers;
mod routes;

pub use routes::{routes, rpc_services};

/*
 * Responsibility
 * - auth: per-call identity hook run by the RPC server
 * - http: cross-cutting HTTP layers (request id, tracing, limits)
 */
pub mod auth;
pub mod http;

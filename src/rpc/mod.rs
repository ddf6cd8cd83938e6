/*
 * Responsibility
 * - JSON-over-HTTP RPC surface: POST /twirp/<package>.<Service>/<Method>
 * - Hook seam invoked once per call before dispatch (ServerHooks)
 * - Error codes and their HTTP mapping (RpcError)
 */
pub mod error;
pub mod hooks;
pub mod server;

pub use error::{ErrorCode, RpcError};
pub use hooks::ServerHooks;
pub use server::RpcServer;

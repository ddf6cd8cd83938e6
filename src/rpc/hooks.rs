use async_trait::async_trait;

use crate::context::Context;
use crate::rpc::RpcError;

/// Hooks run by `RpcServer` around every call.
///
/// `request_routed` runs exactly once per call, after the target method is
/// known and before the handler. Returning `Err` aborts the call: the handler
/// is never invoked and the error is sent to the caller.
#[async_trait]
pub trait ServerHooks: Send + Sync + 'static {
    async fn request_routed(&self, ctx: Context) -> Result<Context, RpcError> {
        Ok(ctx)
    }
}

/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to clone (Arc inside)
 */
use std::sync::Arc;

use crate::middleware::auth::IdentityHook;

#[derive(Clone, Debug)]
pub struct AppState {
    pub identity: Arc<IdentityHook>,
}

impl AppState {
    pub fn new(identity: Arc<IdentityHook>) -> Self {
        Self { identity }
    }
}

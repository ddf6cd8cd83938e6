//! Identity resolution: token → raw payload → validated caller.
pub mod record;
pub mod refresh;
pub mod resolver;
pub mod validation;

#[cfg(test)]
pub mod testing;

pub use record::{ACTIVE_STATUS, CallerRecord, Organization};
pub use refresh::{HttpRefresher, IdentityRefresher, RefreshError, RefreshOutcome};
pub use resolver::{IdentityResolver, ResolveError};
pub use validation::{Rejection, VerifiedCaller, validate};

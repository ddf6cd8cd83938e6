//! Request-scoped context.
//!
//! Every inbound call gets its own `Context`. Writers never mutate a context in
//! place: `with_*` layers a new frame over the previous one and returns the new
//! handle, so a parent frame can be shared by any number of readers.

mod accessors;
pub mod keys;
mod store;

pub use keys::{ContextKey, Slot};
pub use store::{Context, StagedHeaders};

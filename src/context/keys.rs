//! Typed context keys.
//!
//! Each key is a zero-sized marker bound to exactly one value type, so a read
//! through the wrong type cannot compile. `Slot` is the closed registry of all
//! keys; two concerns can never collide on a string name.

use std::sync::Arc;

use axum::http::request::Parts;

use super::store::StagedHeaders;

/// A typed token used to store and look up one value in a `Context`.
pub trait ContextKey: 'static {
    type Value: Send + Sync + 'static;

    const SLOT: Slot;
}

macro_rules! context_keys {
    ($($(#[$meta:meta])* $name:ident => $value:ty;)*) => {
        /// Every key known to the context store.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Slot {
            $($name,)*
        }

        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl ContextKey for $name {
                type Value = $value;

                const SLOT: Slot = Slot::$name;
            }
        )*
    };
}

context_keys! {
    /// Session token from the `Sign` header.
    Sign => String;
    /// Device class (ios, android, web, ...).
    Device => String;
    /// App identifier from the `MobiApp` header.
    MobiApp => String;
    /// Client version.
    Version => String;
    Platform => String;
    /// Caller network address, taken from the connection.
    CallerIp => String;

    /// Verified caller id. Never written as 0.
    CallerId => i64;
    UserName => String;
    NickName => String;
    CompanyId => i64;
    DepartmentId => i64;
    /// Role ids, comma-separated as received.
    PartIds => String;
    /// Department ids, comma-separated as received.
    DepartmentIds => String;
    /// Permission codes, comma-separated as received.
    RolesCodes => String;

    MethodName => String;
    ServiceName => String;
    PackageName => String;
    /// HTTP status code of the response, once known.
    StatusCode => u16;
    /// Raw inbound request head.
    HttpRequest => Arc<Parts>;
    /// Headers staged for the outbound response.
    ResponseHeaders => StagedHeaders;
}

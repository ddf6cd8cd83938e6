pub mod identity;

pub use identity::{
    IdentityHook, IdentityStrategy, InfraFailurePolicy, TransportSignals, TrustLevel,
};

pub mod factory;
pub mod sign_token;

pub use factory::build_identity_hook;
pub use sign_token::{SignTokenDecoder, SignTokenError};

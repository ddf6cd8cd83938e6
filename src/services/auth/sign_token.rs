use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignTokenError {
    #[error("empty sign token")]
    Empty,
    #[error("sign token verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("sign token carries no caller id")]
    MissingCallerId,
}

/// Claims of a self-contained session token.
///
/// `data` is whatever the session issuer embedded; for callers it is the
/// caller id, as a JSON number or a numeric string. `exp` is required and
/// checked by `Validation`.
#[derive(Debug, Clone, Deserialize)]
struct SignClaims {
    #[serde(default)]
    data: Value,
}

/// HS256 verifier for session tokens issued to trusted origins.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SignTokenDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SignTokenDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("SignTokenDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl SignTokenDecoder {
    pub fn from_secret(secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        // Session tokens are not audience-scoped.
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify `token` and return the caller id it carries.
    pub fn caller_id(&self, token: &str) -> Result<i64, SignTokenError> {
        if token.is_empty() {
            return Err(SignTokenError::Empty);
        }

        let data =
            jsonwebtoken::decode::<SignClaims>(token, &self.decoding_key, &self.validation)?;

        caller_id_from(&data.claims.data).ok_or(SignTokenError::MissingCallerId)
    }
}

fn caller_id_from(data: &Value) -> Option<i64> {
    let id = match data {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id != 0)
}

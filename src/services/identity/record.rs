use serde::{Deserialize, Serialize};

/// Status code shared by accounts and organizations that are in effect.
pub const ACTIVE_STATUS: i64 = 100;

/// Caller identity as published by the identity service.
///
/// Every field defaults, so a payload missing fields still decodes; a payload
/// that does not decode at all yields `CallerRecord::default()` (id 0).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallerRecord {
    pub id: i64,
    pub company_id: i64,
    pub department_id: i64,
    // role ids, comma-separated
    pub part_ids: String,
    pub department_ids: String,
    pub nick_name: String,
    pub user_name: String,
    // permission codes, comma-separated
    pub roles_codes: String,
    pub status: i8,
    pub company: Organization,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Organization {
    pub status: i32,
    // epoch seconds
    pub expiry_time: i64,
}

impl CallerRecord {
    /// Decode a raw identity payload. Malformed or empty input is not an
    /// error here: it becomes an anonymous record and is rejected later.
    pub fn decode(payload: &[u8]) -> Self {
        if payload.is_empty() {
            return Self::default();
        }

        serde_json::from_slice(payload).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "malformed identity payload");
            Self::default()
        })
    }
}

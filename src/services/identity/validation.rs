//! Acceptance rules over a decoded caller record.
//!
//! Rules run in a fixed order and the first failure wins.

use thiserror::Error;

use super::record::{ACTIVE_STATUS, CallerRecord};

/// Why a caller was refused. The message is shown to the caller verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("please log in first.")]
    NotLoggedIn,
    #[error("account has been disabled.")]
    AccountDisabled,
    #[error("organization has been disabled.")]
    OrganizationDisabled,
    #[error("organization has expired.")]
    OrganizationExpired,
}

/// A caller record that passed every rule. Only `validate` builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCaller(CallerRecord);

impl VerifiedCaller {
    pub fn record(&self) -> &CallerRecord {
        &self.0
    }
}

type Rule = fn(&CallerRecord, i64) -> Result<(), Rejection>;

const RULES: [Rule; 4] = [
    logged_in,
    account_active,
    organization_active,
    organization_current,
];

/// Run the rules against `record` at time `now` (epoch seconds).
pub fn validate(record: CallerRecord, now: i64) -> Result<VerifiedCaller, Rejection> {
    for rule in RULES {
        rule(&record, now)?;
    }
    Ok(VerifiedCaller(record))
}

fn logged_in(record: &CallerRecord, _now: i64) -> Result<(), Rejection> {
    if record.id == 0 {
        return Err(Rejection::NotLoggedIn);
    }
    Ok(())
}

fn account_active(record: &CallerRecord, _now: i64) -> Result<(), Rejection> {
    if i64::from(record.status) != ACTIVE_STATUS {
        return Err(Rejection::AccountDisabled);
    }
    Ok(())
}

fn organization_active(record: &CallerRecord, _now: i64) -> Result<(), Rejection> {
    if i64::from(record.company.status) != ACTIVE_STATUS {
        return Err(Rejection::OrganizationDisabled);
    }
    Ok(())
}

fn organization_current(record: &CallerRecord, now: i64) -> Result<(), Rejection> {
    // Expiry equal to now counts as expired.
    if record.company.expiry_time <= now {
        return Err(Rejection::OrganizationExpired);
    }
    Ok(())
}

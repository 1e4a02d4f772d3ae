// ledger-types/src/lib.rs

//! Shared primitives for the staking-fund workspace
//!
//! This crate provides:
//! - `Amount`: arbitrary-precision token amounts with checked arithmetic
//! - `AccountId`: opaque account identity
//! - Timestamp and day-key helpers for term and accrual math
//! - Role-gated capability checks for privileged operations

pub mod account;
pub mod amount;
pub mod roles;
pub mod time;

pub use account::AccountId;
pub use amount::{Amount, BPS_SCALE};
pub use roles::{AccessRegistry, Role};
pub use time::{day_key, days, hours, Timestamp, SECONDS_PER_DAY, SECONDS_PER_HOUR};

/// Result type for access checks
pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised by capability checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("unauthorized: {caller} lacks the {role:?} role")]
    Unauthorized { caller: AccountId, role: Role },
}

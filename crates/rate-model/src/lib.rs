// rate-model/src/lib.rs

//! Entitlement math for the staking engines
//!
//! Three accrual variants selected per engine (fixed-term, daily-rate,
//! compounded daily), plus the pure pool-share split used by the pool
//! manager.
//!
//! All math is exact integer arithmetic; rates are basis points
//! (10_000 == 100%). A day without a configured rate is a recoverable
//! lookup failure, never a silent zero.

pub mod daily;
pub mod entitlement;

pub use daily::{DailyRate, DailyRateTable};
pub use entitlement::{early_exit_amount, fixed_term_return, pool_share};

use ledger_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for rate computations
pub type RateResult<T> = Result<T, RateError>;

/// Errors that can occur during rate computations
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("missing rate data for day {day}")]
    MissingRateData { day: Timestamp },
}

/// Return-computation variant an engine is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateModel {
    /// Whole-percent return unlocked at maturity; early exit pays a penalty
    FixedTerm,
    /// Simple interest from the daily-rate table, no maturity
    DailyRate,
    /// Day-by-day compounding from the daily-rate table, no maturity
    CompoundedDaily,
}

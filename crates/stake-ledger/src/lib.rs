// stake-ledger/src/lib.rs

//! Stake lifecycle state machine and liquidity-aware settlement
//!
//! This crate owns the collection of stake and stake-type records and
//! implements:
//! - stake creation against operator-defined stake types
//! - full and partial withdrawal with continuation stakes
//! - early cancellation with penalties
//! - claiming of matured and cancelled stakes
//! - operator batch settlement of deferred payouts
//!
//! A liquidity shortfall during a payout is not an error: the stake is
//! paid what the fund can cover now and the remainder is recorded as a
//! settlement amount to be paid later.

pub mod engine;
pub mod settlement;
pub mod stake;

pub use engine::StakeLedger;
pub use stake::{Stake, StakeId, StakeType, StakeTypeId};

use ledger_types::{AccessError, AccountId, Amount};
use rate_model::RateError;
use value_ledger::ValueLedgerError;

/// Result type for stake-ledger operations
pub type StakeResult<T> = Result<T, StakeError>;

/// Errors that can occur in stake-ledger operations
#[derive(Debug, thiserror::Error)]
pub enum StakeError {
    #[error("invalid stake type: {0}")]
    InvalidStakeType(StakeTypeId),

    #[error("amount {amount} outside allowed range [{min}, {max}]")]
    AmountOutOfRange {
        amount: Amount,
        min: Amount,
        max: Amount,
    },

    #[error("stake not found: {0}")]
    StakeNotFound(StakeId),

    #[error("caller {caller} does not own stake {stake_id}")]
    NotStakeOwner {
        stake_id: StakeId,
        caller: AccountId,
    },

    #[error("stake {0} is not active")]
    StakeNotActive(StakeId),

    #[error("stake {0} has not matured")]
    StakeNotMatured(StakeId),

    #[error("stake {0} has already matured")]
    StakeAlreadyMatured(StakeId),

    #[error("stake {0} is already settled")]
    AlreadySettled(StakeId),

    #[error(transparent)]
    MissingRateData(#[from] RateError),

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] ValueLedgerError),

    #[error(transparent)]
    Unauthorized(#[from] AccessError),
}

// pool-manager/src/lib.rs

//! Windowed, multi-participant staking pools
//!
//! An operator opens a time-bounded deposit window for a pool type;
//! participants stake into it while the window is open, the pool then
//! locks for its staking period, and rewards added by the operator are
//! distributed proportionally to principal share at withdrawal time.

pub mod manager;
pub mod pool;

pub use manager::PoolManager;
pub use pool::{PoolConfig, PoolInstance, PoolInstanceId, PoolStake, PoolStakeId, PoolStatus, PoolTypeId};

use ledger_types::{AccessError, AccountId};
use value_ledger::ValueLedgerError;

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur in pool operations
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("unknown pool type: {0}")]
    PoolNotFound(PoolTypeId),

    #[error("unknown pool instance: {0}")]
    InstanceNotFound(PoolInstanceId),

    #[error("pool type {0} already has an open instance")]
    PoolAlreadyOpen(PoolTypeId),

    #[error("deposit window for pool type {0} is closed")]
    DepositWindowClosed(PoolTypeId),

    #[error("pool stake not found: {0}")]
    StakeNotFound(PoolStakeId),

    #[error("caller {caller} does not own pool stake {stake_id}")]
    NotStakeOwner {
        stake_id: PoolStakeId,
        caller: AccountId,
    },

    #[error("pool stake {0} has not reached the end of its staking period")]
    StakeNotMatured(PoolStakeId),

    #[error("pool stake {0} was already withdrawn")]
    AlreadySettled(PoolStakeId),

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] ValueLedgerError),

    #[error(transparent)]
    Unauthorized(#[from] AccessError),
}

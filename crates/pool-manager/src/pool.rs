// pool-manager/src/pool.rs

use ledger_types::{days, AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Pool type identifier (indexes the configured catalogue)
pub type PoolTypeId = u32;

/// Sequential pool-instance identifier, starting at 1
pub type PoolInstanceId = u64;

/// Sequential pool-stake identifier, starting at 1
pub type PoolStakeId = u64;

/// Staking period configuration for one pool type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool type identifier
    pub id: PoolTypeId,
    /// Staking period in days, counted from the end of the deposit window
    pub term_days: u64,
}

/// Lifecycle phase of a pool instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// Accepting deposits
    Open,
    /// Deposit window closed, staking period running
    Locked,
    /// Staking period elapsed, withdrawals allowed
    Matured,
}

/// One time-bounded run of a pool type.
///
/// Superseded (never deleted) by the next instance of the same type;
/// `total_staked` and `pool_reward` are the snapshot every participant's
/// share is computed from, so neither decreases once the window closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInstance {
    /// Instance identifier
    pub id: PoolInstanceId,
    /// Pool type this instance runs
    pub pool_type: PoolTypeId,
    /// When the deposit window opened
    pub start_of_deposit: Timestamp,
    /// When the deposit window closes
    pub end_of_deposit: Timestamp,
    /// Staking period in days, fixed at open time
    pub term_days: u64,
    /// Sum of all participant principals
    pub total_staked: Amount,
    /// Accumulated reward pool awaiting distribution
    pub pool_reward: Amount,
}

impl PoolInstance {
    /// When the staking period ends and withdrawals unlock
    pub fn end_of_staking(&self) -> Timestamp {
        self.end_of_deposit + days(self.term_days)
    }

    /// Whether the deposit window is open at `now`
    pub fn accepting_deposits(&self, now: Timestamp) -> bool {
        now >= self.start_of_deposit && now < self.end_of_deposit
    }

    /// Whether the staking period has elapsed at `now`
    pub fn is_mature(&self, now: Timestamp) -> bool {
        now >= self.end_of_staking()
    }

    /// Lifecycle phase at `now`
    pub fn status(&self, now: Timestamp) -> PoolStatus {
        if self.accepting_deposits(now) {
            PoolStatus::Open
        } else if self.is_mature(now) {
            PoolStatus::Matured
        } else {
            PoolStatus::Locked
        }
    }
}

/// One participant's contribution to a pool instance.
///
/// Distinct from fixed-term stakes: there is no per-stake maturity or
/// penalty, only the instance-wide staking period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStake {
    /// Stake identifier
    pub id: PoolStakeId,
    /// Owning account
    pub owner: AccountId,
    /// Instance the contribution belongs to
    pub instance_id: PoolInstanceId,
    /// Contributed principal
    pub amount: Amount,
    /// When the contribution was made
    pub staked_at: Timestamp,
    /// Paid out; irreversible per stake
    pub withdrawn: bool,
}

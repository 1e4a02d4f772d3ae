// stake-ledger/src/stake.rs

use ledger_types::{days, AccountId, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Sequential stake identifier, starting at 1 and never reused
pub type StakeId = u64;

/// Sequential stake-type identifier, starting at 1
pub type StakeTypeId = u64;

/// Operator-defined staking product.
///
/// Updates apply to future computations only; stakes already settled are
/// never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeType {
    /// Type identifier
    pub id: StakeTypeId,
    /// Term in days (zero for open-ended accrual models)
    pub term: u64,
    /// Whole-percent return at maturity
    pub percentage_return: u64,
    /// Flat penalty charged on early exit
    pub penalty_amount: Amount,
    /// Whole-percent penalty charged on early exit
    pub penalty_percentage: u64,
    /// Smallest accepted stake
    pub min_amount: Amount,
    /// Largest accepted stake (zero means no cap)
    pub max_amount: Amount,
}

impl StakeType {
    /// Check `amount` against the configured bounds
    pub fn accepts(&self, amount: &Amount) -> bool {
        if amount < &self.min_amount {
            return false;
        }
        if !self.max_amount.is_zero() && amount > &self.max_amount {
            return false;
        }
        true
    }
}

/// A single deposited principal position with its own lifecycle.
///
/// `active == false` is permanent once set, and `settled == true` is
/// terminal. `settlement_amount` only ever decreases, reaching zero no
/// later than the moment `settled` flips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    /// Stake identifier
    pub id: StakeId,
    /// Owning account
    pub owner: AccountId,
    /// Deposited principal
    pub principal: Amount,
    /// Stake type this position was opened against
    pub stake_type_id: StakeTypeId,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Timestamp after which the full term return is available
    pub matures_at: Timestamp,
    /// Position is open and accruing
    pub active: bool,
    /// Cancelled before maturity
    pub cancelled: bool,
    /// Reached maturity and was claimed or closed
    pub matured: bool,
    /// All owed value has been paid out
    pub settled: bool,
    /// Closed by a partial withdrawal or an underfunded payout
    pub partial_withdrawn: bool,
    /// Owed but not yet paid due to insufficient liquidity
    pub settlement_amount: Amount,
    /// Return earned over principal, recorded at close
    pub stake_returns: Amount,
    /// Continuation stake holding the principal remainder after a
    /// partial withdrawal; forward-only, never mutated after being set
    pub linked_stake_id: Option<StakeId>,
}

impl Stake {
    /// Open a new active stake against `stake_type`
    pub fn open(
        id: StakeId,
        owner: AccountId,
        principal: Amount,
        stake_type: &StakeType,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            principal,
            stake_type_id: stake_type.id,
            created_at: now,
            matures_at: now + days(stake_type.term),
            active: true,
            cancelled: false,
            matured: false,
            settled: false,
            partial_withdrawn: false,
            settlement_amount: Amount::zero(),
            stake_returns: Amount::zero(),
            linked_stake_id: None,
        }
    }

    /// Whether the maturity timestamp has passed
    pub fn is_mature(&self, now: Timestamp) -> bool {
        now >= self.matures_at
    }

    /// Whether a deferred payout is still owed
    pub fn has_unpaid_settlement(&self) -> bool {
        !self.settled && !self.settlement_amount.is_zero()
    }
}

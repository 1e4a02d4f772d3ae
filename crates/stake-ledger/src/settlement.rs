// stake-ledger/src/settlement.rs

//! Operator batch settlement of deferred payouts.
//!
//! Each listed stake is paid its full owed amount or skipped untouched;
//! there is no partial-partial splitting within a settlement attempt.
//! Already-settled ids are skipped silently, so re-running a batch is a
//! no-op, and a stake that cannot be paid never blocks the ids after it.

use crate::{engine::StakeLedger, stake::StakeId, StakeResult};
use ledger_types::{AccountId, Role, Timestamp};
use value_ledger::ValueLedger;

impl<L: ValueLedger> StakeLedger<L> {
    /// Re-attempt payout of previously underfunded stakes, in the order
    /// given.
    ///
    /// Returns the ids settled by this batch.
    pub fn settle_stakes(
        &mut self,
        caller: &AccountId,
        stake_ids: &[StakeId],
        now: Timestamp,
    ) -> StakeResult<Vec<StakeId>> {
        self.access().require(caller, Role::Operator)?;

        let mut settled = Vec::new();
        for &stake_id in stake_ids {
            match self.try_settle(stake_id, now) {
                Ok(true) => settled.push(stake_id),
                Ok(false) => {}
                Err(e) => {
                    // One unpayable id must not block the rest of the batch
                    tracing::warn!(stake_id, error = %e, "settlement attempt failed, continuing");
                }
            }
        }

        tracing::info!(
            requested = stake_ids.len(),
            settled = settled.len(),
            "settlement batch processed"
        );
        Ok(settled)
    }

    /// Settle one stake if its full owed amount is fundable right now
    fn try_settle(&mut self, stake_id: StakeId, now: Timestamp) -> StakeResult<bool> {
        let stake = self.get_stake(stake_id)?;

        if stake.settled {
            tracing::debug!(stake_id, "already settled, skipping");
            return Ok(false);
        }

        if stake.active {
            // A matured stake the owner never claimed can be closed out
            // here, but only when the whole entitlement is fundable
            if !stake.is_mature(now) {
                return Ok(false);
            }
            let snapshot = stake.clone();
            let entitled = self.entitlement(&snapshot, &snapshot.principal, now)?;
            if self.liquidity() < entitled {
                return Ok(false);
            }

            let owner = snapshot.owner.clone();
            {
                let stake = self.stake_mut(stake_id).expect("validated above");
                stake.active = false;
                stake.matured = true;
                stake.settled = true;
                stake.stake_returns = entitled.saturating_sub(&snapshot.principal);
            }
            if let Err(e) = self.pay_out(&owner, &entitled) {
                self.rollback(stake_id, snapshot, None);
                return Err(e);
            }
            tracing::info!(stake_id, paid = %entitled, "matured stake settled");
            return Ok(true);
        }

        if !stake.has_unpaid_settlement() {
            return Ok(false);
        }

        let snapshot = stake.clone();
        let owed = snapshot.settlement_amount.clone();
        if self.liquidity() < owed {
            tracing::debug!(stake_id, owed = %owed, "insufficient liquidity, skipping");
            return Ok(false);
        }

        let owner = snapshot.owner.clone();
        {
            let stake = self.stake_mut(stake_id).expect("validated above");
            stake.settlement_amount = ledger_types::Amount::zero();
            stake.settled = true;
        }
        if let Err(e) = self.pay_out(&owner, &owed) {
            self.rollback(stake_id, snapshot, None);
            return Err(e);
        }

        tracing::info!(stake_id, paid = %owed, "deferred stake settled");
        Ok(true)
    }
}

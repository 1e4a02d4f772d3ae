// stake-ledger/src/engine.rs

use crate::{
    stake::{Stake, StakeId, StakeType, StakeTypeId},
    StakeError, StakeResult,
};
use ledger_types::{AccessRegistry, AccountId, Amount, Role, Timestamp};
use rate_model::{DailyRate, DailyRateTable, RateModel};
use rate_model::{early_exit_amount, fixed_term_return};
use std::collections::{BTreeMap, HashMap};
use value_ledger::ValueLedger;

/// The staking fund engine.
///
/// Owns all stake and stake-type records and a fund account on the value
/// ledger. Every public operation takes the caller identity and a single
/// `now` timestamp; all maturity comparisons within one operation use that
/// same snapshot.
///
/// Payout ordering: record state is finalized before the external transfer
/// runs, and a transfer failure rolls the record back to its pre-operation
/// snapshot, so no path can observe a double-paid or double-owed stake.
pub struct StakeLedger<L: ValueLedger> {
    /// The engine's own fund account on the value ledger
    account: AccountId,
    /// External fungible-value ledger
    funds: L,
    /// Role grants for privileged operations
    access: AccessRegistry,
    /// Return-computation variant
    model: RateModel,
    /// Stake types by id
    stake_types: BTreeMap<StakeTypeId, StakeType>,
    /// Stake records by id
    stakes: BTreeMap<StakeId, Stake>,
    /// Owner index
    stakes_by_owner: HashMap<AccountId, Vec<StakeId>>,
    /// Daily rates for the daily and compounded models
    daily_rates: DailyRateTable,
    /// Next stake id to assign (ids start at 1, never reused)
    next_stake_id: StakeId,
    /// Next stake-type id to assign
    next_type_id: StakeTypeId,
}

impl<L: ValueLedger> StakeLedger<L> {
    /// Create an empty engine over `funds`, with `operator` holding the
    /// operator role
    pub fn new(account: AccountId, operator: AccountId, model: RateModel, funds: L) -> Self {
        Self {
            account,
            funds,
            access: AccessRegistry::new(operator),
            model,
            stake_types: BTreeMap::new(),
            stakes: BTreeMap::new(),
            stakes_by_owner: HashMap::new(),
            daily_rates: DailyRateTable::new(),
            next_stake_id: 1,
            next_type_id: 1,
        }
    }

    /// The engine's fund account
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// The underlying value ledger
    pub fn funds(&self) -> &L {
        &self.funds
    }

    /// Mutable access to the value ledger (top-ups, approvals)
    pub fn funds_mut(&mut self) -> &mut L {
        &mut self.funds
    }

    /// Current liquid balance of the fund account
    pub fn liquidity(&self) -> Amount {
        self.funds.balance_of(&self.account)
    }

    // ---- operator configuration ----------------------------------------

    /// Register a new stake type; ids are sequential starting at 1
    #[allow(clippy::too_many_arguments)]
    pub fn add_stake_type(
        &mut self,
        caller: &AccountId,
        term: u64,
        percentage_return: u64,
        penalty_amount: Amount,
        penalty_percentage: u64,
        min_amount: Amount,
        max_amount: Amount,
    ) -> StakeResult<StakeTypeId> {
        self.access.require(caller, Role::Operator)?;

        let id = self.next_type_id;
        self.next_type_id += 1;
        self.stake_types.insert(
            id,
            StakeType {
                id,
                term,
                percentage_return,
                penalty_amount,
                penalty_percentage,
                min_amount,
                max_amount,
            },
        );

        tracing::info!(type_id = id, term, percentage_return, "stake type added");
        Ok(id)
    }

    /// Update an existing stake type.
    ///
    /// Applies to future computations only; already-settled stakes are
    /// never rewritten.
    #[allow(clippy::too_many_arguments)]
    pub fn update_stake_type(
        &mut self,
        caller: &AccountId,
        id: StakeTypeId,
        term: u64,
        percentage_return: u64,
        penalty_amount: Amount,
        penalty_percentage: u64,
        min_amount: Amount,
        max_amount: Amount,
    ) -> StakeResult<()> {
        self.access.require(caller, Role::Operator)?;

        let entry = self
            .stake_types
            .get_mut(&id)
            .ok_or(StakeError::InvalidStakeType(id))?;
        *entry = StakeType {
            id,
            term,
            percentage_return,
            penalty_amount,
            penalty_percentage,
            min_amount,
            max_amount,
        };

        tracing::info!(type_id = id, "stake type updated");
        Ok(())
    }

    /// Set the daily rate (basis points) for the day containing `ts`
    pub fn set_interest_daily(
        &mut self,
        caller: &AccountId,
        ts: Timestamp,
        rate: u64,
    ) -> StakeResult<()> {
        self.access.require(caller, Role::Operator)?;
        self.daily_rates.set_rate(ts, rate);

        let entry = self.daily_rates.rate_at(ts)?;
        tracing::info!(day = entry.day, rate, date = ?entry.date(), "daily rate set");
        Ok(())
    }

    /// Sweep the fund's liquid balance to the operator for investment
    pub fn claim_to_invest(&mut self, caller: &AccountId) -> StakeResult<Amount> {
        self.access.require(caller, Role::Operator)?;

        let balance = self.liquidity();
        if !balance.is_zero() {
            self.funds.transfer(&self.account, caller, &balance)?;
        }
        tracing::info!(amount = %balance, "liquid balance claimed for investment");
        Ok(balance)
    }

    // ---- read-only queries ---------------------------------------------

    pub fn get_stake_type(&self, id: StakeTypeId) -> StakeResult<&StakeType> {
        self.stake_types
            .get(&id)
            .ok_or(StakeError::InvalidStakeType(id))
    }

    pub fn get_interest_daily(&self, ts: Timestamp) -> StakeResult<DailyRate> {
        Ok(self.daily_rates.rate_at(ts)?)
    }

    pub fn get_stake(&self, stake_id: StakeId) -> StakeResult<&Stake> {
        self.stakes
            .get(&stake_id)
            .ok_or(StakeError::StakeNotFound(stake_id))
    }

    /// The most recently assigned stake id (zero before the first stake)
    pub fn get_current_stake_id(&self) -> StakeId {
        self.next_stake_id - 1
    }

    /// Ids of all stakes ever opened by `owner`, in creation order
    pub fn get_my_stakes(&self, owner: &AccountId) -> Vec<StakeId> {
        self.stakes_by_owner.get(owner).cloned().unwrap_or_default()
    }

    /// Amount a withdrawal would entitle right now.
    ///
    /// For an active stake this is the full entitlement computed through
    /// the same path an actual withdrawal uses, so the two agree exactly;
    /// for a closed, unsettled stake it is the recorded settlement amount.
    pub fn get_withdrawable_amount(&self, stake_id: StakeId, now: Timestamp) -> StakeResult<Amount> {
        let stake = self.get_stake(stake_id)?;
        if stake.active {
            self.entitlement(stake, &stake.principal, now)
        } else if stake.has_unpaid_settlement() {
            Ok(stake.settlement_amount.clone())
        } else {
            Ok(Amount::zero())
        }
    }

    // ---- stake lifecycle -----------------------------------------------

    /// Open a new stake of `amount` against `stake_type_id`.
    ///
    /// The principal moves from the caller into the fund account; if that
    /// transfer fails no stake record is created.
    pub fn add_stake(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        stake_type_id: StakeTypeId,
        now: Timestamp,
    ) -> StakeResult<StakeId> {
        let stake_type = self
            .stake_types
            .get(&stake_type_id)
            .ok_or(StakeError::InvalidStakeType(stake_type_id))?
            .clone();

        if !stake_type.accepts(&amount) {
            return Err(StakeError::AmountOutOfRange {
                amount,
                min: stake_type.min_amount,
                max: stake_type.max_amount,
            });
        }

        let fund_account = self.account.clone();
        self.funds
            .transfer_from(&fund_account, caller, &fund_account, &amount)?;

        let id = self.allocate_stake(caller.clone(), amount, &stake_type, now);
        tracing::info!(stake_id = id, owner = %caller, type_id = stake_type_id, "stake opened");
        Ok(id)
    }

    /// Withdraw an active stake, fully or partially.
    ///
    /// A liquidity shortfall never fails the call: the stake is paid what
    /// the fund covers and the rest is recorded as a settlement amount. A
    /// partial withdrawal re-stakes the unrequested principal remainder as
    /// a linked continuation stake accruing from `now`.
    ///
    /// Returns the amount actually paid out.
    pub fn withdraw(
        &mut self,
        caller: &AccountId,
        stake_id: StakeId,
        full: bool,
        amount: Amount,
        now: Timestamp,
    ) -> StakeResult<Amount> {
        let stake = self.get_stake(stake_id)?;
        self.require_owner(stake, caller)?;
        if !stake.active {
            return Err(StakeError::StakeNotActive(stake_id));
        }

        let portion = if full {
            stake.principal.clone()
        } else {
            // A zero partial would close the stake for nothing and restart
            // the maturity clock on the full principal
            if amount.is_zero() || amount > stake.principal {
                return Err(StakeError::AmountOutOfRange {
                    amount,
                    min: Amount::from_u64(1),
                    max: stake.principal.clone(),
                });
            }
            amount
        };
        let remainder = stake.principal.saturating_sub(&portion);
        let closes_fully = remainder.is_zero();

        let snapshot = stake.clone();
        let entitled = self.entitlement(&snapshot, &portion, now)?;
        let payable = entitled.clone().min(self.liquidity());
        let shortfall = entitled.saturating_sub(&payable);
        let matured = snapshot.is_mature(now);

        // Finalize the record before the external transfer
        let continuation_id = if closes_fully {
            None
        } else {
            Some(self.next_stake_id)
        };
        {
            let stake = self.stakes.get_mut(&stake_id).expect("validated above");
            stake.active = false;
            stake.matured = matured;
            stake.stake_returns = entitled.saturating_sub(&portion);
            if shortfall.is_zero() {
                stake.settled = closes_fully;
                stake.partial_withdrawn = !closes_fully;
            } else {
                stake.settled = false;
                stake.partial_withdrawn = true;
                stake.settlement_amount = shortfall.clone();
            }
            stake.linked_stake_id = continuation_id;
        }

        if let Some(new_id) = continuation_id {
            let stake_type = self
                .stake_types
                .get(&snapshot.stake_type_id)
                .ok_or(StakeError::InvalidStakeType(snapshot.stake_type_id))?
                .clone();
            let allocated = self.allocate_stake(snapshot.owner.clone(), remainder, &stake_type, now);
            debug_assert_eq!(allocated, new_id);
        }

        if let Err(e) = self.pay_out(caller, &payable) {
            self.rollback(stake_id, snapshot, continuation_id);
            return Err(e);
        }

        if shortfall.is_zero() {
            tracing::info!(stake_id, paid = %payable, "stake withdrawn");
        } else {
            tracing::warn!(
                stake_id,
                paid = %payable,
                owed = %shortfall,
                "withdrawal underfunded, remainder deferred to settlement"
            );
        }
        Ok(payable)
    }

    /// Cancel an active stake before maturity, paying principal minus the
    /// configured penalties.
    ///
    /// The same shortfall degradation as `withdraw` applies.
    pub fn cancel_stake(
        &mut self,
        caller: &AccountId,
        stake_id: StakeId,
        now: Timestamp,
    ) -> StakeResult<Amount> {
        let stake = self.get_stake(stake_id)?;
        self.require_owner(stake, caller)?;
        if !stake.active {
            return Err(StakeError::StakeNotActive(stake_id));
        }
        if stake.is_mature(now) {
            return Err(StakeError::StakeAlreadyMatured(stake_id));
        }

        let snapshot = stake.clone();
        let stake_type = self.get_stake_type(snapshot.stake_type_id)?;
        let entitled = early_exit_amount(
            &snapshot.principal,
            &stake_type.penalty_amount,
            stake_type.penalty_percentage,
        );
        let payable = entitled.clone().min(self.liquidity());
        let shortfall = entitled.saturating_sub(&payable);

        {
            let stake = self.stakes.get_mut(&stake_id).expect("validated above");
            stake.active = false;
            stake.cancelled = true;
            stake.matured = false;
            if shortfall.is_zero() {
                stake.settled = true;
            } else {
                stake.settled = false;
                stake.settlement_amount = shortfall.clone();
            }
        }

        if let Err(e) = self.pay_out(caller, &payable) {
            self.rollback(stake_id, snapshot, None);
            return Err(e);
        }

        tracing::info!(stake_id, paid = %payable, owed = %shortfall, "stake cancelled");
        Ok(payable)
    }

    /// Claim a matured stake, or the deferred remainder of a cancelled or
    /// matured stake that could not be fully paid earlier.
    ///
    /// Returns the amount actually paid out.
    pub fn claim_my_stake(
        &mut self,
        caller: &AccountId,
        stake_id: StakeId,
        now: Timestamp,
    ) -> StakeResult<Amount> {
        let stake = self.get_stake(stake_id)?;
        self.require_owner(stake, caller)?;

        if stake.active {
            if !stake.is_mature(now) {
                return Err(StakeError::StakeNotMatured(stake_id));
            }
            // Natural maturity claim: same path as a full withdrawal
            return self.withdraw(caller, stake_id, true, Amount::zero(), now);
        }

        if stake.settled {
            return Err(StakeError::AlreadySettled(stake_id));
        }
        if !stake.has_unpaid_settlement() {
            return Err(StakeError::StakeNotActive(stake_id));
        }

        // Deferred remainder: pay what liquidity covers, never more
        let snapshot = stake.clone();
        let owed = snapshot.settlement_amount.clone();
        let payable = owed.clone().min(self.liquidity());
        let remaining = owed.saturating_sub(&payable);

        {
            let stake = self.stakes.get_mut(&stake_id).expect("validated above");
            stake.settlement_amount = remaining.clone();
            stake.settled = remaining.is_zero();
        }

        if let Err(e) = self.pay_out(caller, &payable) {
            self.rollback(stake_id, snapshot, None);
            return Err(e);
        }

        tracing::info!(stake_id, paid = %payable, owed = %remaining, "deferred stake claimed");
        Ok(payable)
    }

    // ---- internals ------------------------------------------------------

    /// Full entitlement for `portion` of a stake's principal at `now`,
    /// per the engine's rate model
    pub(crate) fn entitlement(
        &self,
        stake: &Stake,
        portion: &Amount,
        now: Timestamp,
    ) -> StakeResult<Amount> {
        match self.model {
            RateModel::FixedTerm => {
                let ty = self.get_stake_type(stake.stake_type_id)?;
                if stake.is_mature(now) {
                    Ok(portion.clone() + fixed_term_return(portion, ty.percentage_return))
                } else {
                    Ok(early_exit_amount(
                        portion,
                        &ty.penalty_amount,
                        ty.penalty_percentage,
                    ))
                }
            }
            RateModel::DailyRate => {
                let earned = self
                    .daily_rates
                    .simple_return(portion, stake.created_at, now)?;
                Ok(portion.clone() + earned)
            }
            RateModel::CompoundedDaily => Ok(self
                .daily_rates
                .compound_balance(portion, stake.created_at, now)?),
        }
    }

    pub(crate) fn access(&self) -> &AccessRegistry {
        &self.access
    }

    pub(crate) fn stake_mut(&mut self, stake_id: StakeId) -> Option<&mut Stake> {
        self.stakes.get_mut(&stake_id)
    }

    fn require_owner(&self, stake: &Stake, caller: &AccountId) -> StakeResult<()> {
        if &stake.owner != caller {
            return Err(StakeError::NotStakeOwner {
                stake_id: stake.id,
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Insert a new stake record and index it by owner
    fn allocate_stake(
        &mut self,
        owner: AccountId,
        principal: Amount,
        stake_type: &StakeType,
        now: Timestamp,
    ) -> StakeId {
        let id = self.next_stake_id;
        self.next_stake_id += 1;

        let stake = Stake::open(id, owner.clone(), principal, stake_type, now);
        self.stakes.insert(id, stake);
        self.stakes_by_owner.entry(owner).or_default().push(id);
        id
    }

    /// Transfer `amount` from the fund account to `to`
    pub(crate) fn pay_out(&mut self, to: &AccountId, amount: &Amount) -> StakeResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let fund_account = self.account.clone();
        self.funds.transfer(&fund_account, to, amount)?;
        Ok(())
    }

    /// Restore a stake to its pre-operation snapshot and drop a
    /// continuation record allocated within the failed operation
    pub(crate) fn rollback(
        &mut self,
        stake_id: StakeId,
        snapshot: Stake,
        continuation_id: Option<StakeId>,
    ) {
        let owner = snapshot.owner.clone();
        self.stakes.insert(stake_id, snapshot);
        if let Some(cid) = continuation_id {
            self.stakes.remove(&cid);
            if let Some(ids) = self.stakes_by_owner.get_mut(&owner) {
                ids.retain(|id| *id != cid);
            }
            self.next_stake_id = cid;
        }
    }
}

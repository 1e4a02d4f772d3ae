// pool-manager/src/manager.rs

use crate::{
    pool::{PoolConfig, PoolInstance, PoolInstanceId, PoolStake, PoolStakeId, PoolStatus, PoolTypeId},
    PoolError, PoolResult,
};
use ledger_types::{hours, AccessRegistry, AccountId, Amount, Role, Timestamp, SECONDS_PER_HOUR};
use rate_model::pool_share;
use std::collections::{BTreeMap, HashMap};
use value_ledger::ValueLedger;

/// Deposit window length used when the operator passes zero hours
pub const DEFAULT_ACCEPTING_HOURS: u64 = 24;

/// Staking periods of the default pool catalogue, in days
const DEFAULT_POOL_TERMS: [u64; 4] = [30, 90, 180, 360];

/// Engine for windowed, multi-participant pools.
///
/// Same external shape as the fixed-term engine: every operation takes
/// the caller and one `now` snapshot, funds move only through the value
/// ledger, and records are finalized before the external transfer with a
/// rollback on failure.
pub struct PoolManager<L: ValueLedger> {
    /// The engine's own fund account on the value ledger
    account: AccountId,
    /// External fungible-value ledger
    funds: L,
    /// Role grants for privileged operations
    access: AccessRegistry,
    /// Pool type catalogue
    configs: BTreeMap<PoolTypeId, PoolConfig>,
    /// All instances ever opened, by id
    instances: BTreeMap<PoolInstanceId, PoolInstance>,
    /// Current (latest) instance per pool type
    current: HashMap<PoolTypeId, PoolInstanceId>,
    /// Participant contributions by id
    stakes: BTreeMap<PoolStakeId, PoolStake>,
    /// Owner index
    stakes_by_owner: HashMap<AccountId, Vec<PoolStakeId>>,
    /// Next instance id to assign
    next_instance_id: PoolInstanceId,
    /// Next stake id to assign
    next_stake_id: PoolStakeId,
}

impl<L: ValueLedger> PoolManager<L> {
    /// Create a manager with the default 30/90/180/360-day catalogue
    pub fn new(account: AccountId, operator: AccountId, funds: L) -> Self {
        let configs = DEFAULT_POOL_TERMS
            .iter()
            .enumerate()
            .map(|(i, &term_days)| {
                let id = i as PoolTypeId;
                (id, PoolConfig { id, term_days })
            })
            .collect();

        Self {
            account,
            funds,
            access: AccessRegistry::new(operator),
            configs,
            instances: BTreeMap::new(),
            current: HashMap::new(),
            stakes: BTreeMap::new(),
            stakes_by_owner: HashMap::new(),
            next_instance_id: 1,
            next_stake_id: 1,
        }
    }

    pub fn account(&self) -> &AccountId {
        &self.account
    }

    pub fn funds(&self) -> &L {
        &self.funds
    }

    pub fn funds_mut(&mut self) -> &mut L {
        &mut self.funds
    }

    /// Current liquid balance of the fund account
    pub fn liquidity(&self) -> Amount {
        self.funds.balance_of(&self.account)
    }

    // ---- operator operations -------------------------------------------

    /// Open a new deposit window for `pool_type`.
    ///
    /// Zero `accepting_window_hours` selects the 24-hour default. Fails
    /// while the previous instance of the type is still accepting
    /// deposits or running its staking period.
    pub fn start_staking(
        &mut self,
        caller: &AccountId,
        pool_type: PoolTypeId,
        accepting_window_hours: u64,
        now: Timestamp,
    ) -> PoolResult<PoolInstanceId> {
        self.access.require(caller, Role::Operator)?;
        let config = *self
            .configs
            .get(&pool_type)
            .ok_or(PoolError::PoolNotFound(pool_type))?;

        if let Some(previous) = self.current_instance(pool_type) {
            if now < previous.end_of_staking() {
                return Err(PoolError::PoolAlreadyOpen(pool_type));
            }
        }

        let window = if accepting_window_hours == 0 {
            DEFAULT_ACCEPTING_HOURS
        } else {
            accepting_window_hours
        };

        let id = self.next_instance_id;
        self.next_instance_id += 1;
        self.instances.insert(
            id,
            PoolInstance {
                id,
                pool_type,
                start_of_deposit: now,
                end_of_deposit: now + hours(window),
                term_days: config.term_days,
                total_staked: Amount::zero(),
                pool_reward: Amount::zero(),
            },
        );
        self.current.insert(pool_type, id);

        tracing::info!(
            instance_id = id,
            pool_type,
            window_hours = window,
            term_days = config.term_days,
            "deposit window opened"
        );
        Ok(id)
    }

    /// Add to an instance's reward pool, pulling the funds from the
    /// caller. Callable repeatedly until the rewards are distributed.
    pub fn add_rewards(
        &mut self,
        caller: &AccountId,
        instance_id: PoolInstanceId,
        amount: Amount,
    ) -> PoolResult<()> {
        self.access.require(caller, Role::Operator)?;
        if !self.instances.contains_key(&instance_id) {
            return Err(PoolError::InstanceNotFound(instance_id));
        }

        let fund_account = self.account.clone();
        self.funds
            .transfer_from(&fund_account, caller, &fund_account, &amount)?;

        let instance = self.instances.get_mut(&instance_id).expect("validated above");
        instance.pool_reward = instance.pool_reward.clone() + amount.clone();

        tracing::info!(instance_id, amount = %amount, "rewards added");
        Ok(())
    }

    // ---- participant operations ----------------------------------------

    /// Contribute `amount` to the open instance of `pool_type`.
    ///
    /// Valid only while the deposit window is open; the contribution is
    /// recorded per user, per instance.
    pub fn stake(
        &mut self,
        caller: &AccountId,
        pool_type: PoolTypeId,
        amount: Amount,
        now: Timestamp,
    ) -> PoolResult<PoolStakeId> {
        if !self.configs.contains_key(&pool_type) {
            return Err(PoolError::PoolNotFound(pool_type));
        }
        let instance = self
            .current_instance(pool_type)
            .filter(|i| i.accepting_deposits(now))
            .ok_or(PoolError::DepositWindowClosed(pool_type))?;
        let instance_id = instance.id;

        let fund_account = self.account.clone();
        self.funds
            .transfer_from(&fund_account, caller, &fund_account, &amount)?;

        let instance = self.instances.get_mut(&instance_id).expect("validated above");
        instance.total_staked = instance.total_staked.clone() + amount.clone();

        let id = self.next_stake_id;
        self.next_stake_id += 1;
        self.stakes.insert(
            id,
            PoolStake {
                id,
                owner: caller.clone(),
                instance_id,
                amount,
                staked_at: now,
                withdrawn: false,
            },
        );
        self.stakes_by_owner
            .entry(caller.clone())
            .or_default()
            .push(id);

        tracing::info!(stake_id = id, instance_id, owner = %caller, "pool contribution recorded");
        Ok(id)
    }

    /// Withdraw one contribution after its instance's staking period.
    ///
    /// Pays principal plus the proportional share of the instance's
    /// reward snapshot; irreversible per stake.
    ///
    /// Returns the amount paid out.
    pub fn withdraw_stake(
        &mut self,
        caller: &AccountId,
        stake_id: PoolStakeId,
        now: Timestamp,
    ) -> PoolResult<Amount> {
        let stake = self
            .stakes
            .get(&stake_id)
            .ok_or(PoolError::StakeNotFound(stake_id))?;
        if &stake.owner != caller {
            return Err(PoolError::NotStakeOwner {
                stake_id,
                caller: caller.clone(),
            });
        }
        if stake.withdrawn {
            return Err(PoolError::AlreadySettled(stake_id));
        }

        let instance = self
            .instances
            .get(&stake.instance_id)
            .ok_or(PoolError::InstanceNotFound(stake.instance_id))?;
        if !instance.is_mature(now) {
            return Err(PoolError::StakeNotMatured(stake_id));
        }

        let reward = pool_share(&instance.pool_reward, &stake.amount, &instance.total_staked);
        let payout = stake.amount.clone() + reward.clone();

        // Finalize the record before the external transfer
        let snapshot = stake.clone();
        self.stakes.get_mut(&stake_id).expect("validated above").withdrawn = true;

        let fund_account = self.account.clone();
        if let Err(e) = self.funds.transfer(&fund_account, caller, &payout) {
            self.stakes.insert(stake_id, snapshot);
            return Err(e.into());
        }

        tracing::info!(stake_id, paid = %payout, reward = %reward, "pool stake withdrawn");
        Ok(payout)
    }

    /// Withdraw all of the caller's contributions to one instance.
    ///
    /// Returns the total paid out.
    pub fn withdraw_pool_instance(
        &mut self,
        caller: &AccountId,
        instance_id: PoolInstanceId,
        now: Timestamp,
    ) -> PoolResult<Amount> {
        if !self.instances.contains_key(&instance_id) {
            return Err(PoolError::InstanceNotFound(instance_id));
        }

        let ids: Vec<PoolStakeId> = self
            .get_my_stakes(caller)
            .into_iter()
            .filter(|id| {
                self.stakes
                    .get(id)
                    .map(|s| s.instance_id == instance_id && !s.withdrawn)
                    .unwrap_or(false)
            })
            .collect();

        let mut total = Amount::zero();
        for id in ids {
            total = total + self.withdraw_stake(caller, id, now)?;
        }
        Ok(total)
    }

    /// Withdraw every contribution of the caller whose staking period has
    /// elapsed, skipping the ones still locked.
    ///
    /// Returns the total paid out.
    pub fn withdraw_all(&mut self, caller: &AccountId, now: Timestamp) -> PoolResult<Amount> {
        let ids: Vec<PoolStakeId> = self
            .get_my_stakes(caller)
            .into_iter()
            .filter(|id| {
                self.stakes
                    .get(id)
                    .filter(|s| !s.withdrawn)
                    .and_then(|s| self.instances.get(&s.instance_id))
                    .map(|i| i.is_mature(now))
                    .unwrap_or(false)
            })
            .collect();

        let mut total = Amount::zero();
        for id in ids {
            total = total + self.withdraw_stake(caller, id, now)?;
        }
        Ok(total)
    }

    // ---- read-only queries ---------------------------------------------

    pub fn get_pool_config(&self, pool_type: PoolTypeId) -> PoolResult<&PoolConfig> {
        self.configs
            .get(&pool_type)
            .ok_or(PoolError::PoolNotFound(pool_type))
    }

    /// Instance record plus its lifecycle phase at `now`
    pub fn get_pool_info(
        &self,
        instance_id: PoolInstanceId,
        now: Timestamp,
    ) -> PoolResult<(&PoolInstance, PoolStatus)> {
        let instance = self
            .instances
            .get(&instance_id)
            .ok_or(PoolError::InstanceNotFound(instance_id))?;
        Ok((instance, instance.status(now)))
    }

    pub fn get_stake(&self, stake_id: PoolStakeId) -> PoolResult<&PoolStake> {
        self.stakes
            .get(&stake_id)
            .ok_or(PoolError::StakeNotFound(stake_id))
    }

    /// Ids of all pool stakes ever made by `owner`, in creation order
    pub fn get_my_stakes(&self, owner: &AccountId) -> Vec<PoolStakeId> {
        self.stakes_by_owner.get(owner).cloned().unwrap_or_default()
    }

    /// Reward a contribution would earn from its instance's current
    /// reward snapshot
    pub fn get_rewards(&self, stake_id: PoolStakeId) -> PoolResult<Amount> {
        let stake = self.get_stake(stake_id)?;
        let instance = self
            .instances
            .get(&stake.instance_id)
            .ok_or(PoolError::InstanceNotFound(stake.instance_id))?;
        Ok(pool_share(
            &instance.pool_reward,
            &stake.amount,
            &instance.total_staked,
        ))
    }

    /// Hours left in the accepting window of `pool_type` (zero when the
    /// window is closed or no instance is open)
    pub fn get_time_accepting(&self, pool_type: PoolTypeId, now: Timestamp) -> u64 {
        self.current_instance(pool_type)
            .filter(|i| i.accepting_deposits(now))
            .map(|i| (i.end_of_deposit - now) / SECONDS_PER_HOUR)
            .unwrap_or(0)
    }

    fn current_instance(&self, pool_type: PoolTypeId) -> Option<&PoolInstance> {
        self.current
            .get(&pool_type)
            .and_then(|id| self.instances.get(id))
    }
}

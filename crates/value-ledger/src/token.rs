// value-ledger/src/token.rs

use crate::{ValueLedger, ValueLedgerError, ValueLedgerResult};
use ledger_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory fungible token ledger.
///
/// The full supply is minted to a treasury account at construction; funds
/// only move through `transfer`/`transfer_from` after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    /// Account balances
    balances: HashMap<AccountId, Amount>,
    /// Spending allowances ((owner, spender) -> remaining amount)
    allowances: HashMap<(AccountId, AccountId), Amount>,
    /// Fixed total supply
    total_supply: Amount,
}

impl TokenLedger {
    /// Create a ledger with `total_supply` minted to `treasury`
    pub fn new(treasury: AccountId, total_supply: Amount) -> Self {
        let mut balances = HashMap::new();
        balances.insert(treasury, total_supply.clone());
        Self {
            balances,
            allowances: HashMap::new(),
            total_supply,
        }
    }

    pub fn total_supply(&self) -> &Amount {
        &self.total_supply
    }

    /// Authorize `spender` to move up to `amount` of `owner`'s funds.
    ///
    /// Replaces any previous allowance outright.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: Amount) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    fn debit(&mut self, account: &AccountId, amount: &Amount) -> ValueLedgerResult<()> {
        let balance = self.balance_of(account);
        let remaining =
            balance
                .checked_sub(amount)
                .ok_or_else(|| ValueLedgerError::InsufficientFunds {
                    account: account.clone(),
                    required: amount.clone(),
                    available: balance.clone(),
                })?;
        self.balances.insert(account.clone(), remaining);
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: &Amount) {
        let balance = self.balance_of(account);
        // Supply is fixed, so the sum of balances never exceeds it
        let updated = balance.checked_add(amount).unwrap_or(balance);
        self.balances.insert(account.clone(), updated);
    }
}

impl ValueLedger for TokenLedger {
    fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances
            .get(account)
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .cloned()
            .unwrap_or_else(Amount::zero)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: &Amount,
    ) -> ValueLedgerResult<()> {
        self.debit(from, amount)?;
        self.credit(to, amount);
        tracing::debug!(%from, %to, amount = %amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: &Amount,
    ) -> ValueLedgerResult<()> {
        let allowed = self.allowance(owner, spender);
        let remaining =
            allowed
                .checked_sub(amount)
                .ok_or_else(|| ValueLedgerError::InsufficientAllowance {
                    owner: owner.clone(),
                    spender: spender.clone(),
                    required: amount.clone(),
                    available: allowed.clone(),
                })?;

        // Balance check before any mutation so a failure leaves both the
        // allowance and the balances untouched
        self.debit(owner, amount)?;
        self.allowances
            .insert((owner.clone(), spender.clone()), remaining);
        self.credit(to, amount);
        tracing::debug!(%spender, %owner, %to, amount = %amount, "transfer_from");
        Ok(())
    }
}

// value-ledger/src/lib.rs

//! Fungible-value ledger interface consumed by the staking engines
//!
//! The engines never compute balances themselves; they move funds through
//! this interface and treat any failure as a hard stop for the operation in
//! progress. `TokenLedger` is the bundled in-memory implementation with
//! ERC-20-style balance and allowance semantics.

pub mod token;

pub use token::TokenLedger;

use ledger_types::{AccountId, Amount};

/// Result type for value-ledger operations
pub type ValueLedgerResult<T> = Result<T, ValueLedgerError>;

/// Errors that can occur when moving funds
#[derive(Debug, thiserror::Error)]
pub enum ValueLedgerError {
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("insufficient allowance: {spender} may spend {available} of {owner}'s funds, required {required}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        required: Amount,
        available: Amount,
    },
}

/// Balance/allowance view and fund movement, as the staking engines see it.
///
/// A failed transfer must leave balances untouched; callers rely on that to
/// roll an operation back as a unit.
pub trait ValueLedger {
    /// Liquid balance of an account
    fn balance_of(&self, account: &AccountId) -> Amount;

    /// Remaining amount `spender` may move out of `owner`'s balance
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Move `amount` from `from` to `to`
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: &Amount,
    ) -> ValueLedgerResult<()>;

    /// Move `amount` from `owner` to `to`, drawing down the allowance
    /// granted to `spender`
    fn transfer_from(
        &mut self,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: &Amount,
    ) -> ValueLedgerResult<()>;
}

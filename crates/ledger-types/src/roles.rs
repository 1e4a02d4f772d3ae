// ledger-types/src/roles.rs

use crate::{AccessError, AccessResult, AccountId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Privilege levels for engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// May add/update stake types, set daily rates, settle stakes,
    /// open pool windows and add rewards
    Operator,
}

/// Role grants, checked as a pure predicate over (caller, required role).
///
/// Kept independent of the accounting logic; engines call `require` at the
/// top of each privileged operation and never re-check mid-flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRegistry {
    operators: HashSet<AccountId>,
}

impl AccessRegistry {
    /// Create a registry with a single initial operator
    pub fn new(operator: AccountId) -> Self {
        let mut operators = HashSet::new();
        operators.insert(operator);
        Self { operators }
    }

    /// Grant the operator role to an additional account
    pub fn grant_operator(&mut self, account: AccountId) {
        self.operators.insert(account);
    }

    /// Revoke the operator role
    pub fn revoke_operator(&mut self, account: &AccountId) {
        self.operators.remove(account);
    }

    pub fn is_operator(&self, account: &AccountId) -> bool {
        self.operators.contains(account)
    }

    /// Fail with `Unauthorized` unless `caller` holds `role`
    pub fn require(&self, caller: &AccountId, role: Role) -> AccessResult<()> {
        let held = match role {
            Role::Operator => self.is_operator(caller),
        };
        if held {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                caller: caller.clone(),
                role,
            })
        }
    }
}

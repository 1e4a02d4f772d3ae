// rate-model/src/entitlement.rs

use ledger_types::Amount;

/// Return earned by `principal` at maturity: `principal * percentage / 100`
pub fn fixed_term_return(principal: &Amount, percentage_return: u64) -> Amount {
    principal.percent(percentage_return)
}

/// Amount paid out when a stake exits before maturity.
///
/// Both penalty forms apply when configured (a flat amount and a
/// percentage of principal) and the result is floored at zero.
pub fn early_exit_amount(
    principal: &Amount,
    penalty_amount: &Amount,
    penalty_percentage: u64,
) -> Amount {
    principal
        .saturating_sub(penalty_amount)
        .saturating_sub(&principal.percent(penalty_percentage))
}

/// A participant's slice of a pool-wide reward:
/// `pool_reward * participant_principal / total_staked`, floored.
///
/// Zero when nothing is staked; floor division guarantees the payouts
/// across all participants never exceed the reward pool.
pub fn pool_share(
    pool_reward: &Amount,
    participant_principal: &Amount,
    total_staked: &Amount,
) -> Amount {
    pool_reward
        .mul_div(participant_principal, total_staked)
        .unwrap_or_else(Amount::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_term_return() {
        let principal = Amount::from_u64(1_000_000);
        assert_eq!(fixed_term_return(&principal, 5), Amount::from_u64(50_000));
        assert_eq!(fixed_term_return(&principal, 0), Amount::zero());
    }

    #[test]
    fn test_early_exit_flat_penalty() {
        let principal = Amount::from_u64(10_000);
        let paid = early_exit_amount(&principal, &Amount::from_u64(500), 0);
        assert_eq!(paid, Amount::from_u64(9_500));
    }

    #[test]
    fn test_early_exit_percentage_penalty() {
        let principal = Amount::from_u64(10_000);
        let paid = early_exit_amount(&principal, &Amount::zero(), 10);
        assert_eq!(paid, Amount::from_u64(9_000));
    }

    #[test]
    fn test_early_exit_both_penalties() {
        let principal = Amount::from_u64(10_000);
        let paid = early_exit_amount(&principal, &Amount::from_u64(500), 10);
        assert_eq!(paid, Amount::from_u64(8_500));
    }

    #[test]
    fn test_early_exit_floors_at_zero() {
        let principal = Amount::from_u64(100);
        let paid = early_exit_amount(&principal, &Amount::from_u64(1_000), 50);
        assert_eq!(paid, Amount::zero());
    }

    #[test]
    fn test_pool_share() {
        let reward = Amount::from_u64(10_000);
        let total = Amount::from_u64(20_000);

        let share = pool_share(&reward, &Amount::from_u64(5_000), &total);
        assert_eq!(share, Amount::from_u64(2_500));

        assert_eq!(
            pool_share(&reward, &Amount::from_u64(5_000), &Amount::zero()),
            Amount::zero()
        );
    }

    proptest! {
        /// Shares across any split of the total never exceed the reward,
        /// and the rounding loss stays below one unit per participant.
        #[test]
        fn prop_pool_shares_never_exceed_reward(
            reward in 0u64..1_000_000_000,
            splits in prop::collection::vec(1u64..1_000_000, 1..10),
        ) {
            let total: u64 = splits.iter().sum();
            let total_amt = Amount::from_u64(total);
            let reward_amt = Amount::from_u64(reward);

            let paid = splits.iter().fold(Amount::zero(), |acc, s| {
                let share = pool_share(&reward_amt, &Amount::from_u64(*s), &total_amt);
                acc.checked_add(&share).unwrap()
            });

            prop_assert!(paid <= reward_amt);
            let lost = reward_amt.saturating_sub(&paid);
            prop_assert!(lost < Amount::from_u64(splits.len() as u64));
        }
    }
}

// stake-ledger/tests/lifecycle.rs

//! End-to-end lifecycle scenarios: funded and underfunded withdrawals,
//! deferred settlement, daily-rate accrual and value conservation.

use ledger_types::{days, AccountId, Amount, SECONDS_PER_DAY};
use rate_model::RateModel;
use stake_ledger::{StakeError, StakeLedger};
use value_ledger::{TokenLedger, ValueLedger};

const SUPPLY: u64 = 1_000_000_000;

fn operator() -> AccountId {
    AccountId::new("operator")
}

fn fund() -> AccountId {
    AccountId::new("fund")
}

fn user(name: &str) -> AccountId {
    AccountId::new(name)
}

fn engine_with(model: RateModel, balances: &[(&str, u64)]) -> StakeLedger<TokenLedger> {
    let mut token = TokenLedger::new(operator(), Amount::from_u64(SUPPLY));
    for (name, amount) in balances {
        token
            .transfer(&operator(), &user(name), &Amount::from_u64(*amount))
            .unwrap();
        token.approve(&user(name), &fund(), Amount::from_u64(*amount));
    }
    StakeLedger::new(fund(), operator(), model, token)
}

fn top_up(engine: &mut StakeLedger<TokenLedger>, amount: u64) {
    engine
        .funds_mut()
        .transfer(&operator(), &fund(), &Amount::from_u64(amount))
        .unwrap();
}

/// Stake 1,000,000 at 5% fixed term; term elapses with the fund holding
/// the full entitlement: withdraw pays exactly 1,050,000 and settles.
#[test]
fn funded_fixed_term_withdrawal_settles() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("alice", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 30, 5, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    let id = engine
        .add_stake(&user("alice"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();
    top_up(&mut engine, 50_000);

    let paid = engine
        .withdraw(&user("alice"), id, true, Amount::zero(), days(30))
        .unwrap();

    assert_eq!(paid, Amount::from_u64(1_050_000));
    assert_eq!(
        engine.funds().balance_of(&user("alice")),
        Amount::from_u64(1_050_000)
    );
    let stake = engine.get_stake(id).unwrap();
    assert!(!stake.active && stake.settled);
    assert_eq!(stake.settlement_amount, Amount::zero());
}

/// Same stake, but the fund holds only 600,000: the withdrawal pays
/// 600,000 and records 450,000 owed; a later settlement batch after a
/// top-up pays the remainder and settles.
#[test]
fn underfunded_withdrawal_then_batch_settlement() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("alice", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 30, 5, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    let id = engine
        .add_stake(&user("alice"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();

    // Sweep and partially refund so exactly 600,000 is liquid
    engine.claim_to_invest(&operator()).unwrap();
    top_up(&mut engine, 600_000);

    let paid = engine
        .withdraw(&user("alice"), id, true, Amount::zero(), days(30))
        .unwrap();
    assert_eq!(paid, Amount::from_u64(600_000));

    let stake = engine.get_stake(id).unwrap();
    assert!(!stake.active && !stake.settled);
    assert_eq!(stake.settlement_amount, Amount::from_u64(450_000));

    // Not enough liquidity yet: the batch skips the stake untouched
    let settled = engine
        .settle_stakes(&operator(), &[id], days(31))
        .unwrap();
    assert!(settled.is_empty());
    assert!(!engine.get_stake(id).unwrap().settled);

    // After a top-up the same batch pays the remainder in full
    top_up(&mut engine, 450_000);
    let settled = engine
        .settle_stakes(&operator(), &[id], days(32))
        .unwrap();
    assert_eq!(settled, vec![id]);

    let stake = engine.get_stake(id).unwrap();
    assert!(stake.settled);
    assert_eq!(stake.settlement_amount, Amount::zero());
    assert_eq!(
        engine.funds().balance_of(&user("alice")),
        Amount::from_u64(1_050_000)
    );
}

/// Re-running a settlement batch over settled ids is a no-op, and one
/// unpayable id does not block the ids after it.
#[test]
fn settlement_batch_is_idempotent_and_tolerant() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("a", 1_000_000), ("b", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 30, 5, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    let id_a = engine
        .add_stake(&user("a"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();
    let id_b = engine
        .add_stake(&user("b"), Amount::from_u64(500_000), 1, 0)
        .unwrap();

    engine.claim_to_invest(&operator()).unwrap();
    engine
        .withdraw(&user("a"), id_a, true, Amount::zero(), days(30))
        .unwrap();
    engine
        .withdraw(&user("b"), id_b, true, Amount::zero(), days(30))
        .unwrap();

    // Only enough to cover the smaller debt; the unknown id and the
    // unpayable first id are both skipped, the second still settles
    top_up(&mut engine, 525_000);
    let settled = engine
        .settle_stakes(&operator(), &[9999, id_a, id_b], days(31))
        .unwrap();
    assert_eq!(settled, vec![id_b]);

    // Idempotent: nothing further happens for the settled id
    let again = engine
        .settle_stakes(&operator(), &[id_b], days(32))
        .unwrap();
    assert!(again.is_empty());
    let balance_b = engine.funds().balance_of(&user("b"));
    assert_eq!(balance_b, Amount::from_u64(500_000 + 525_000));
}

#[test]
fn settlement_requires_operator() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("a", 1_000_000)]);
    let denied = engine.settle_stakes(&user("a"), &[1], 0);
    assert!(matches!(denied, Err(StakeError::Unauthorized(_))));
}

/// A matured stake the owner never claimed can be closed by the batch,
/// but only when its whole entitlement is fundable.
#[test]
fn settlement_closes_unclaimed_matured_stake() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("a", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 30, 5, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    let id = engine
        .add_stake(&user("a"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();
    top_up(&mut engine, 50_000);

    // Before maturity the batch leaves the stake alone
    let early = engine.settle_stakes(&operator(), &[id], days(29)).unwrap();
    assert!(early.is_empty());
    assert!(engine.get_stake(id).unwrap().active);

    let settled = engine.settle_stakes(&operator(), &[id], days(30)).unwrap();
    assert_eq!(settled, vec![id]);

    let stake = engine.get_stake(id).unwrap();
    assert!(stake.matured && stake.settled && !stake.active);
    assert_eq!(
        engine.funds().balance_of(&user("a")),
        Amount::from_u64(1_050_000)
    );
}

/// An underfunded partial withdrawal still creates the continuation for
/// the unrequested remainder; only the unpaid part of the entitled
/// payout is deferred to settlement.
#[test]
fn underfunded_partial_withdrawal_defers_remainder() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("alice", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 30, 5, Amount::zero(), 10, Amount::zero(), Amount::zero())
        .unwrap();
    let id = engine
        .add_stake(&user("alice"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();

    // Sweep and partially refund so exactly 100,000 is liquid
    engine.claim_to_invest(&operator()).unwrap();
    top_up(&mut engine, 100_000);

    // 400,000 before maturity entitles 360,000 after the 10% penalty;
    // only 100,000 of it is fundable
    let paid = engine
        .withdraw(&user("alice"), id, false, Amount::from_u64(400_000), days(10))
        .unwrap();
    assert_eq!(paid, Amount::from_u64(100_000));

    let stake = engine.get_stake(id).unwrap();
    assert!(!stake.active && !stake.settled && stake.partial_withdrawn);
    assert_eq!(stake.settlement_amount, Amount::from_u64(260_000));

    // The 600,000 remainder is re-staked regardless of the shortfall
    let continuation_id = stake.linked_stake_id.expect("continuation created");
    let continuation = engine.get_stake(continuation_id).unwrap();
    assert!(continuation.active);
    assert_eq!(continuation.principal, Amount::from_u64(600_000));
    assert_eq!(continuation.created_at, days(10));

    // Underfunded batch leaves the debt untouched; a top-up clears it
    let skipped = engine.settle_stakes(&operator(), &[id], days(11)).unwrap();
    assert!(skipped.is_empty());

    top_up(&mut engine, 260_000);
    let settled = engine.settle_stakes(&operator(), &[id], days(12)).unwrap();
    assert_eq!(settled, vec![id]);

    assert!(engine.get_stake(id).unwrap().settled);
    assert!(engine.get_stake(continuation_id).unwrap().active);
    assert_eq!(
        engine.funds().balance_of(&user("alice")),
        Amount::from_u64(360_000)
    );
}

/// Value conservation across a chain of partial withdrawals: everything
/// the owner receives plus the remaining liquid fund balance equals the
/// principal plus top-ups.
#[test]
fn partial_withdrawal_chain_conserves_value() {
    let mut engine = engine_with(RateModel::FixedTerm, &[("alice", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 0, 0, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    let first = engine
        .add_stake(&user("alice"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();

    // Walk the continuation chain with three partial withdrawals
    let mut current = first;
    for (day, portion) in [(1, 300_000u64), (2, 200_000), (3, 100_000)] {
        engine
            .withdraw(
                &user("alice"),
                current,
                false,
                Amount::from_u64(portion),
                days(day),
            )
            .unwrap();
        let stake = engine.get_stake(current).unwrap();
        let next = stake.linked_stake_id.expect("continuation created");
        assert!(next > current);
        current = next;
    }

    // Close out the final continuation
    engine
        .withdraw(&user("alice"), current, true, Amount::zero(), days(4))
        .unwrap();

    assert_eq!(
        engine.funds().balance_of(&user("alice")),
        Amount::from_u64(1_000_000)
    );
    assert_eq!(engine.liquidity(), Amount::zero());
    assert_eq!(
        engine.get_stake(current).unwrap().principal,
        Amount::from_u64(400_000)
    );
}

/// Daily-rate accrual fails with MissingRateData on a gap, and the stake
/// stays active and retryable once the rate is supplied.
#[test]
fn daily_rate_gap_is_recoverable() {
    let mut engine = engine_with(RateModel::DailyRate, &[("alice", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 0, 0, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    engine.set_interest_daily(&operator(), 0, 50).unwrap();
    // Day two deliberately missing
    engine
        .set_interest_daily(&operator(), 2 * SECONDS_PER_DAY, 50)
        .unwrap();

    let id = engine
        .add_stake(&user("alice"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();

    let result = engine.withdraw(&user("alice"), id, true, Amount::zero(), days(3));
    assert!(matches!(result, Err(StakeError::MissingRateData(_))));
    assert!(engine.get_stake(id).unwrap().active);

    engine
        .set_interest_daily(&operator(), SECONDS_PER_DAY, 50)
        .unwrap();
    top_up(&mut engine, 15_000);
    let paid = engine
        .withdraw(&user("alice"), id, true, Amount::zero(), days(3))
        .unwrap();
    // 3 days at 50 bps simple: 3 * 5_000
    assert_eq!(paid, Amount::from_u64(1_015_000));
}

/// The compounded model pays exactly what the withdrawable-amount query
/// reported, bit for bit.
#[test]
fn compounded_withdrawal_matches_query() {
    let mut engine = engine_with(RateModel::CompoundedDaily, &[("alice", 1_000_000)]);
    engine
        .add_stake_type(&operator(), 0, 0, Amount::zero(), 0, Amount::zero(), Amount::zero())
        .unwrap();
    for day in 0..5 {
        engine
            .set_interest_daily(&operator(), days(day), 100)
            .unwrap();
    }

    let id = engine
        .add_stake(&user("alice"), Amount::from_u64(1_000_000), 1, 0)
        .unwrap();
    top_up(&mut engine, 100_000);

    let quoted = engine.get_withdrawable_amount(id, days(5)).unwrap();
    let paid = engine
        .withdraw(&user("alice"), id, true, Amount::zero(), days(5))
        .unwrap();

    assert_eq!(quoted, paid);
    // 1_000_000 * 1.01^5, floored at each step
    assert_eq!(paid, Amount::from_u64(1_051_010));
}

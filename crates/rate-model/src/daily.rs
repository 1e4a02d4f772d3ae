// rate-model/src/daily.rs

use crate::{RateError, RateResult};
use chrono::{DateTime, Utc};
use ledger_types::{day_key, Amount, Timestamp, BPS_SCALE, SECONDS_PER_DAY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configured day rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRate {
    /// Day-aligned timestamp the rate applies to
    pub day: Timestamp,
    /// Rate in basis points
    pub rate: u64,
}

impl DailyRate {
    /// Calendar date of the day key, for display and audit output
    pub fn date(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.day as i64, 0)
    }
}

/// Sparse, operator-populated table of per-day rates.
///
/// Keys are canonicalized with `day_key`. Days without an entry are not
/// interpolated; any accrual that touches one fails with
/// `MissingRateData` and the caller retries once the rate is supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyRateTable {
    rates: BTreeMap<Timestamp, u64>,
}

impl DailyRateTable {
    pub fn new() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    /// Set (or overwrite) the rate for the day containing `ts`
    pub fn set_rate(&mut self, ts: Timestamp, rate: u64) {
        self.rates.insert(day_key(ts), rate);
    }

    /// Rate for the day containing `ts`
    pub fn rate_at(&self, ts: Timestamp) -> RateResult<DailyRate> {
        let day = day_key(ts);
        self.rates
            .get(&day)
            .map(|&rate| DailyRate { day, rate })
            .ok_or(RateError::MissingRateData { day })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Simple interest on `principal` over the whole days in `[from, to)`.
    ///
    /// Each elapsed day contributes `principal * rate_d / 10_000`; the
    /// principal itself is not included in the result.
    pub fn simple_return(
        &self,
        principal: &Amount,
        from: Timestamp,
        to: Timestamp,
    ) -> RateResult<Amount> {
        let mut accrued = Amount::zero();
        for day in self.accrual_days(from, to) {
            let rate = self.rate_at(day)?;
            accrued = accrued
                .checked_add(&principal.bps(rate.rate))
                .unwrap_or(accrued);
        }
        Ok(accrued)
    }

    /// Balance after compounding `principal` day by day over `[from, to)`:
    /// `balance_{d+1} = balance_d * (10_000 + rate_d) / 10_000`.
    ///
    /// Withdrawable-amount queries and actual withdrawals both call this,
    /// so the two always agree exactly.
    pub fn compound_balance(
        &self,
        principal: &Amount,
        from: Timestamp,
        to: Timestamp,
    ) -> RateResult<Amount> {
        let mut balance = principal.clone();
        for day in self.accrual_days(from, to) {
            let rate = self.rate_at(day)?;
            balance = balance.bps(BPS_SCALE + rate.rate);
        }
        Ok(balance)
    }

    /// Day keys covered by `[from, to)`, one per whole elapsed day
    fn accrual_days(&self, from: Timestamp, to: Timestamp) -> impl Iterator<Item = Timestamp> {
        let start = day_key(from);
        let end = day_key(to.max(from));
        (0u64..)
            .map(move |i| start + i * SECONDS_PER_DAY)
            .take_while(move |d| *d < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ledger_types::hours;

    /// Day key for a calendar date, the way an operator would supply it
    fn day(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp() as Timestamp
    }

    #[test]
    fn test_set_and_get_rate() {
        let mut table = DailyRateTable::new();
        let dec1 = day(2021, 12, 1);

        // The key canonicalizes: setting mid-day lands on the day boundary
        table.set_rate(dec1 + hours(13), 5);

        let rate = table.rate_at(dec1 + hours(2)).unwrap();
        assert_eq!(rate.day, dec1);
        assert_eq!(rate.rate, 5);
    }

    #[test]
    fn test_rate_reports_calendar_date() {
        let mut table = DailyRateTable::new();
        let dec1 = day(2021, 12, 1);
        table.set_rate(dec1 + hours(9), 5);

        let rate = table.rate_at(dec1).unwrap();
        assert_eq!(
            rate.date(),
            Some(Utc.with_ymd_and_hms(2021, 12, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_overwrite_rate() {
        let mut table = DailyRateTable::new();
        let dec22 = day(2021, 12, 22);

        table.set_rate(dec22, 4);
        table.set_rate(dec22, 6);

        assert_eq!(table.rate_at(dec22).unwrap().rate, 6);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_missing_day_is_an_error() {
        let table = DailyRateTable::new();
        let result = table.rate_at(day(2021, 12, 5));
        assert!(matches!(result, Err(RateError::MissingRateData { .. })));
    }

    #[test]
    fn test_simple_return_sums_days() {
        let mut table = DailyRateTable::new();
        let start = day(2021, 12, 1);
        // 50 bps, 20 bps, 30 bps over three days
        table.set_rate(start, 50);
        table.set_rate(start + SECONDS_PER_DAY, 20);
        table.set_rate(start + 2 * SECONDS_PER_DAY, 30);

        let principal = Amount::from_u64(1_000_000);
        let accrued = table
            .simple_return(&principal, start, start + 3 * SECONDS_PER_DAY)
            .unwrap();

        // 5000 + 2000 + 3000
        assert_eq!(accrued, Amount::from_u64(10_000));
    }

    #[test]
    fn test_simple_return_gap_fails() {
        let mut table = DailyRateTable::new();
        let start = day(2021, 12, 1);
        table.set_rate(start, 50);
        // Day two missing
        table.set_rate(start + 2 * SECONDS_PER_DAY, 30);

        let principal = Amount::from_u64(1_000_000);
        let result = table.simple_return(&principal, start, start + 3 * SECONDS_PER_DAY);
        assert!(matches!(result, Err(RateError::MissingRateData { day }) if day == start + SECONDS_PER_DAY));
    }

    #[test]
    fn test_compound_balance() {
        let mut table = DailyRateTable::new();
        let start = day(2021, 12, 1);
        table.set_rate(start, 100); // 1%
        table.set_rate(start + SECONDS_PER_DAY, 100);

        let principal = Amount::from_u64(1_000_000);
        let balance = table
            .compound_balance(&principal, start, start + 2 * SECONDS_PER_DAY)
            .unwrap();

        // 1_000_000 * 1.01 * 1.01 = 1_020_100, exactly
        assert_eq!(balance, Amount::from_u64(1_020_100));
    }

    #[test]
    fn test_partial_day_accrues_nothing() {
        let mut table = DailyRateTable::new();
        let start = day(2021, 12, 1);
        table.set_rate(start, 100);

        let principal = Amount::from_u64(1_000_000);
        let balance = table
            .compound_balance(&principal, start, start + hours(23))
            .unwrap();
        assert_eq!(balance, principal);
    }
}

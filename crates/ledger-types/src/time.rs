// ledger-types/src/time.rs

/// Timestamp in Unix epoch seconds
pub type Timestamp = u64;

pub const SECONDS_PER_HOUR: u64 = 60 * 60;
pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

/// Canonicalize a timestamp to the start of its UTC day.
///
/// Daily rates are keyed by this value; two timestamps within the same day
/// map to the same key.
pub fn day_key(ts: Timestamp) -> Timestamp {
    ts - ts % SECONDS_PER_DAY
}

/// Duration of `n` days in seconds
pub fn days(n: u64) -> u64 {
    n * SECONDS_PER_DAY
}

/// Duration of `n` hours in seconds
pub fn hours(n: u64) -> u64 {
    n * SECONDS_PER_HOUR
}

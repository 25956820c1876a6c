//! Hourly cache keys.
//!
//! A request time is rounded to the nearest hour: minutes 0..=29 stay in the
//! current hour, minutes 30..=59 move to the next one. Seconds never affect
//! the result.

use chrono::{DateTime, Utc};

const HOUR: i64 = 3600;
const MINUTE: i64 = 60;

/// Canonical hourly key, in epoch seconds, for a request time.
pub fn bucket_hour(ts: DateTime<Utc>) -> i64 {
    bucket_epoch(ts.timestamp())
}

/// Same as [`bucket_hour`] for a raw epoch value.
pub fn bucket_epoch(epoch: i64) -> i64 {
    let into_hour = epoch.rem_euclid(HOUR);
    let hour_start = epoch - into_hour;

    if into_hour / MINUTE >= 30 {
        hour_start + HOUR
    } else {
        hour_start
    }
}

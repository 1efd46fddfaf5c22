//! Minute buckets since the configured epoch

use chrono::{DateTime, Utc};

/// Whole minutes from `epoch` to `now`, masked to `mask`
///
/// Instants before the epoch map to bucket 0.
#[inline]
pub fn minutes_since(epoch: DateTime<Utc>, now: DateTime<Utc>, mask: u32) -> u32 {
    let minutes = now.signed_duration_since(epoch).num_minutes().max(0) as u64;
    (minutes & mask as u64) as u32
}

//! Shared test utilities for Uid tests

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::StoreError;
use crate::store::BaseStore;
use crate::{LocalSettings, Settings, Uid, UidConfig};

/// Route generator logs to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 2025-01-01T00:00:00Z, the default epoch
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// Config with the given node bits and the default epoch
pub fn config(node_bits: u8) -> UidConfig {
    UidConfig::builder()
        .node_bits(node_bits)
        .unwrap()
        .epoch(epoch())
        .build()
}

/// Local settings in `dir` whose clock is frozen at `now`
pub fn frozen_settings(dir: &Path, node_id: u32, now: DateTime<Utc>) -> Arc<dyn Settings> {
    Arc::new(LocalSettings::in_dir(dir, node_id).with_clock(move || now))
}

/// Generator with a frozen clock and its base stored in `dir`
pub fn frozen_uid(dir: &Path, node_bits: u8, node_id: u32, now: DateTime<Utc>) -> Uid {
    Uid::with_settings(config(node_bits), frozen_settings(dir, node_id, now)).unwrap()
}

/// Store whose operations fail according to its flags
#[derive(Debug, Default)]
pub struct FailingStore {
    pub fail_load: bool,
    pub fail_save: bool,
}

fn io_failure() -> StoreError {
    StoreError::Io(std::io::Error::other("disk unavailable"))
}

impl BaseStore for FailingStore {
    fn load(&self) -> Result<u32, StoreError> {
        if self.fail_load {
            Err(io_failure())
        } else {
            Err(StoreError::NotFound)
        }
    }

    fn save(&self, _base: u32) -> Result<(), StoreError> {
        if self.fail_save {
            Err(io_failure())
        } else {
            Ok(())
        }
    }

    fn remove(&self) -> Result<(), StoreError> {
        Err(StoreError::NotFound)
    }
}

/// Assert that all IDs in the collection are unique
pub fn assert_unique_ids(ids: &[u64], expected_count: usize) {
    let set: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(
        set.len(),
        expected_count,
        "Expected {} unique IDs, but got {} (duplicates detected)",
        expected_count,
        set.len()
    );
}

/// Assert that IDs strictly increase in the order given
pub fn assert_strictly_increasing(ids: &[u64]) {
    for i in 1..ids.len() {
        assert!(
            ids[i] > ids[i - 1],
            "ID at position {} ({}) is not greater than previous ID ({})",
            i,
            ids[i],
            ids[i - 1]
        );
    }
}

/// Assert collection has expected unique count and is strictly increasing once sorted
pub fn assert_unique_and_monotonic(mut ids: Vec<u64>, expected_count: usize) {
    assert_unique_ids(&ids, expected_count);
    ids.sort_unstable();
    assert_strictly_increasing(&ids);
}

//! UidConfig builder for constructing configuration

use chrono::{DateTime, Utc};

use super::{UidConfig, UidConfigError};
use crate::layout::BitLayout;

/// Default configuration values
pub(super) const DEFAULT_EPOCH_MILLIS: i64 = 1_735_689_600_000; // January 1, 2025 UTC

pub(super) fn default_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(DEFAULT_EPOCH_MILLIS).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Builder for UidConfig
#[derive(Debug)]
pub struct UidConfigBuilder {
    pub(super) layout: BitLayout,
    pub(super) epoch: DateTime<Utc>,
}

impl UidConfigBuilder {
    /// Create a new UidConfigBuilder with default values
    pub fn new() -> Self {
        Self {
            layout: BitLayout::default(),
            epoch: default_epoch(),
        }
    }

    /// Set the number of bits for node ID (6-32)
    /// Sequence bits will be automatically set to (38 - node_bits)
    pub fn node_bits(mut self, bits: u8) -> Result<Self, UidConfigError> {
        self.layout = BitLayout::new(bits)?;
        Ok(self)
    }

    /// Use a fully custom split of the 63 payload bits
    pub fn layout(mut self, layout: BitLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the reference instant that base minutes are counted from
    pub const fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = epoch;
        self
    }

    /// Build the final UidConfig
    pub fn build(self) -> UidConfig {
        UidConfig::from_builder(self)
    }
}

impl Default for UidConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

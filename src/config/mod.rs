//! Configuration for the Uid generator

mod builder;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use builder::UidConfigBuilder;
use builder::default_epoch;

use crate::layout::BitLayout;

/// Errors related to bit layout and node id validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UidConfigError {
    /// Provided node bits are out of the supported range [6, 32]
    #[error("Node bits {bits} must be between 6 and 32")]
    InvalidNodeBits { bits: u8 },
    /// Field widths do not add up to the 63 payload bits
    #[error(
        "Bit widths base={base_bits} node={node_bits} sequence={sequence_bits} must sum to 63"
    )]
    InvalidLayout {
        base_bits: u8,
        node_bits: u8,
        sequence_bits: u8,
    },
    /// Node ID does not fit in the configured node bits
    #[error("Node ID {node_id} is invalid. Maximum allowed value is {max}")]
    InvalidNodeId { node_id: u32, max: u32 },
}

/// Configuration for the Uid generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidConfig {
    layout: BitLayout,
    epoch: DateTime<Utc>,
}

impl UidConfig {
    /// Create config from builder
    pub(crate) fn from_builder(b: UidConfigBuilder) -> Self {
        Self {
            layout: b.layout,
            epoch: b.epoch,
        }
    }

    /// Create a new configuration builder
    pub fn builder() -> UidConfigBuilder {
        UidConfigBuilder::new()
    }

    /// Reference instant; base counts whole minutes since this point
    #[inline(always)]
    pub const fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    #[inline(always)]
    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    #[inline(always)]
    pub const fn node_bits(&self) -> u8 {
        self.layout.node_bits()
    }

    #[inline(always)]
    pub const fn sequence_bits(&self) -> u8 {
        self.layout.sequence_bits()
    }

    #[inline(always)]
    pub const fn max_node_id(&self) -> u32 {
        self.layout.max_node_id()
    }

    #[inline(always)]
    pub const fn max_sequence(&self) -> u64 {
        self.layout.max_sequence()
    }

    pub(crate) fn validate_node_id(&self, node_id: u32) -> Result<(), UidConfigError> {
        let max = self.max_node_id();
        if node_id > max {
            return Err(UidConfigError::InvalidNodeId { node_id, max });
        }
        Ok(())
    }
}

impl Default for UidConfig {
    fn default() -> Self {
        Self {
            layout: BitLayout::default(),
            epoch: default_epoch(),
        }
    }
}

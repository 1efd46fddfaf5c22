//! # nodeuid
//!
//! Node-scoped unique 64-bit IDs without coordination on the hot path.
//!
//! ```text
//! 0 | base: minutes since epoch (25) | node id (6-32) | sequence (38 - node bits)
//! ```
//!
//! - Lock-free generation, unique across concurrent callers
//! - Monotonic per node, also across restarts (the last base is persisted)
//! - Node ids assigned by the operator or leased from etcd

#![forbid(unsafe_code)]

mod config;
mod coordinator;
mod error;
mod generator;
mod layout;
mod settings;
mod store;

#[cfg(test)]
pub mod tests;

pub use config::{UidConfig, UidConfigBuilder, UidConfigError};
#[cfg(feature = "etcd")]
pub use coordinator::EtcdCoordinator;
pub use coordinator::{
    Coordinator, KeepAliveHandle, KvError, Lease, MemoryCoordinator, SharedCoordinator,
};
pub use error::{IdentityError, StoreError, UidError};
pub use generator::{Uid, ROLLOVER_SEQUENCE};
pub use layout::{
    BitLayout, BASE_BITS, DEFAULT_NODE_BITS, MAX_NODE_BITS, MIN_NODE_BITS,
    TOTAL_NODE_AND_SEQUENCE_BITS,
};
pub use settings::{
    Clock, EtcdSettings, EtcdSettingsFactory, LocalSettings, LocalSettingsFactory, Settings,
    SettingsFactory, SystemClock, DEFAULT_LEASE_TTL, NODES_PREFIX, SETTINGS_PREFIX,
};
pub use store::{BaseStore, EtcdStore, FileStore, BASE_PREFIX};

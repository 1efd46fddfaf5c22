//! Node identity and base persistence, injected into the generator
//!
//! A [`Settings`] answers two separate questions: who is this node (node id
//! and its notion of "now"), and where does its base live ([`BaseStore`]).

mod etcd;
mod local;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use etcd::{
    EtcdSettings, EtcdSettingsFactory, DEFAULT_LEASE_TTL, NODES_PREFIX, SETTINGS_PREFIX,
};
pub use local::{LocalSettings, LocalSettingsFactory};

use crate::error::{StoreError, UidError};
use crate::layout::BitLayout;
use crate::store::BaseStore;

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System UTC clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Identity and persistence for one generator
pub trait Settings: Send + Sync {
    /// Node id embedded in every generated id
    fn node_id(&self) -> Result<u32, UidError>;

    /// Time used to derive the initial base
    fn current_time(&self) -> Result<DateTime<Utc>, UidError>;

    /// Where this node's base is persisted
    fn store(&self) -> &dyn BaseStore;

    fn load_base(&self) -> Result<u32, StoreError> {
        self.store().load()
    }

    fn save_base(&self, base: u32) -> Result<(), StoreError> {
        self.store().save(base)
    }

    fn remove_base(&self) -> Result<(), StoreError> {
        self.store().remove()
    }
}

/// Creates the [`Settings`] for a new generator
///
/// The layout is passed so allocating factories know the node id range.
pub trait SettingsFactory: Send + Sync {
    fn create(&self, layout: &BitLayout) -> Result<Arc<dyn Settings>, UidError>;
}

impl<F> SettingsFactory for F
where
    F: Fn(&BitLayout) -> Result<Arc<dyn Settings>, UidError> + Send + Sync,
{
    fn create(&self, layout: &BitLayout) -> Result<Arc<dyn Settings>, UidError> {
        self(layout)
    }
}

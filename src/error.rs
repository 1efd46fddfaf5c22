use thiserror::Error;

use crate::config::UidConfigError;
use crate::coordinator::KvError;

/// Represents errors that can occur while constructing a Uid generator
///
/// Generation itself never fails; every variant here is raised during
/// construction or by explicit administrative calls.
#[derive(Debug, Error)]
pub enum UidError {
    /// Node bits, bit widths or node id are out of range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] UidConfigError),
    /// Node id (or its lease) could not be obtained
    #[error("node identity unavailable: {0}")]
    IdentityUnavailable(#[from] IdentityError),
    /// A base value could not be loaded, saved or removed
    #[error("base persistence failed: {0}")]
    PersistenceUnavailable(#[from] StoreError),
}

/// Failures while resolving a node id
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The coordination backend rejected or timed out a request
    #[error("failed to {action}: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: KvError,
    },
    /// Every node id in range is registered
    #[error("all node ids in 0..={max} are registered")]
    Exhausted { max: u32 },
    /// Other instances kept claiming the chosen slot first
    #[error("node registration lost the race {attempts} times")]
    Contended { attempts: u32 },
}

impl IdentityError {
    pub(crate) fn backend(action: &'static str) -> impl FnOnce(KvError) -> Self {
        move |source| Self::Backend { action, source }
    }
}

/// Failures of a [`BaseStore`](crate::BaseStore)
#[derive(Debug, Error)]
pub enum StoreError {
    /// No base has been persisted (or it was already removed)
    #[error("no persisted base")]
    NotFound,
    /// The persisted value is not exactly 4 bytes
    #[error("persisted base has {len} bytes, expected 4")]
    Corrupt { len: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] KvError),
}

impl StoreError {
    /// Lets administrative callers treat "already absent" as success
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

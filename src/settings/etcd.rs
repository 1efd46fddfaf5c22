//! Node ids brokered by a coordination backend
//!
//! Registration scans `/uid/nodes/` for the lowest free slot, claims it with a
//! lease-bound key and keeps the lease alive in the background. A crashed
//! instance stops refreshing, its key expires after the TTL and the slot is
//! handed to the next instance that scans.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::{Clock, Settings, SettingsFactory, SystemClock};
use crate::coordinator::{Coordinator, KeepAliveHandle, Lease, SharedCoordinator};
use crate::error::{IdentityError, UidError};
use crate::layout::BitLayout;
use crate::store::{BaseStore, EtcdStore};

/// Prefix of the lease-bound liveness keys
pub const NODES_PREFIX: &str = "/uid/nodes/";
/// Prefix of the per-node base keys
pub const SETTINGS_PREFIX: &str = "/uid/settings/";
/// Registration lease TTL
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(60 * 60);

const NODE_MARKER: &[u8] = b"active";
const MAX_REGISTER_ATTEMPTS: u32 = 8;

/// Node id allocated from the coordination backend, base stored alongside
pub struct EtcdSettings {
    node_id: u32,
    lease: Lease,
    coordinator: Arc<dyn Coordinator>,
    clock: Arc<dyn Clock>,
    store: EtcdStore,
    keep_alive: KeepAliveHandle,
}

impl EtcdSettings {
    /// Register with the default one hour lease
    pub fn register(
        coordinator: Arc<dyn Coordinator>,
        max_node_id: u32,
    ) -> Result<Self, UidError> {
        Self::register_with_ttl(coordinator, max_node_id, DEFAULT_LEASE_TTL)
    }

    #[instrument(level = "debug", skip(coordinator))]
    pub fn register_with_ttl(
        coordinator: Arc<dyn Coordinator>,
        max_node_id: u32,
        ttl: Duration,
    ) -> Result<Self, UidError> {
        let lease = coordinator
            .grant_lease(ttl)
            .map_err(IdentityError::backend("grant lease"))?;

        let claimed =
            claim_node_id(coordinator.as_ref(), &lease, max_node_id).and_then(|node_id| {
                let keep_alive = coordinator
                    .keep_alive(&lease)
                    .map_err(IdentityError::backend("start lease keep-alive"))?;
                Ok((node_id, keep_alive))
            });
        let (node_id, keep_alive) = match claimed {
            Ok(claimed) => claimed,
            Err(err) => {
                if let Err(error) = coordinator.revoke_lease(&lease) {
                    warn!(lease = lease.id, %error, "failed to revoke unused lease");
                }
                return Err(err.into());
            }
        };

        info!(
            node_id,
            lease = lease.id,
            ttl_secs = lease.ttl.as_secs(),
            "registered node"
        );
        let key = format!("{SETTINGS_PREFIX}{node_id}");
        let store = EtcdStore::with_key(Arc::clone(&coordinator), key);
        Ok(Self {
            node_id,
            lease,
            coordinator,
            clock: Arc::new(SystemClock),
            store,
            keep_alive,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn lease(&self) -> &Lease {
        &self.lease
    }

    /// Give the node id back right away instead of waiting for lease expiry
    ///
    /// Only call this once every generator built on these settings has been
    /// dropped. Another instance may claim the slot immediately, and ids still
    /// issued under this node id would then collide with its ids.
    pub fn release(&self) -> Result<(), UidError> {
        self.keep_alive.stop();
        self.coordinator
            .revoke_lease(&self.lease)
            .map_err(IdentityError::backend("revoke lease"))?;
        info!(node_id = self.node_id, lease = self.lease.id, "released node");
        Ok(())
    }
}

/// Lowest id in `0..=max` missing from `taken`
fn first_free(taken: &HashSet<u32>, max: u32) -> Option<u32> {
    (0..=max).find(|id| !taken.contains(id))
}

fn registered_ids(coordinator: &dyn Coordinator) -> Result<HashSet<u32>, IdentityError> {
    let keys = coordinator
        .keys_with_prefix(NODES_PREFIX)
        .map_err(IdentityError::backend("list registered nodes"))?;
    Ok(keys
        .iter()
        .filter_map(|key| key.strip_prefix(NODES_PREFIX)?.parse().ok())
        .collect())
}

fn claim_node_id(
    coordinator: &dyn Coordinator,
    lease: &Lease,
    max_node_id: u32,
) -> Result<u32, IdentityError> {
    for _ in 0..MAX_REGISTER_ATTEMPTS {
        let taken = registered_ids(coordinator)?;
        let node_id = first_free(&taken, max_node_id)
            .ok_or(IdentityError::Exhausted { max: max_node_id })?;
        let key = format!("{NODES_PREFIX}{node_id}");
        let created = coordinator
            .create(&key, NODE_MARKER, Some(lease))
            .map_err(IdentityError::backend("register node id"))?;
        if created {
            return Ok(node_id);
        }
    }
    Err(IdentityError::Contended {
        attempts: MAX_REGISTER_ATTEMPTS,
    })
}

impl Settings for EtcdSettings {
    fn node_id(&self) -> Result<u32, UidError> {
        Ok(self.node_id)
    }

    fn current_time(&self) -> Result<DateTime<Utc>, UidError> {
        Ok(self.clock.now())
    }

    fn store(&self) -> &dyn BaseStore {
        &self.store
    }
}

impl std::fmt::Debug for EtcdSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdSettings")
            .field("node_id", &self.node_id)
            .field("lease", &self.lease)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Registers a fresh [`EtcdSettings`] per generator over one shared connection
#[derive(Debug, Clone)]
pub struct EtcdSettingsFactory {
    coordinator: Arc<SharedCoordinator>,
    ttl: Duration,
}

impl EtcdSettingsFactory {
    pub fn new(coordinator: Arc<SharedCoordinator>) -> Self {
        Self {
            coordinator,
            ttl: DEFAULT_LEASE_TTL,
        }
    }

    /// Connects to etcd on first use
    #[cfg(feature = "etcd")]
    pub fn connect(endpoints: Vec<String>) -> Self {
        Self::new(Arc::new(SharedCoordinator::etcd(endpoints)))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

impl SettingsFactory for EtcdSettingsFactory {
    fn create(&self, layout: &BitLayout) -> Result<Arc<dyn Settings>, UidError> {
        let coordinator = self
            .coordinator
            .get()
            .map_err(IdentityError::backend("connect to coordination backend"))?;
        let settings =
            EtcdSettings::register_with_ttl(coordinator, layout.max_node_id(), self.ttl)?;
        Ok(Arc::new(settings))
    }
}

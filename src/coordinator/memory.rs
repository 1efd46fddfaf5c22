//! In-process coordination backend
//!
//! Mirrors the etcd semantics the generator relies on: prefix listing,
//! put-if-absent, delete counts and TTL leases whose keys vanish on expiry.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{Coordinator, KeepAliveHandle, KvError, Lease};

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    lease: Option<i64>,
}

#[derive(Debug)]
struct LeaseState {
    ttl: Duration,
    refreshed: Instant,
    keeper: Option<Arc<AtomicBool>>,
}

impl LeaseState {
    fn is_kept_alive(&self) -> bool {
        self.keeper
            .as_ref()
            .is_some_and(|stopped| !stopped.load(Ordering::Acquire))
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<String, Entry>,
    leases: HashMap<i64, LeaseState>,
    next_lease: i64,
}

impl Inner {
    /// Refresh kept-alive leases, then drop expired ones with their keys
    ///
    /// A stopped keeper is only noticed here, so the first observation of the
    /// stop counts as the last refresh and the lease lives one more TTL.
    fn expire(&mut self, now: Instant) {
        let mut expired = Vec::new();
        for (id, lease) in self.leases.iter_mut() {
            if lease.is_kept_alive() {
                lease.refreshed = now;
            } else if lease.keeper.take().is_some() {
                lease.refreshed = now;
            } else if now.duration_since(lease.refreshed) >= lease.ttl {
                expired.push(*id);
            }
        }
        for id in expired {
            self.drop_lease(id);
        }
    }

    fn drop_lease(&mut self, id: i64) -> bool {
        if self.leases.remove(&id).is_none() {
            return false;
        }
        self.entries.retain(|_, entry| entry.lease != Some(id));
        true
    }

    fn check_lease(&self, lease: Option<&Lease>) -> Result<Option<i64>, KvError> {
        match lease {
            Some(lease) if !self.leases.contains_key(&lease.id) => {
                Err(KvError::LeaseNotFound(lease.id))
            }
            Some(lease) => Ok(Some(lease.id)),
            None => Ok(None),
        }
    }
}

/// Coordinator living entirely in this process
#[derive(Debug, Default)]
pub struct MemoryCoordinator {
    inner: Mutex<Inner>,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> parking_lot::MutexGuard<'_, Inner> {
        let mut inner = self.inner.lock();
        inner.expire(Instant::now());
        inner
    }
}

impl Coordinator for MemoryCoordinator {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.locked().entries.get(key).map(|e| e.value.clone()))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let inner = self.locked();
        Ok(inner
            .entries
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn put(&self, key: &str, value: &[u8], lease: Option<&Lease>) -> Result<(), KvError> {
        let mut inner = self.locked();
        let lease = inner.check_lease(lease)?;
        inner.entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                lease,
            },
        );
        Ok(())
    }

    fn create(&self, key: &str, value: &[u8], lease: Option<&Lease>) -> Result<bool, KvError> {
        let mut inner = self.locked();
        let lease = inner.check_lease(lease)?;
        if inner.entries.contains_key(key) {
            return Ok(false);
        }
        inner.entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_vec(),
                lease,
            },
        );
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<u64, KvError> {
        Ok(self.locked().entries.remove(key).map_or(0, |_| 1))
    }

    fn grant_lease(&self, ttl: Duration) -> Result<Lease, KvError> {
        let mut inner = self.locked();
        inner.next_lease += 1;
        let id = inner.next_lease;
        inner.leases.insert(
            id,
            LeaseState {
                ttl,
                refreshed: Instant::now(),
                keeper: None,
            },
        );
        Ok(Lease { id, ttl })
    }

    fn keep_alive(&self, lease: &Lease) -> Result<KeepAliveHandle, KvError> {
        let mut inner = self.locked();
        let state = inner
            .leases
            .get_mut(&lease.id)
            .ok_or(KvError::LeaseNotFound(lease.id))?;
        let handle = KeepAliveHandle::new();
        state.refreshed = Instant::now();
        state.keeper = Some(handle.signal());
        Ok(handle)
    }

    fn revoke_lease(&self, lease: &Lease) -> Result<(), KvError> {
        if self.locked().drop_lease(lease.id) {
            Ok(())
        } else {
            Err(KvError::LeaseNotFound(lease.id))
        }
    }
}

//! Key-value coordination backend used for node registration and base storage
//!
//! - `memory` - In-process backend with lease expiry
//! - `etcd` - etcd v3 backend (feature `etcd`)
//! - `SharedCoordinator` - connect-once handle shared by every generator

#[cfg(feature = "etcd")]
mod etcd;
mod memory;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use thiserror::Error;

#[cfg(feature = "etcd")]
pub use etcd::EtcdCoordinator;
pub use memory::MemoryCoordinator;

/// Errors reported by a coordination backend
#[derive(Debug, Error)]
pub enum KvError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("lease {0} does not exist")]
    LeaseNotFound(i64),
    #[error("failed to start coordination runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("coordination request was cancelled")]
    Cancelled,
    #[cfg(feature = "etcd")]
    #[error(transparent)]
    Etcd(#[from] etcd_client::Error),
}

/// A granted lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lease {
    pub id: i64,
    pub ttl: Duration,
}

/// Keeps a lease alive until stopped or dropped
///
/// Once stopped, the lease (and every key attached to it) expires after its
/// TTL unless revoked earlier.
#[derive(Debug, Default)]
pub struct KeepAliveHandle {
    stopped: Arc<AtomicBool>,
}

impl KeepAliveHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Flag observed by the backend's refresh loop
    pub(crate) fn signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stopped)
    }
}

impl Drop for KeepAliveHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Minimal key-value capabilities needed to register nodes and persist bases
pub trait Coordinator: Send + Sync {
    /// Value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Every key starting with `prefix`
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError>;

    /// Unconditional write, optionally bound to a lease
    fn put(&self, key: &str, value: &[u8], lease: Option<&Lease>) -> Result<(), KvError>;

    /// Write only if `key` does not exist; returns whether the write happened
    fn create(&self, key: &str, value: &[u8], lease: Option<&Lease>) -> Result<bool, KvError>;

    /// Number of keys deleted (0 when `key` did not exist)
    fn delete(&self, key: &str) -> Result<u64, KvError>;

    fn grant_lease(&self, ttl: Duration) -> Result<Lease, KvError>;

    /// Start refreshing `lease` in the background
    fn keep_alive(&self, lease: &Lease) -> Result<KeepAliveHandle, KvError>;

    /// Drop `lease` and every key attached to it right away
    fn revoke_lease(&self, lease: &Lease) -> Result<(), KvError>;
}

type ConnectFn = dyn Fn() -> Result<Arc<dyn Coordinator>, KvError> + Send + Sync;

/// Lazily connected coordinator shared across generators
///
/// The connect closure runs at most once successfully; every caller gets the
/// same `Arc`. A failed connect is retried on the next `get`.
pub struct SharedCoordinator {
    cell: OnceCell<Arc<dyn Coordinator>>,
    connect: Box<ConnectFn>,
}

impl SharedCoordinator {
    pub fn new<F>(connect: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Coordinator>, KvError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceCell::new(),
            connect: Box::new(connect),
        }
    }

    /// Wrap an already connected coordinator
    pub fn from_coordinator(coordinator: Arc<dyn Coordinator>) -> Self {
        Self {
            cell: OnceCell::with_value(coordinator),
            connect: Box::new(|| Err(KvError::Cancelled)),
        }
    }

    /// Connect to etcd on first use
    #[cfg(feature = "etcd")]
    pub fn etcd(endpoints: Vec<String>) -> Self {
        Self::new(move || {
            let client = EtcdCoordinator::connect(&endpoints)?;
            Ok(Arc::new(client) as Arc<dyn Coordinator>)
        })
    }

    pub fn get(&self) -> Result<Arc<dyn Coordinator>, KvError> {
        self.cell.get_or_try_init(|| (self.connect)()).cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for SharedCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCoordinator")
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use super::*;

    #[test]
    fn test_shared_coordinator_connects_once() {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connects);
        let shared = Arc::new(SharedCoordinator::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MemoryCoordinator::new()) as Arc<dyn Coordinator>)
        }));
        assert!(!shared.is_connected());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.get().unwrap())
            })
            .collect();
        let clients: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert!(clients.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_failed_connect_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let shared = SharedCoordinator::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(KvError::Timeout(Duration::from_secs(5)));
            }
            Ok(Arc::new(MemoryCoordinator::new()) as Arc<dyn Coordinator>)
        });

        assert!(matches!(shared.get(), Err(KvError::Timeout(_))));
        assert!(shared.get().is_ok());
        assert!(shared.get().is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_keep_alive_handle_stops_on_drop() {
        let handle = KeepAliveHandle::new();
        let signal = handle.signal();
        assert!(!signal.load(Ordering::Acquire));
        drop(handle);
        assert!(signal.load(Ordering::Acquire));
    }
}

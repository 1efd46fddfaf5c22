//! etcd v3 backend
//!
//! The generator API is synchronous, so requests run on a small dedicated
//! tokio runtime and the calling thread waits on a channel. This works from
//! plain threads and from inside another runtime alike.

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::time::Duration;

use etcd_client::{
    Client, Compare, CompareOp, ConnectOptions, GetOptions, PutOptions, Txn, TxnOp,
};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, instrument, warn};

use super::{Coordinator, KeepAliveHandle, KvError, Lease};

/// Per-request deadline
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);
/// Connection deadline
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);
const MIN_KEEP_ALIVE_PERIOD: Duration = Duration::from_millis(500);

/// Coordinator backed by an etcd cluster
pub struct EtcdCoordinator {
    client: Client,
    runtime: Option<Runtime>,
    timeout: Duration,
}

impl EtcdCoordinator {
    #[instrument(level = "debug", skip(endpoints))]
    pub fn connect<E: AsRef<str>>(endpoints: &[E]) -> Result<Self, KvError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("nodeuid-etcd")
            .enable_all()
            .build()
            .map_err(KvError::Runtime)?;

        let endpoints: Vec<String> = endpoints.iter().map(|e| e.as_ref().to_owned()).collect();
        debug!(?endpoints, "connecting to etcd");
        let options = ConnectOptions::new().with_connect_timeout(DIAL_TIMEOUT);
        let client = run_on(&runtime, DIAL_TIMEOUT, async move {
            Client::connect(endpoints, Some(options)).await
        })?;

        Ok(Self {
            client,
            runtime: Some(runtime),
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn runtime(&self) -> Result<&Runtime, KvError> {
        self.runtime.as_ref().ok_or(KvError::Cancelled)
    }

    fn run<F, T>(&self, fut: F) -> Result<T, KvError>
    where
        F: Future<Output = Result<T, etcd_client::Error>> + Send + 'static,
        T: Send + 'static,
    {
        run_on(self.runtime()?, self.timeout, fut)
    }
}

fn run_on<F, T>(runtime: &Runtime, timeout: Duration, fut: F) -> Result<T, KvError>
where
    F: Future<Output = Result<T, etcd_client::Error>> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    runtime.spawn(async move {
        let _ = tx.send(tokio::time::timeout(timeout, fut).await);
    });
    match rx.recv() {
        Ok(Ok(result)) => result.map_err(KvError::from),
        Ok(Err(_elapsed)) => Err(KvError::Timeout(timeout)),
        Err(_) => Err(KvError::Cancelled),
    }
}

impl Coordinator for EtcdCoordinator {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let mut client = self.client.clone();
        let key = key.to_owned();
        let resp = self.run(async move { client.get(key, None).await })?;
        Ok(resp.kvs().first().map(|kv| kv.value().to_vec()))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let mut client = self.client.clone();
        let prefix = prefix.to_owned();
        let options = GetOptions::new().with_prefix().with_keys_only();
        let resp = self.run(async move { client.get(prefix, Some(options)).await })?;
        Ok(resp
            .kvs()
            .iter()
            .map(|kv| String::from_utf8_lossy(kv.key()).into_owned())
            .collect())
    }

    fn put(&self, key: &str, value: &[u8], lease: Option<&Lease>) -> Result<(), KvError> {
        let mut client = self.client.clone();
        let (key, value) = (key.to_owned(), value.to_vec());
        let options = lease.map(|l| PutOptions::new().with_lease(l.id));
        self.run(async move { client.put(key, value, options).await })?;
        Ok(())
    }

    fn create(&self, key: &str, value: &[u8], lease: Option<&Lease>) -> Result<bool, KvError> {
        let mut client = self.client.clone();
        let options = lease.map(|l| PutOptions::new().with_lease(l.id));
        // create_revision == 0 only holds for keys that do not exist
        let txn = Txn::new()
            .when([Compare::create_revision(key, CompareOp::Equal, 0)])
            .and_then([TxnOp::put(key, value.to_vec(), options)]);
        let resp = self.run(async move { client.txn(txn).await })?;
        Ok(resp.succeeded())
    }

    fn delete(&self, key: &str) -> Result<u64, KvError> {
        let mut client = self.client.clone();
        let key = key.to_owned();
        let resp = self.run(async move { client.delete(key, None).await })?;
        Ok(resp.deleted().max(0) as u64)
    }

    fn grant_lease(&self, ttl: Duration) -> Result<Lease, KvError> {
        let mut client = self.client.clone();
        let secs = ttl.as_secs().max(1) as i64;
        let resp = self.run(async move { client.lease_grant(secs, None).await })?;
        Ok(Lease {
            id: resp.id(),
            ttl: Duration::from_secs(resp.ttl().max(1) as u64),
        })
    }

    fn keep_alive(&self, lease: &Lease) -> Result<KeepAliveHandle, KvError> {
        let mut client = self.client.clone();
        let id = lease.id;
        let (mut keeper, mut stream) =
            self.run(async move { client.lease_keep_alive(id).await })?;

        let handle = KeepAliveHandle::new();
        let stopped = handle.signal();
        let period = (lease.ttl / 3).max(MIN_KEEP_ALIVE_PERIOD);
        self.runtime()?.spawn(async move {
            while !stopped.load(Ordering::Acquire) {
                if let Err(error) = keeper.keep_alive().await {
                    warn!(lease = id, %error, "lease keep-alive request failed");
                    return;
                }
                match stream.message().await {
                    Ok(Some(resp)) if resp.ttl() > 0 => {}
                    Ok(_) => {
                        warn!(lease = id, "lease keep-alive stream ended");
                        return;
                    }
                    Err(error) => {
                        warn!(lease = id, %error, "lease keep-alive stream failed");
                        return;
                    }
                }
                tokio::time::sleep(period).await;
            }
            debug!(lease = id, "lease keep-alive stopped");
        });
        Ok(handle)
    }

    fn revoke_lease(&self, lease: &Lease) -> Result<(), KvError> {
        let mut client = self.client.clone();
        let id = lease.id;
        self.run(async move { client.lease_revoke(id).await })?;
        Ok(())
    }
}

impl Drop for EtcdCoordinator {
    fn drop(&mut self) {
        // dropping a runtime blocks, which panics inside another runtime
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for EtcdCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdCoordinator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

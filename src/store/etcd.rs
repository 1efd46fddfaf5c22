use std::sync::Arc;

use super::{decode_base, encode_base, BaseStore};
use crate::coordinator::Coordinator;
use crate::error::StoreError;

/// Key prefix for bases saved by a plain [`EtcdStore`]
pub const BASE_PREFIX: &str = "/uid/base/";

/// Base persisted under a single coordination key
#[derive(Clone)]
pub struct EtcdStore {
    coordinator: Arc<dyn Coordinator>,
    key: String,
}

impl EtcdStore {
    /// Store under `/uid/base/{node_id}`
    pub fn new(coordinator: Arc<dyn Coordinator>, node_id: u32) -> Self {
        Self::with_key(coordinator, format!("{BASE_PREFIX}{node_id}"))
    }

    pub fn with_key(coordinator: Arc<dyn Coordinator>, key: impl Into<String>) -> Self {
        Self {
            coordinator,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl BaseStore for EtcdStore {
    fn load(&self) -> Result<u32, StoreError> {
        match self.coordinator.get(&self.key)? {
            Some(value) => decode_base(&value),
            None => Err(StoreError::NotFound),
        }
    }

    fn save(&self, base: u32) -> Result<(), StoreError> {
        self.coordinator.put(&self.key, &encode_base(base), None)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        // deleting a missing key succeeds with a zero count
        match self.coordinator.delete(&self.key)? {
            0 => Err(StoreError::NotFound),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for EtcdStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdStore").field("key", &self.key).finish()
    }
}

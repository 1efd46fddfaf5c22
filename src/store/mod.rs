//! Durable storage for the last used base of a node
//!
//! The persisted form is always 4 bytes, big-endian.

mod etcd;
mod file;

pub use etcd::{EtcdStore, BASE_PREFIX};
pub use file::FileStore;

use crate::error::StoreError;

/// Size of a persisted base value
pub const ENCODED_LEN: usize = 4;

/// Load/save/remove a single base value
pub trait BaseStore: Send + Sync {
    /// Last saved base; [`StoreError::NotFound`] when nothing was saved
    fn load(&self) -> Result<u32, StoreError>;

    /// Overwrite the saved base
    fn save(&self, base: u32) -> Result<(), StoreError>;

    /// Delete the saved base; [`StoreError::NotFound`] when already absent
    fn remove(&self) -> Result<(), StoreError>;
}

#[inline]
pub(crate) fn encode_base(base: u32) -> [u8; ENCODED_LEN] {
    base.to_be_bytes()
}

#[inline]
pub(crate) fn decode_base(bytes: &[u8]) -> Result<u32, StoreError> {
    let buf: [u8; ENCODED_LEN] = bytes
        .try_into()
        .map_err(|_| StoreError::Corrupt { len: bytes.len() })?;
    Ok(u32::from_be_bytes(buf))
}

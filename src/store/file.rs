use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{decode_base, encode_base, BaseStore};
use crate::error::StoreError;

/// Base persisted in a 4-byte file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `{temp_dir}/uid_base_{node_id}.bin`
    pub fn for_node(node_id: u32) -> Self {
        Self::in_dir(std::env::temp_dir(), node_id)
    }

    /// `{dir}/uid_base_{node_id}.bin`
    pub fn in_dir(dir: impl AsRef<Path>, node_id: u32) -> Self {
        Self::new(dir.as_ref().join(format!("uid_base_{node_id}.bin")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn not_found_or(err: io::Error) -> StoreError {
    if err.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound
    } else {
        StoreError::Io(err)
    }
}

impl BaseStore for FileStore {
    fn load(&self) -> Result<u32, StoreError> {
        let bytes = fs::read(&self.path).map_err(not_found_or)?;
        decode_base(&bytes)
    }

    fn save(&self, base: u32) -> Result<(), StoreError> {
        // create-or-truncate, write, close
        fs::write(&self.path, encode_base(base))?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StoreError> {
        fs::remove_file(&self.path).map_err(not_found_or)
    }
}

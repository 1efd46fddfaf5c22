use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{Clock, Settings, SettingsFactory, SystemClock};
use crate::error::UidError;
use crate::layout::BitLayout;
use crate::store::{BaseStore, FileStore};

/// Operator-assigned node id with a locally persisted base
pub struct LocalSettings {
    node_id: u32,
    clock: Arc<dyn Clock>,
    store: Box<dyn BaseStore>,
}

impl LocalSettings {
    /// Base saved to `{temp_dir}/uid_settings_{node_id}.bin`
    pub fn new(node_id: u32) -> Self {
        Self::in_dir(std::env::temp_dir(), node_id)
    }

    /// Base saved to `{dir}/uid_settings_{node_id}.bin`
    pub fn in_dir(dir: impl AsRef<Path>, node_id: u32) -> Self {
        let path = settings_path(dir.as_ref(), node_id);
        Self::with_store(node_id, FileStore::new(path))
    }

    /// Fixed node id with any store, e.g. an [`EtcdStore`](crate::EtcdStore)
    pub fn with_store(node_id: u32, store: impl BaseStore + 'static) -> Self {
        Self {
            node_id,
            clock: Arc::new(SystemClock),
            store: Box::new(store),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

fn settings_path(dir: &Path, node_id: u32) -> PathBuf {
    dir.join(format!("uid_settings_{node_id}.bin"))
}

impl Settings for LocalSettings {
    fn node_id(&self) -> Result<u32, UidError> {
        Ok(self.node_id)
    }

    fn current_time(&self) -> Result<DateTime<Utc>, UidError> {
        Ok(self.clock.now())
    }

    fn store(&self) -> &dyn BaseStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for LocalSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSettings")
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}

/// Builds [`LocalSettings`] for a fixed node id
#[derive(Debug, Clone)]
pub struct LocalSettingsFactory {
    node_id: u32,
    dir: PathBuf,
}

impl LocalSettingsFactory {
    pub fn new(node_id: u32) -> Self {
        Self::in_dir(std::env::temp_dir(), node_id)
    }

    pub fn in_dir(dir: impl Into<PathBuf>, node_id: u32) -> Self {
        Self {
            node_id,
            dir: dir.into(),
        }
    }
}

impl SettingsFactory for LocalSettingsFactory {
    fn create(&self, _layout: &BitLayout) -> Result<Arc<dyn Settings>, UidError> {
        Ok(Arc::new(LocalSettings::in_dir(&self.dir, self.node_id)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_settings_file_name() {
        assert_eq!(
            settings_path(Path::new("/tmp"), 9),
            PathBuf::from("/tmp/uid_settings_9.bin")
        );
    }

    #[test]
    fn test_delegates_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings = LocalSettings::in_dir(dir.path(), 2);

        assert_eq!(settings.node_id().unwrap(), 2);
        assert!(settings.load_base().unwrap_err().is_not_found());
        settings.save_base(17).unwrap();
        assert_eq!(settings.load_base().unwrap(), 17);
        assert!(dir.path().join("uid_settings_2.bin").exists());
        settings.remove_base().unwrap();
        assert!(settings.remove_base().unwrap_err().is_not_found());
    }

    #[test]
    fn test_injected_clock() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let settings = LocalSettings::new(0).with_clock(move || at);
        assert_eq!(settings.current_time().unwrap(), at);
    }
}

//! Core Uid generator implementation
//!
//! Split into modules for testability:
//! - `init` - Initial base resolution against the persisted base
//! - `time` - Minute buckets since the epoch
//! - `generate` - ID generation and rollover

mod generate;
mod init;
mod time;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::config::UidConfig;
use crate::error::UidError;
use crate::layout::BitLayout;
use crate::settings::{LocalSettings, Settings, SettingsFactory};

pub use generate::ROLLOVER_SEQUENCE;

/// Node-scoped unique ID generator
///
/// IDs are `base | node_id | sequence`, where base counts minutes since the
/// configured epoch. Generation is lock-free; the base is persisted through
/// the injected [`Settings`] whenever the sequence rolls over.
#[repr(align(64))]
pub struct Uid {
    // === Hot path fields ===
    pub(crate) state: AtomicU64,
    pub(crate) max_seq: u64,
    pub(crate) layout: BitLayout,
    pub(crate) node_id: u32,

    // === Cold path fields ===
    persist_lock: Mutex<()>,
    settings: Arc<dyn Settings>,
    config: UidConfig,
}

impl Uid {
    /// Default configuration with a locally persisted base
    pub fn new(node_id: u32) -> Result<Self, UidError> {
        Self::with_settings(UidConfig::default(), Arc::new(LocalSettings::new(node_id)))
    }

    /// Build the settings from a factory, then initialize
    pub fn with_factory(
        config: UidConfig,
        factory: &dyn SettingsFactory,
    ) -> Result<Self, UidError> {
        let settings = factory.create(config.layout())?;
        Self::with_settings(config, settings)
    }

    /// Resolve node id and base through `settings`
    #[instrument(level = "debug", skip(settings))]
    pub fn with_settings(
        config: UidConfig,
        settings: Arc<dyn Settings>,
    ) -> Result<Self, UidError> {
        let node_id = settings.node_id()?;
        config.validate_node_id(node_id)?;

        let layout = *config.layout();
        let base = init::resolve_base(&layout, config.epoch(), settings.as_ref(), node_id)?;
        info!(node_id, base, node_bits = layout.node_bits(), "uid generator ready");

        Ok(Self {
            state: AtomicU64::new(layout.encode(base, node_id, 0)),
            max_seq: layout.max_sequence(),
            layout,
            node_id,
            persist_lock: Mutex::new(()),
            settings,
            config,
        })
    }

    #[inline(always)]
    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    /// Minute bucket of the most recently issued id
    #[inline(always)]
    pub fn base(&self) -> u32 {
        self.layout.base(self.current_id())
    }

    /// Most recently issued id (the seed value before the first call)
    #[inline(always)]
    pub fn current_id(&self) -> u64 {
        self.state.load(Ordering::Acquire)
    }

    /// Split an id into `(base, node_id, sequence)`
    #[inline]
    pub fn decompose(&self, id: u64) -> (u32, u32, u64) {
        self.layout.decode(id)
    }

    pub fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub fn config(&self) -> &UidConfig {
        &self.config
    }

    /// Injected identity and persistence
    pub fn settings(&self) -> &Arc<dyn Settings> {
        &self.settings
    }

    /// Delete this node's persisted base
    ///
    /// Administrative; do not call while ids are still being generated, the
    /// next rollover writes the base again. A missing base surfaces as
    /// [`UidError::PersistenceUnavailable`] wrapping
    /// [`StoreError::NotFound`](crate::StoreError::NotFound).
    pub fn remove_base(&self) -> Result<(), UidError> {
        let _guard = self.persist_lock.lock();
        self.settings.remove_base()?;
        info!(node_id = self.node_id, "removed persisted base");
        Ok(())
    }
}

impl std::fmt::Debug for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uid")
            .field("node_id", &self.node_id)
            .field("base", &self.base())
            .field("current_id", &self.current_id())
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

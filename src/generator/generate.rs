//! ID generation logic
//!
//! The packed id itself is the only hot state: the sequence lives in its low
//! bits, so the common case is a single compare-and-swap of `current + 1`.

use std::sync::atomic::Ordering;

use tracing::{debug, warn};

use super::Uid;

/// Sequence of the first id issued after a rollover
pub const ROLLOVER_SEQUENCE: u64 = 1;

impl Uid {
    /// Generate a new unique ID
    #[inline]
    pub fn next_id(&self) -> u64 {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let exhausted = current & self.max_seq == self.max_seq;
            let next = if exhausted {
                self.rollover_id(current)
            } else {
                current + 1
            };
            match self.cas_state(current, next) {
                Ok(()) => {
                    if exhausted {
                        self.persist_base();
                    }
                    return next;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Same as [`next_id`](Self::next_id)
    #[inline]
    pub fn generate(&self) -> u64 {
        self.next_id()
    }

    /// First id of the bucket after the one `current` belongs to
    #[inline]
    pub(crate) fn rollover_id(&self, current: u64) -> u64 {
        let base = self.layout.base(current).wrapping_add(1) & self.layout.max_base();
        self.layout.encode(base, self.node_id, ROLLOVER_SEQUENCE)
    }

    /// Atomic compare-and-swap on state
    #[inline(always)]
    pub(crate) fn cas_state(&self, expected: u64, new: u64) -> Result<(), u64> {
        self.state
            .compare_exchange_weak(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
    }

    /// Best-effort save of the latest base after a rollover
    ///
    /// Saves are serialized and always write the base current at the time of
    /// the write, so racing rollovers cannot leave an older base persisted.
    #[cold]
    #[inline(never)]
    fn persist_base(&self) {
        let _guard = self.persist_lock.lock();
        let base = self.base();
        match self.settings.save_base(base) {
            Ok(()) => debug!(node_id = self.node_id, base, "base rolled over"),
            Err(error) => warn!(
                node_id = self.node_id,
                base,
                %error,
                "failed to persist base after rollover"
            ),
        }
    }
}

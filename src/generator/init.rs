//! Initial base resolution
//!
//! The base is derived from the clock, then bumped past whatever this node id
//! persisted last so a restart (or clock skew) never reissues a used bucket.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::time::minutes_since;
use crate::error::{StoreError, UidError};
use crate::layout::BitLayout;
use crate::settings::Settings;

pub(super) fn resolve_base(
    layout: &BitLayout,
    epoch: DateTime<Utc>,
    settings: &dyn Settings,
    node_id: u32,
) -> Result<u32, UidError> {
    let now = settings.current_time()?;
    let candidate = minutes_since(epoch, now, layout.max_base());

    let base = match settings.load_base() {
        Ok(prior) if candidate <= prior => {
            let base = prior.wrapping_add(1) & layout.max_base();
            debug!(node_id, candidate, prior, base, "clock behind persisted base");
            base
        }
        Ok(_) | Err(StoreError::NotFound) => candidate,
        Err(error) => {
            warn!(node_id, %error, "failed to load persisted base; deriving from clock");
            candidate
        }
    };

    // losing this write only means the next start re-derives from the clock
    if let Err(error) = settings.save_base(base) {
        warn!(node_id, base, %error, "failed to persist initial base");
    }
    Ok(base)
}

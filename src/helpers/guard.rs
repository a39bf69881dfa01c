//! Re-entrancy tokens for the financial recomputation endpoints.
//!
//! The reconciliation engine itself is stateless and reentrant; overlap
//! suppression is the caller's job and is scoped per household. Each
//! household id is a single check-and-set slot: a second caller while that
//! household's computation is in flight is skipped, never queued. Other
//! households are unaffected.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Per-household in-flight slot map.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: Mutex<HashSet<i32>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for one household. Returns `None` when a computation
    /// for that household is already in flight; the returned guard releases
    /// the slot on drop.
    pub fn try_begin(&self, household_id: i32) -> Option<InFlightGuard<'_>> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        busy.insert(household_id).then_some(InFlightGuard {
            slots: &self.busy,
            household_id,
        })
    }
}

/// RAII release of one household's in-flight slot.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<i32>>,
    household_id: i32,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.household_id);
    }
}

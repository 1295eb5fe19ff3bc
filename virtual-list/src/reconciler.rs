use alloc::collections::BTreeSet;

use crate::CellId;

/// Bookkeeping for the pending adjustment.
///
/// Items above the first visible cell may turn out larger or smaller than guessed. Instead of
/// moving everything below them (a visible jump), the difference is parked here as a shift of
/// the painted layout: every item is painted at its true position plus [`Self::pending`]. The
/// list flushes the shift once no animation is in flight and either the error exceeds the
/// tolerance or the viewport sits at the start of the list.
#[derive(Clone, Debug, Default)]
pub struct CorrectionReconciler {
    pending: i64,
    tolerance: u64,
    animations: BTreeSet<CellId>,
}

impl CorrectionReconciler {
    pub fn new(tolerance: u64) -> Self {
        Self {
            pending: 0,
            tolerance,
            animations: BTreeSet::new(),
        }
    }

    pub fn pending(&self) -> i64 {
        self.pending
    }

    pub fn tolerance(&self) -> u64 {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: u64) {
        self.tolerance = tolerance;
    }

    pub fn accumulate(&mut self, delta: i64) {
        self.pending = self.pending.saturating_add(delta);
    }

    pub fn begin_animation(&mut self, cell: CellId) {
        self.animations.insert(cell);
    }

    /// Returns `true` when `cell` was tracked.
    pub fn end_animation(&mut self, cell: CellId) -> bool {
        self.animations.remove(&cell)
    }

    pub fn animations_in_flight(&self) -> usize {
        self.animations.len()
    }

    pub fn should_flush(&self, at_start: bool) -> bool {
        if self.pending == 0 || !self.animations.is_empty() {
            return false;
        }
        self.pending.unsigned_abs() > self.tolerance || at_start
    }

    /// Returns the pending adjustment and resets it to zero.
    pub fn take(&mut self) -> i64 {
        core::mem::replace(&mut self.pending, 0)
    }
}

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use virtual_list::CellId;

use crate::{Easing, Tween};

/// Default duration of a cell offset animation.
pub const DEFAULT_ANIMATION_MS: u64 = 150;

/// Offset tweens for cells, keyed by cell id.
///
/// The host samples it on every tick; finished tweens are reported so the list can stop
/// holding back its pending corrections.
#[derive(Clone, Debug)]
pub struct Animator {
    tweens: BTreeMap<CellId, Tween>,
    duration_ms: u64,
    easing: Easing,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_MS, Easing::default())
    }
}

impl Animator {
    pub fn new(duration_ms: u64, easing: Easing) -> Self {
        Self {
            tweens: BTreeMap::new(),
            duration_ms,
            easing,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    /// Starts animating `cell` toward `to`.
    ///
    /// A cell already in flight continues from where it currently is. Returns the offset to
    /// paint right now.
    pub fn animate(&mut self, cell: CellId, from: i64, to: i64, now_ms: u64) -> i64 {
        if let Some(tween) = self.tweens.get_mut(&cell) {
            tween.retarget(now_ms, to, self.duration_ms);
            return tween.from;
        }
        let tween = Tween::new(from, to, now_ms, self.duration_ms, self.easing);
        self.tweens.insert(cell, tween);
        from
    }

    pub fn sample(&self, cell: CellId, now_ms: u64) -> Option<i64> {
        self.tweens.get(&cell).map(|t| t.sample(now_ms))
    }

    /// Drops the tween of `cell`; returns whether there was one.
    pub fn cancel(&mut self, cell: CellId) -> bool {
        self.tweens.remove(&cell).is_some()
    }

    pub fn is_animating(&self) -> bool {
        !self.tweens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }

    /// Samples every tween at `now_ms`, then removes the finished ones and returns their cells.
    pub fn tick(&mut self, now_ms: u64, mut f: impl FnMut(CellId, i64)) -> Vec<CellId> {
        let mut finished = Vec::new();
        for (&cell, tween) in &self.tweens {
            f(cell, tween.sample(now_ms));
            if tween.is_done(now_ms) {
                finished.push(cell);
            }
        }
        for cell in &finished {
            self.tweens.remove(cell);
        }
        finished
    }
}

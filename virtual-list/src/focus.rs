use alloc::vec::Vec;

use crate::directory::ItemDirectory;
use crate::key::ListKey;
use crate::{Axis, Item, RenderBlock};

/// Direction of a focus move along the scroll axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FocusDirection {
    /// Toward the start of the list.
    Up = -1,
    /// Toward the end of the list.
    Down = 1,
}

impl FocusDirection {
    pub fn step(self) -> isize {
        self as isize
    }

    /// Maps an arrow key onto the list's axis.
    ///
    /// Arrows across the axis map to `None`, and so do `Home`/`End`, which jump rather than step
    /// (see [`crate::VirtualList::handle_key`]).
    pub fn from_key(axis: Axis, key: NavKey) -> Option<Self> {
        match (axis, key) {
            (Axis::Vertical, NavKey::ArrowUp) | (Axis::Horizontal, NavKey::ArrowLeft) => {
                Some(Self::Up)
            }
            (Axis::Vertical, NavKey::ArrowDown) | (Axis::Horizontal, NavKey::ArrowRight) => {
                Some(Self::Down)
            }
            _ => None,
        }
    }
}

/// Navigation keys understood by the list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
}

/// What triggered a focus move. Keyboard moves scroll the new item into view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FocusSource {
    Keyboard,
    Programmatic,
}

/// Outcome of [`crate::VirtualList::focus_adjacent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FocusChange<K> {
    Focused(K),
    /// The list scrolled; the move is retried once during the next settle.
    Pending,
    Unchanged,
}

#[derive(Clone, Debug)]
pub(crate) struct PendingFocus<K> {
    pub(crate) direction: FocusDirection,
    pub(crate) source: FocusSource,
    pub(crate) target: Option<K>,
}

/// Decision taken by the navigator; the list carries out scrolling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FocusPlan {
    Focus(usize),
    ScrollTo { index: usize, target: Option<usize> },
    Stay,
}

/// Read access to the list state the navigator needs.
pub(crate) struct FocusContext<'a, K, D> {
    pub(crate) items: &'a [Item<K, D>],
    pub(crate) directory: &'a ItemDirectory<K>,
    pub(crate) block: &'a RenderBlock,
}

impl<K: ListKey, D> FocusContext<'_, K, D> {
    /// Navigable items that currently own a cell, in index order.
    pub(crate) fn rendered_navigable(&self) -> Vec<usize> {
        self.block
            .range()
            .filter(|&i| self.items[i].is_navigable)
            .collect()
    }

    /// Next navigable index strictly after `from` in `direction`, rendered or not.
    pub(crate) fn next_navigable(&self, from: usize, direction: FocusDirection) -> Option<usize> {
        match direction {
            FocusDirection::Down => {
                (from + 1..self.items.len()).find(|&i| self.items[i].is_navigable)
            }
            FocusDirection::Up => (0..from).rev().find(|&i| self.items[i].is_navigable),
        }
    }

    /// First (`Up`) or last (`Down`) navigable item of the whole list.
    pub(crate) fn edge_navigable(&self, edge: FocusDirection) -> Option<usize> {
        match edge {
            FocusDirection::Up => self.items.iter().position(|item| item.is_navigable),
            FocusDirection::Down => self.items.iter().rposition(|item| item.is_navigable),
        }
    }
}

/// Logical focus and selection of a list.
#[derive(Clone, Debug)]
pub struct FocusNavigator<K> {
    focused: Option<K>,
    selected: Option<K>,
    pending: Option<PendingFocus<K>>,
}

impl<K> Default for FocusNavigator<K> {
    fn default() -> Self {
        Self {
            focused: None,
            selected: None,
            pending: None,
        }
    }
}

impl<K: ListKey> FocusNavigator<K> {
    pub fn new(initial_selection: Option<K>) -> Self {
        Self {
            focused: initial_selection.clone(),
            selected: initial_selection,
            pending: None,
        }
    }

    pub fn focused(&self) -> Option<&K> {
        self.focused.as_ref()
    }

    pub fn selected(&self) -> Option<&K> {
        self.selected.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns `true` when the focused key changed.
    pub fn set_focused(&mut self, key: Option<K>) -> bool {
        self.pending = None;
        if self.focused == key {
            return false;
        }
        self.focused = key;
        true
    }

    pub fn set_selected(&mut self, key: Option<K>) {
        self.selected = key;
    }

    pub(crate) fn set_pending(&mut self, pending: PendingFocus<K>) {
        self.pending = Some(pending);
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingFocus<K>> {
        self.pending.take()
    }

    /// Decides where a move in `direction` goes.
    ///
    /// A `retry` never asks for another scroll: reaching an unrendered target twice means it is
    /// really unreachable.
    pub(crate) fn plan<D>(
        &self,
        ctx: &FocusContext<'_, K, D>,
        direction: FocusDirection,
        retry: bool,
    ) -> FocusPlan {
        let rendered = ctx.rendered_navigable();
        let focused_index = self.focused.as_ref().and_then(|k| ctx.directory.index_of(k));
        let Some(focused_index) = focused_index else {
            return rendered
                .first()
                .map_or(FocusPlan::Stay, |&i| FocusPlan::Focus(i));
        };

        match rendered.iter().position(|&i| i == focused_index) {
            Some(pos) => {
                let target = pos as isize + direction.step();
                if target >= 0 && (target as usize) < rendered.len() {
                    return FocusPlan::Focus(rendered[target as usize]);
                }
                match ctx.next_navigable(focused_index, direction) {
                    Some(index) if !retry => FocusPlan::ScrollTo {
                        index,
                        target: Some(index),
                    },
                    _ => FocusPlan::Stay,
                }
            }
            None if retry => FocusPlan::Stay,
            None => {
                let target = ctx.next_navigable(focused_index, direction);
                FocusPlan::ScrollTo {
                    index: target.unwrap_or(focused_index),
                    target,
                }
            }
        }
    }

    /// Repairs focus and selection after the list changed.
    ///
    /// A removed focused item hands focus to the next navigable item (then the previous one);
    /// a removed selection is cleared. Returns `true` when the focused key changed.
    pub(crate) fn on_items_changed<D>(
        &mut self,
        prev: &[Item<K, D>],
        prev_directory: &ItemDirectory<K>,
        next: &[Item<K, D>],
        next_directory: &ItemDirectory<K>,
    ) -> bool {
        if self
            .selected
            .as_ref()
            .is_some_and(|k| !next_directory.contains(k))
        {
            self.selected = None;
        }
        if let Some(pending) = &self.pending {
            if pending
                .target
                .as_ref()
                .is_some_and(|k| !next_directory.contains(k))
            {
                self.pending = None;
            }
        }

        let Some(focused) = &self.focused else {
            return false;
        };
        if next_directory.contains(focused) {
            return false;
        }

        let replacement = prev_directory.index_of(focused).and_then(|old| {
            // First surviving item after the removed one marks where it used to be.
            let anchor = prev[old + 1..]
                .iter()
                .find_map(|item| next_directory.index_of(&item.key))
                .unwrap_or(next.len());
            (anchor..next.len())
                .find(|&i| next[i].is_navigable)
                .or_else(|| (0..anchor).rev().find(|&i| next[i].is_navigable))
        });

        self.focused = replacement.map(|i| next[i].key.clone());
        self.pending = None;
        true
    }
}

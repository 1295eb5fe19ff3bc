use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::CellId;
use crate::key::{KeyMap, ListKey};

/// Default number of recycled cells kept around for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 50;

/// A renderable slot bound to at most one item at a time.
#[derive(Clone, Debug)]
pub struct Cell<K> {
    id: CellId,
    item_key: Option<K>,
    item_index: Option<usize>,
    template: Option<String>,
    is_extent_constant: bool,
    extent: u32,
    offset: i64,
    is_visible: bool,
    should_update: bool,
    animate: bool,
}

impl<K> Cell<K> {
    /// The cell's virtual key.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// The item this cell rendered last (kept while the cell sits in the recycle queue).
    pub fn item_key(&self) -> Option<&K> {
        self.item_key.as_ref()
    }

    /// Index of the item the cell is bound to; `None` while recycled.
    pub fn item_index(&self) -> Option<usize> {
        self.item_index
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn is_extent_constant(&self) -> bool {
        self.is_extent_constant
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    /// Painted position along the scroll axis.
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    /// Whether the cell's content must be rendered again on the next paint.
    pub fn should_update(&self) -> bool {
        self.should_update
    }

    /// Whether the next paint should animate the cell to its new offset.
    pub fn animate(&self) -> bool {
        self.animate
    }

    fn place(&mut self, req: &CellRequest<'_, K>) -> bool {
        let moved = self.offset != req.offset;
        let changed = moved
            || self.extent != req.extent
            || self.is_visible != req.visible
            || self.item_index != Some(req.index);
        if moved && req.animate && self.is_visible && req.visible {
            self.animate = true;
        }
        self.item_index = Some(req.index);
        self.extent = req.extent;
        self.offset = req.offset;
        self.is_visible = req.visible;
        changed
    }
}

/// Everything [`CellPool::allocate`] needs to place an item.
#[derive(Clone, Copy, Debug)]
pub struct CellRequest<'a, K> {
    pub key: &'a K,
    pub template: Option<&'a str>,
    pub index: usize,
    pub is_extent_constant: bool,
    pub extent: u32,
    pub offset: i64,
    pub visible: bool,
    /// Flag offset changes of visible cells for animation.
    pub animate: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolStats {
    pub active: usize,
    pub recycled: usize,
    /// Cells created since the pool was built.
    pub created: u64,
    /// Allocations served from the recycle queue.
    pub reused: u64,
}

/// Allocates cells for items and recycles them by template.
///
/// Only cells with a template and a constant extent are recycled; anything else is dropped as
/// soon as its item leaves the render block. The recycle queue is bounded by `capacity` and
/// evicts its oldest entry first.
#[derive(Clone, Debug)]
pub struct CellPool<K> {
    active: KeyMap<K, Cell<K>>,
    recycled: VecDeque<Cell<K>>,
    capacity: usize,
    next_id: u64,
    created: u64,
    reused: u64,
    dirty: bool,
}

impl<K: ListKey> CellPool<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            active: KeyMap::default(),
            recycled: VecDeque::new(),
            capacity,
            next_id: 0,
            created: 0,
            reused: 0,
            dirty: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the recycle capacity, evicting the oldest recycled cells that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict_overflow();
    }

    /// Places the item `req.key`, reusing its active cell, a recycled cell of the same template,
    /// or a new cell, in that order.
    pub fn allocate(&mut self, req: CellRequest<'_, K>) -> CellId {
        if let Some(cell) = self.active.get_mut(req.key) {
            let same_shape = cell.template.as_deref() == req.template
                && cell.is_extent_constant == req.is_extent_constant;
            if !same_shape {
                vwarn!(
                    cell = cell.id.0,
                    "CellPool::allocate: template/extent constancy changed for an active cell"
                );
            }
            debug_assert!(
                same_shape,
                "active cell {} changed template or extent constancy",
                cell.id.0
            );
            if cell.place(&req) {
                self.dirty = true;
            }
            return cell.id;
        }

        let mut cell = match self.take_recycled(&req) {
            Some(cell) => {
                self.reused += 1;
                vtrace!(cell = cell.id.0, index = req.index, "CellPool: reusing cell");
                cell
            }
            None => {
                let id = CellId(self.next_id);
                self.next_id += 1;
                self.created += 1;
                vtrace!(cell = id.0, index = req.index, "CellPool: new cell");
                Cell {
                    id,
                    item_key: None,
                    item_index: None,
                    template: req.template.map(String::from),
                    is_extent_constant: req.is_extent_constant,
                    extent: 0,
                    offset: 0,
                    is_visible: false,
                    should_update: true,
                    animate: false,
                }
            }
        };

        cell.item_key = Some(req.key.clone());
        cell.item_index = Some(req.index);
        cell.extent = req.extent;
        cell.offset = req.offset;
        cell.is_visible = req.visible;
        cell.should_update = true;
        cell.animate = false;
        self.dirty = true;

        let id = cell.id;
        self.active.insert(req.key.clone(), cell);
        id
    }

    fn take_recycled(&mut self, req: &CellRequest<'_, K>) -> Option<Cell<K>> {
        let template = req.template?;
        if !req.is_extent_constant {
            return None;
        }
        let exact = self.recycled.iter().position(|c| {
            c.template.as_deref() == Some(template)
                && c.item_key.as_ref() == Some(req.key)
                && c.extent == req.extent
        });
        let pos = exact.or_else(|| {
            self.recycled
                .iter()
                .position(|c| c.template.as_deref() == Some(template))
        })?;
        self.recycled.remove(pos)
    }

    /// Releases the active cell of `key`.
    ///
    /// Returns the id of the released cell, if there was one.
    pub fn recycle(&mut self, key: &K) -> Option<CellId> {
        let mut cell = self.active.remove(key)?;
        let id = cell.id;
        self.dirty = true;
        if self.capacity > 0 && cell.template.is_some() && cell.is_extent_constant {
            cell.item_index = None;
            cell.is_visible = false;
            cell.should_update = false;
            cell.animate = false;
            self.recycled.push_back(cell);
            self.evict_overflow();
        }
        Some(id)
    }

    /// Drops the active cell of `key` without recycling it.
    pub fn discard(&mut self, key: &K) -> Option<CellId> {
        let cell = self.active.remove(key)?;
        self.dirty = true;
        Some(cell.id)
    }

    fn evict_overflow(&mut self) {
        while self.recycled.len() > self.capacity {
            self.recycled.pop_front();
            self.dirty = true;
        }
    }

    pub fn active(&self, key: &K) -> Option<&Cell<K>> {
        self.active.get(key)
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn recycled_len(&self) -> usize {
        self.recycled.len()
    }

    pub fn active_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.active.keys()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active.len(),
            recycled: self.recycled.len(),
            created: self.created,
            reused: self.reused,
        }
    }

    /// Marks the content of `key`'s active cell stale.
    pub fn mark_should_update(&mut self, key: &K) {
        if let Some(cell) = self.active.get_mut(key) {
            if !cell.should_update {
                cell.should_update = true;
                self.dirty = true;
            }
        }
    }

    /// Marks every active cell stale (cross-axis resize).
    pub fn invalidate_all(&mut self) {
        for cell in self.active.values_mut() {
            cell.should_update = true;
            self.dirty = true;
        }
    }

    /// Makes every active cell visible.
    pub fn reveal_all(&mut self) {
        for cell in self.active.values_mut() {
            if !cell.is_visible {
                cell.is_visible = true;
                self.dirty = true;
            }
        }
    }

    /// Clears per-paint flags once a frame has been handed to the host.
    pub fn clear_render_flags(&mut self) {
        for cell in self.active.values_mut() {
            cell.should_update = false;
            cell.animate = false;
        }
    }

    /// Drops pending animation flags; the next paint snaps cells to their offsets.
    pub fn cancel_animations(&mut self) {
        for cell in self.active.values_mut() {
            cell.animate = false;
        }
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        core::mem::replace(&mut self.dirty, false)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Every mounted cell (active and recycled), ordered by id.
    ///
    /// Id order is stable across paints no matter how items move, which keeps the host's
    /// reconciliation cheap.
    pub fn sorted_cells(&self) -> Vec<&Cell<K>> {
        let mut out: Vec<&Cell<K>> = self.active.values().chain(self.recycled.iter()).collect();
        out.sort_unstable_by_key(|c| c.id);
        out
    }
}

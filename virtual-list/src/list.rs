use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::directory::{ItemDirectory, ListDiff};
use crate::fenwick::Fenwick;
use crate::focus::{FocusContext, FocusPlan, PendingFocus};
use crate::key::ListKey;
use crate::options::Margins;
use crate::pool::{self, CellPool, CellRequest, PoolStats};
use crate::{
    Align, CellFrame, CellId, CorrectionReconciler, FocusChange, FocusDirection, FocusNavigator,
    FocusSource, Item, ListFrame, ListOptions, ListState, NavKey, Rect, RenderBlock,
    ScrollRequest, SizeOracle,
};

/// A headless virtualized list.
///
/// The list owns the item vector and decides which items get a cell: the render block is the
/// viewport plus an overdraw margin on both sides, grown one item at a time and culled once items
/// drift past the cull margin. Items whose extent is unknown up front are rendered with a guess
/// and measured by the host; corrections above the viewport are absorbed by a pending adjustment
/// instead of moving visible content.
///
/// The host drives it in two phases:
/// 1. Report events (`set_items`, `on_layout`, `on_scroll`, `on_item_layout`, focus moves). Each
///    runs one synchronous pass and may raise [`Self::needs_paint`].
/// 2. Take a frame ([`Self::take_frame`]), paint it, then call [`Self::settle`], which flushes
///    corrections, finishes the initial fill and retries a pending focus move.
///
/// For a substrate-driven host loop, see the `virtual-list-adapter` crate.
#[derive(Clone, Debug)]
pub struct VirtualList<K, D = ()> {
    options: ListOptions<K, D>,
    items: Vec<Item<K, D>>,
    directory: ItemDirectory<K>,
    oracle: SizeOracle<K>,

    extents: Vec<u32>, // assumed extent per index
    sums: Fenwick,
    block: RenderBlock,
    pool: CellPool<K>,
    reconciler: CorrectionReconciler,
    focus: FocusNavigator<K>,

    viewport: Rect,
    scroll_offset: u64,
    margins: Margins,
    initial_fill_complete: bool,
    screen_reader_active: bool,
    needs_paint: bool,
    scroll_request: Option<ScrollRequest>,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl<K: ListKey, D: PartialEq> VirtualList<K, D> {
    /// Creates an empty list; feed it with [`Self::set_items`] and [`Self::on_layout`].
    pub fn new(options: ListOptions<K, D>) -> Self {
        vdebug!(
            axis = ?options.axis,
            skip_unchanged = options.skip_render_if_item_unchanged,
            pool_capacity = options.pool_capacity,
            "VirtualList::new"
        );
        Self {
            items: Vec::new(),
            directory: ItemDirectory::new(),
            oracle: SizeOracle::new(),
            extents: Vec::new(),
            sums: Fenwick::from_extents(&[]),
            block: RenderBlock::default(),
            pool: CellPool::new(options.pool_capacity),
            reconciler: CorrectionReconciler::new(options.correction_tolerance),
            focus: FocusNavigator::new(options.initial_selected_key.clone()),
            viewport: Rect::default(),
            scroll_offset: 0,
            margins: options.overdraw_policy().margins(0),
            initial_fill_complete: false,
            screen_reader_active: false,
            needs_paint: false,
            scroll_request: None,
            options,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    /// Creates a list and sets its items in one go.
    pub fn with_items(options: ListOptions<K, D>, items: Vec<Item<K, D>>) -> Self {
        let mut list = Self::new(options);
        list.set_items(items);
        list
    }

    pub fn options(&self) -> &ListOptions<K, D> {
        &self.options
    }

    pub fn set_options(&mut self, options: ListOptions<K, D>) {
        self.options = options;
        vtrace!(
            skip_unchanged = self.options.skip_render_if_item_unchanged,
            pool_capacity = self.options.pool_capacity,
            "VirtualList::set_options"
        );
        self.margins = self.options.overdraw_policy().margins(self.viewport.main);
        self.reconciler
            .set_tolerance(self.options.correction_tolerance);
        self.pool.set_capacity(self.effective_pool_capacity());
        self.update_render_block(false);
        self.notify_if_needed();
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut ListOptions<K, D>)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn set_on_change(
        &mut self,
        on_change: Option<impl Fn(&VirtualList<K, D>) + Send + Sync + 'static>,
    ) {
        self.options.on_change = on_change.map(|f| Arc::new(f) as _);
    }

    pub fn set_on_focus_change(
        &mut self,
        on_focus_change: Option<impl Fn(Option<&K>) + Send + Sync + 'static>,
    ) {
        self.options.on_focus_change = on_focus_change.map(|f| Arc::new(f) as _);
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    fn notify_if_needed(&self) {
        if self.needs_paint {
            self.notify();
        }
    }

    /// Batches multiple updates into a single `on_change` notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    fn fire_focus_change(&self) {
        if let Some(cb) = &self.options.on_focus_change {
            cb(self.focus.focused());
        }
    }

    pub fn items(&self) -> &[Item<K, D>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.directory.index_of(key)
    }

    /// Replaces the item list.
    ///
    /// Items are matched to the previous list by key. Deleted items lose their cell and cached
    /// extent; retained items keep both and only re-render when they changed (or always, unless
    /// `skip_render_if_item_unchanged` is set).
    ///
    /// # Panics
    ///
    /// Panics if two items share a key.
    pub fn set_items(&mut self, items: Vec<Item<K, D>>) {
        let directory = match ItemDirectory::build(&items) {
            Ok(directory) => directory,
            Err(err) => panic!("VirtualList::set_items: {err}"),
        };
        let diff = ListDiff::compute(
            &self.items,
            &self.directory,
            &items,
            &directory,
            self.options.skip_render_if_item_unchanged,
        );
        vdebug!(
            count = items.len(),
            added = diff.added.len(),
            removed = diff.removed.len(),
            changed = diff.changed.len(),
            moved = diff.moved.len(),
            "VirtualList::set_items"
        );

        for &old in &diff.removed {
            let key = &self.items[old].key;
            if let Some(id) = self.pool.recycle(key) {
                self.reconciler.end_animation(id);
            }
            self.oracle.forget(key);
        }
        for &(old, _) in &diff.reshaped {
            let key = &self.items[old].key;
            if let Some(id) = self.pool.discard(key) {
                self.reconciler.end_animation(id);
            }
            self.oracle.forget(key);
        }
        for &new in &diff.changed {
            self.pool.mark_should_update(&items[new].key);
        }

        let focus_changed =
            self.focus
                .on_items_changed(&self.items, &self.directory, &items, &directory);

        self.items = items;
        self.directory = directory;
        self.rebuild_extents();
        if (self.sums.total() as i64 + self.reconciler.pending()) < 0 {
            // The items the adjustment compensated for are gone.
            self.reconciler.take();
        }
        self.update_render_block(true);

        if focus_changed {
            self.fire_focus_change();
        }
        self.notify_if_needed();
    }

    fn rebuild_extents(&mut self) {
        self.extents.clear();
        self.extents
            .extend(self.items.iter().map(|item| self.oracle.peek_extent(item)));
        self.sums = Fenwick::from_extents(&self.extents);
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Reports the viewport geometry.
    ///
    /// A change along the scroll axis recomputes the margins and the render block; a change
    /// across it only asks every cell to render again.
    pub fn on_layout(&mut self, rect: Rect) {
        if rect == self.viewport {
            return;
        }
        let prev = core::mem::replace(&mut self.viewport, rect);
        vtrace!(main = rect.main, cross = rect.cross, "VirtualList::on_layout");

        if rect.cross != prev.cross {
            self.pool.invalidate_all();
        }
        if rect.main != prev.main {
            self.margins = self.options.overdraw_policy().margins(rect.main);
            self.update_render_block(false);
            self.reconcile_corrections();
        }
        if self.pool.take_dirty() {
            self.needs_paint = true;
        }
        self.notify_if_needed();
    }

    /// Like [`Self::on_layout`], from platform width and height.
    pub fn on_layout_size(&mut self, width: u32, height: u32) {
        self.on_layout(self.options.axis.rect(width, height));
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    /// Reports the container's scroll offset. Repeating the current offset is a no-op.
    pub fn on_scroll(&mut self, offset: u64) {
        if offset == self.scroll_offset {
            return;
        }
        vtrace!(offset, "VirtualList::on_scroll");
        self.scroll_offset = offset;
        self.update_render_block(false);
        if offset == 0 {
            self.reconcile_corrections();
        }
        self.notify_if_needed();
    }

    /// Reports the laid-out extent of the item `key` rendered by `cell`.
    ///
    /// Callbacks that no longer match the current state (unknown key, cell released or reused
    /// for another item, constant-extent item) are ignored.
    pub fn on_item_layout(&mut self, cell: CellId, key: &K, extent: u32) {
        let Some(index) = self.directory.index_of(key) else {
            vtrace!(cell = cell.0, "on_item_layout: unknown key");
            return;
        };
        match self.pool.active(key) {
            Some(active) if active.id() == cell => {}
            _ => {
                vtrace!(cell = cell.0, index, "on_item_layout: stale cell");
                return;
            }
        }
        let item = &self.items[index];
        if item.is_extent_constant() {
            vtrace!(cell = cell.0, index, "on_item_layout: constant extent");
            return;
        }
        debug_assert!(self.block.contains(index), "active cell outside the block");

        let was_pending = self.oracle.is_pending(key);
        let first_visible = self.first_visible_index();
        let delta = self.oracle.record_measurement(item, extent);
        vtrace!(index, extent, delta, "VirtualList::on_item_layout");

        if delta == 0 {
            if was_pending {
                // Known now: the cell may become visible and growth may resume.
                self.update_render_block(false);
            }
            self.notify_if_needed();
            return;
        }

        self.extents[index] = extent;
        self.sums.add(index, delta);
        self.block.resize_in_block(delta);

        if self.initial_fill_complete && first_visible.is_some_and(|first| index < first) {
            self.reconciler.accumulate(-delta);
            self.layout_cells();
        } else {
            self.update_render_block(false);
        }
        self.notify_if_needed();
    }

    /// Runs after the host painted a frame.
    ///
    /// Continues growth paced by pending measurements, flushes the pending adjustment when it
    /// is safe, completes the initial fill and retries a pending focus move once. Returns
    /// whether another paint is needed.
    pub fn settle(&mut self) -> bool {
        self.batch_update(|list| {
            list.update_render_block(false);
            list.reconcile_corrections();
            // The first screen must have been laid out before overdraw kicks in.
            if !list.initial_fill_complete
                && !list.block.is_empty()
                && list.oracle.pending_len() == 0
                && !list.needs_paint
            {
                list.complete_initial_fill();
            }
            list.retry_pending_focus();
            list.notify_if_needed();
        });
        self.needs_paint
    }

    fn complete_initial_fill(&mut self) {
        vdebug!(
            cells = self.pool.active_len(),
            "VirtualList: initial fill complete"
        );
        self.initial_fill_complete = true;
        self.pool.reveal_all();
        self.margins = self.options.overdraw_policy().margins(self.viewport.main);
        self.update_render_block(false);
    }

    pub fn is_initial_fill_complete(&self) -> bool {
        self.initial_fill_complete
    }

    pub fn needs_paint(&self) -> bool {
        self.needs_paint
    }

    /// Builds the frame to paint without consuming the paint request.
    pub fn frame(&self) -> ListFrame<K> {
        ListFrame {
            content_extent: self.content_extent(),
            cells: self.collect_cells(),
        }
    }

    /// Builds the frame to paint and clears the per-paint flags.
    ///
    /// Cells flagged `animate` are tracked until [`Self::on_animation_complete`]; corrections
    /// wait for them.
    pub fn take_frame(&mut self) -> ListFrame<K> {
        let frame = self.frame();
        for cell in frame.cells.iter().filter(|c| c.animate) {
            self.reconciler.begin_animation(cell.id);
        }
        self.pool.clear_render_flags();
        self.needs_paint = false;
        frame
    }

    fn collect_cells(&self) -> Vec<CellFrame<K>> {
        self.pool
            .sorted_cells()
            .into_iter()
            .map(|cell| {
                let needs_measure = cell.item_index().is_some_and(|i| {
                    let item = &self.items[i];
                    item.measure_extent && (!self.oracle.is_known(item) || cell.should_update())
                });
                CellFrame {
                    id: cell.id(),
                    item_key: cell.item_key().cloned(),
                    item_index: cell.item_index(),
                    template: cell.template().map(String::from),
                    offset: cell.offset(),
                    extent: cell.extent(),
                    is_visible: cell.is_visible(),
                    should_update: cell.should_update(),
                    animate: cell.animate(),
                    needs_measure,
                }
            })
            .collect()
    }

    /// Reports that the offset animation of `cell` finished.
    ///
    /// Returns `true` when it was the last animation in flight; corrections are flushed by the
    /// next [`Self::settle`].
    pub fn on_animation_complete(&mut self, cell: CellId) -> bool {
        self.reconciler.end_animation(cell) && self.reconciler.animations_in_flight() == 0
    }

    pub fn animations_in_flight(&self) -> usize {
        self.reconciler.animations_in_flight()
    }

    /// Returns the scroll position the host should apply, if any.
    pub fn take_scroll_request(&mut self) -> Option<ScrollRequest> {
        self.scroll_request.take()
    }

    pub fn scroll_request(&self) -> Option<ScrollRequest> {
        self.scroll_request
    }

    /// Flushes the pending adjustment once no animation is in flight.
    ///
    /// Away from the start, the scroll offset moves along with the content so nothing visible
    /// jumps; the new offset is handed to the host as a [`ScrollRequest`].
    fn reconcile_corrections(&mut self) -> bool {
        if !self.reconciler.should_flush(self.scroll_offset == 0) {
            return false;
        }
        let adjustment = self.reconciler.take();
        // At the start there is nothing to keep in place: content snaps to its true position.
        let compensated = if self.scroll_offset == 0 {
            0
        } else {
            (self.scroll_offset as i64 - adjustment).max(0) as u64
        };
        vdebug!(
            adjustment,
            scroll_offset = compensated,
            "VirtualList: flushing correction"
        );
        if compensated != self.scroll_offset {
            self.scroll_offset = compensated;
            self.scroll_request = Some(ScrollRequest {
                offset: compensated,
                animated: false,
            });
        }
        self.update_render_block(false);
        // The shift is matched by the scroll compensation: nothing moves on screen.
        self.pool.cancel_animations();
        self.needs_paint = true;
        true
    }

    pub fn pending_adjustment(&self) -> i64 {
        self.reconciler.pending()
    }

    /// One pass of the render block bookkeeping.
    ///
    /// With `rebuild` the block is recomputed from scratch at the current offset; otherwise it
    /// is culled and grown from where it is.
    fn update_render_block(&mut self, rebuild: bool) {
        let count = self.items.len();
        if self.viewport.main == 0 || count == 0 {
            self.block = RenderBlock::empty_at(0, 0, count, self.sums.total());
            self.release_cells_outside_block();
            self.layout_cells();
            return;
        }

        let adjustment = self.reconciler.pending();
        let view_start = self.scroll_offset as i64 - self.options.padding_start as i64;
        let view_end = view_start + self.viewport.main as i64;
        let render = if self.initial_fill_complete {
            self.margins.render as i64
        } else {
            0
        };
        let cull = self.margins.cull as i64;
        let (render_start, render_end) = (view_start - render, view_end + render);
        let (cull_start, cull_end) = (view_start - cull, view_end + cull);

        if rebuild {
            self.reposition(render_start - adjustment);
        } else {
            while !self.block.is_empty() {
                let extent = self.extents[self.block.start()];
                let bottom = self.block.extent_above as i64 + adjustment + extent as i64;
                if bottom > cull_start {
                    break;
                }
                self.block.cull_top(extent);
            }
            while !self.block.is_empty() {
                let extent = self.extents[self.block.end() - 1];
                let end = (self.block.extent_above + self.block.extent_in_block) as i64;
                let top = end + adjustment - extent as i64;
                if top < cull_end {
                    break;
                }
                self.block.cull_bottom(extent);
            }
            if self.block.is_empty() {
                self.reposition(render_start - adjustment);
            }
        }

        let cap = self.options.max_simultaneous_measures.max(1);
        while self.block.items_below > 0 && self.oracle.pending_len() < cap {
            let bottom = (self.block.extent_above + self.block.extent_in_block) as i64 + adjustment;
            if bottom >= render_end {
                break;
            }
            let index = self.block.end();
            self.grow_extent(index);
            self.block.grow_bottom(self.extents[index]);
        }
        while self.block.items_above > 0 && self.oracle.pending_len() < cap {
            let top = self.block.extent_above as i64 + adjustment;
            if top <= render_start {
                break;
            }
            let index = self.block.start() - 1;
            self.grow_extent(index);
            self.block.grow_top(self.extents[index]);
        }

        self.check_block();
        self.release_cells_outside_block();
        self.layout_cells();
    }

    /// Marks the item as pending when its extent is still a guess.
    fn grow_extent(&mut self, index: usize) {
        let extent = self.oracle.extent_of(&self.items[index]);
        debug_assert_eq!(extent, self.extents[index], "extent table out of sync");
    }

    /// Moves the (empty) block right before the item containing `target`.
    fn reposition(&mut self, target: i64) {
        let count = self.items.len();
        let index = if target <= 0 {
            0
        } else {
            self.sums.lower_bound(target as u64).min(count.saturating_sub(1))
        };
        self.block =
            RenderBlock::empty_at(index, self.sums.prefix_sum(index), count, self.sums.total());
        vtrace!(index, "VirtualList: block repositioned");
    }

    fn check_block(&self) {
        let in_sync = self.block.item_count() == self.items.len()
            && self.block.total_extent() == self.sums.total();
        if !in_sync {
            vwarn!(
                items = self.items.len(),
                total = self.sums.total(),
                block = ?self.block,
                "VirtualList: render block out of sync"
            );
        }
        debug_assert!(in_sync, "render block out of sync: {:?}", self.block);
    }

    fn release_cells_outside_block(&mut self) {
        let outside: Vec<K> = self
            .pool
            .active_keys()
            .filter(|key| {
                !self
                    .directory
                    .index_of(key)
                    .is_some_and(|i| self.block.contains(i))
            })
            .cloned()
            .collect();
        for key in outside {
            self.oracle.cancel_pending(&key);
            if let Some(id) = self.pool.recycle(&key) {
                self.reconciler.end_animation(id);
            }
        }
    }

    fn layout_cells(&mut self) {
        let animate = self.options.animate_changes;
        let mut offset = self.options.padding_start as i64
            + self.block.extent_above as i64
            + self.reconciler.pending();
        for index in self.block.range() {
            let item = &self.items[index];
            let extent = self.extents[index];
            let visible = self.oracle.is_known(item)
                && (self.initial_fill_complete || item.is_extent_constant());
            self.pool.allocate(CellRequest {
                key: &item.key,
                template: item.template.as_deref(),
                index,
                is_extent_constant: item.is_extent_constant(),
                extent,
                offset,
                visible,
                animate,
            });
            offset += extent as i64;
        }
        if self.pool.take_dirty() {
            self.needs_paint = true;
        }
    }

    fn first_visible_index(&self) -> Option<usize> {
        let view_start = self.scroll_offset as i64 - self.options.padding_start as i64;
        let mut top = self.block.extent_above as i64 + self.reconciler.pending();
        for index in self.block.range() {
            let bottom = top + self.extents[index] as i64;
            if bottom > view_start {
                return Some(index);
            }
            top = bottom;
        }
        None
    }

    pub fn render_block(&self) -> RenderBlock {
        self.block
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Extent of the scrollable content: paddings plus item extents plus the pending adjustment.
    pub fn content_extent(&self) -> u64 {
        let items = (self.sums.total() as i64 + self.reconciler.pending()).max(0) as u64;
        (self.options.padding_start as u64)
            .saturating_add(items)
            .saturating_add(self.options.padding_end as u64)
    }

    /// Painted start of the item at `index`.
    pub fn item_offset(&self, index: usize) -> Option<i64> {
        if index >= self.items.len() {
            return None;
        }
        Some(
            self.options.padding_start as i64
                + self.sums.prefix_sum(index) as i64
                + self.reconciler.pending(),
        )
    }

    /// Currently assumed extent of the item at `index` (measured, declared or guessed).
    pub fn item_extent(&self, index: usize) -> Option<u32> {
        self.extents.get(index).copied()
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.content_extent()
            .saturating_sub(self.viewport.main as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    /// Scroll offset that brings the item at `index` into view with `align`.
    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> u64 {
        self.scroll_offset_for(index, align, 0)
    }

    fn scroll_offset_for(&self, index: usize, align: Align, margin: u32) -> u64 {
        if self.items.is_empty() {
            return 0;
        }
        let index = index.min(self.items.len() - 1);
        let Some(start) = self.item_offset(index) else {
            return 0;
        };
        let extent = self.extents[index] as i64;
        let end = start + extent;
        let margin = margin as i64;
        let view = self.viewport.main as i64;
        let cur = self.scroll_offset as i64;

        let target = match align {
            Align::Start => start - margin,
            Align::End => end + margin - view,
            Align::Center => start + extent / 2 - view / 2,
            Align::Auto => {
                if start - margin >= cur && end + margin <= cur + view {
                    cur
                } else if start - margin < cur {
                    start - margin
                } else {
                    end + margin - view
                }
            }
        };
        self.clamp_scroll_offset(target.max(0) as u64)
    }

    /// Scrolls to `offset` and asks the host to follow.
    ///
    /// The list moves right away; the host reports the same offset back through
    /// [`Self::on_scroll`] once applied, which is then a no-op.
    pub fn scroll_to_offset(&mut self, offset: u64, animated: bool) {
        self.apply_scroll(offset, animated);
        self.notify_if_needed();
    }

    fn apply_scroll(&mut self, offset: u64, animated: bool) {
        let offset = self.clamp_scroll_offset(offset);
        self.scroll_request = Some(ScrollRequest { offset, animated });
        if offset != self.scroll_offset {
            self.scroll_offset = offset;
            self.update_render_block(false);
        }
    }

    pub fn scroll_to_index(&mut self, index: usize, align: Align, animated: bool) {
        let offset = self.scroll_to_index_offset(index, align);
        self.scroll_to_offset(offset, animated);
    }

    fn scroll_index_into_view(&mut self, index: usize) {
        let offset = self.scroll_offset_for(index, Align::Auto, self.options.keyboard_focus_margin);
        if offset != self.scroll_offset {
            self.apply_scroll(offset, false);
        }
    }

    pub fn focused_key(&self) -> Option<&K> {
        self.focus.focused()
    }

    pub fn selected_key(&self) -> Option<&K> {
        self.focus.selected()
    }

    pub fn has_pending_focus(&self) -> bool {
        self.focus.has_pending()
    }

    /// Moves focus to `key` (or clears it). Unknown keys are ignored; returns whether the
    /// focused key changed.
    pub fn set_focused_key(&mut self, key: Option<K>) -> bool {
        if key.as_ref().is_some_and(|k| !self.directory.contains(k)) {
            return false;
        }
        let changed = self.focus.set_focused(key);
        if changed {
            self.fire_focus_change();
        }
        changed
    }

    pub fn set_selected_key(&mut self, key: Option<K>) {
        let key = key.filter(|k| self.directory.contains(k));
        self.focus.set_selected(key);
    }

    fn focus_context(&self) -> FocusContext<'_, K, D> {
        FocusContext {
            items: &self.items,
            directory: &self.directory,
            block: &self.block,
        }
    }

    fn apply_focus(&mut self, index: usize, source: FocusSource) -> K {
        let key = self.items[index].key.clone();
        if self.focus.set_focused(Some(key.clone())) {
            self.fire_focus_change();
        }
        if source == FocusSource::Keyboard {
            self.scroll_index_into_view(index);
        }
        key
    }

    /// Moves focus to the previous or next navigable item.
    ///
    /// When the target is not rendered the list scrolls toward it and returns
    /// [`FocusChange::Pending`]; the move completes during the next [`Self::settle`].
    pub fn focus_adjacent(
        &mut self,
        direction: FocusDirection,
        source: FocusSource,
    ) -> FocusChange<K> {
        let plan = self.focus.plan(&self.focus_context(), direction, false);
        vtrace!(?direction, ?plan, "VirtualList::focus_adjacent");
        let change = match plan {
            FocusPlan::Focus(index) => FocusChange::Focused(self.apply_focus(index, source)),
            FocusPlan::ScrollTo { index, target } => {
                let target = target.map(|i| self.items[i].key.clone());
                self.scroll_index_into_view(index);
                self.focus.set_pending(PendingFocus {
                    direction,
                    source,
                    target,
                });
                FocusChange::Pending
            }
            FocusPlan::Stay => FocusChange::Unchanged,
        };
        self.notify_if_needed();
        change
    }

    /// Moves focus to the first (`Up`) or last (`Down`) navigable item.
    pub fn focus_edge(&mut self, edge: FocusDirection, source: FocusSource) -> FocusChange<K> {
        let Some(index) = self.focus_context().edge_navigable(edge) else {
            return FocusChange::Unchanged;
        };
        let change = if self.block.contains(index) {
            FocusChange::Focused(self.apply_focus(index, source))
        } else {
            let target = self.items[index].key.clone();
            self.scroll_index_into_view(index);
            self.focus.set_pending(PendingFocus {
                direction: edge,
                source,
                target: Some(target),
            });
            FocusChange::Pending
        };
        self.notify_if_needed();
        change
    }

    /// Handles a navigation key as a keyboard focus move.
    pub fn handle_key(&mut self, key: NavKey) -> FocusChange<K> {
        match key {
            NavKey::Home => self.focus_edge(FocusDirection::Up, FocusSource::Keyboard),
            NavKey::End => self.focus_edge(FocusDirection::Down, FocusSource::Keyboard),
            _ => match FocusDirection::from_key(self.options.axis, key) {
                Some(direction) => self.focus_adjacent(direction, FocusSource::Keyboard),
                None => FocusChange::Unchanged,
            },
        }
    }

    fn retry_pending_focus(&mut self) {
        let Some(pending) = self.focus.take_pending() else {
            return;
        };
        match pending.target {
            Some(key) => match self.directory.index_of(&key) {
                Some(index) if self.block.contains(index) => {
                    self.apply_focus(index, pending.source);
                }
                _ => {
                    vtrace!("pending focus target still not rendered");
                }
            },
            None => {
                let plan = self.focus.plan(&self.focus_context(), pending.direction, true);
                if let FocusPlan::Focus(index) = plan {
                    self.apply_focus(index, pending.source);
                }
            }
        }
    }

    pub fn screen_reader_active(&self) -> bool {
        self.screen_reader_active
    }

    /// Reports screen reader state; recycling is turned off while one is active (if
    /// configured), keeping the reading order stable.
    pub fn set_screen_reader_active(&mut self, active: bool) {
        if self.screen_reader_active == active {
            return;
        }
        self.screen_reader_active = active;
        self.pool.set_capacity(self.effective_pool_capacity());
        vdebug!(
            active,
            capacity = self.pool.capacity(),
            "VirtualList::set_screen_reader_active"
        );
        if self.pool.take_dirty() {
            self.needs_paint = true;
        }
        self.notify_if_needed();
    }

    fn effective_pool_capacity(&self) -> usize {
        if self.screen_reader_active && self.options.disable_recycling_with_screen_reader {
            0
        } else {
            self.options.pool_capacity
        }
    }

    pub fn cell_for(&self, key: &K) -> Option<&pool::Cell<K>> {
        self.pool.active(key)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pending_measurements(&self) -> usize {
        self.oracle.pending_len()
    }

    pub fn cached_extent(&self, key: &K) -> Option<u32> {
        self.oracle.cached(key)
    }

    pub fn extent_cache_len(&self) -> usize {
        self.oracle.cache_len()
    }

    pub fn for_each_cached_extent(&self, f: impl FnMut(&K, u32)) {
        self.oracle.for_each_cached(f);
    }

    pub fn export_extent_cache(&self) -> Vec<(K, u32)> {
        let mut out = Vec::with_capacity(self.oracle.cache_len());
        self.oracle.for_each_cached(|k, v| out.push((k.clone(), v)));
        out
    }

    /// Seeds the extent cache; entries for keys not in the list are kept for later.
    pub fn import_extent_cache(&mut self, entries: impl IntoIterator<Item = (K, u32)>) {
        let mut n = 0usize;
        for (key, extent) in entries {
            self.oracle.insert(key, extent);
            n = n.saturating_add(1);
        }
        vdebug!(entries = n, "import_extent_cache");
        self.rebuild_extents();
        self.update_render_block(true);
        self.notify_if_needed();
    }

    /// Drops every cached measurement and starts measuring again.
    pub fn reset_measurements(&mut self) {
        self.oracle.clear();
        self.rebuild_extents();
        self.update_render_block(true);
        self.notify_if_needed();
    }

    pub fn snapshot(&self) -> ListState {
        ListState {
            viewport: self.viewport,
            scroll_offset: self.scroll_offset,
            block: self.block,
            pending_adjustment: self.reconciler.pending(),
            initial_fill_complete: self.initial_fill_complete,
        }
    }
}

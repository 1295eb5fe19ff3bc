use core::ops::Range;

/// The `[above, in, below]` partition of the item list.
///
/// Items in the block own a cell; the regions around it are only tracked by count and cumulative
/// extent. The block is always a contiguous index range and the three regions always cover the
/// whole list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderBlock {
    pub items_above: usize,
    pub items_in_block: usize,
    pub items_below: usize,
    pub extent_above: u64,
    pub extent_in_block: u64,
    pub extent_below: u64,
}

impl RenderBlock {
    /// An empty block sitting right before `index`.
    ///
    /// `extent_before` is the summed extent of items `0..index`, `total` the summed extent of all
    /// `count` items.
    pub(crate) fn empty_at(index: usize, extent_before: u64, count: usize, total: u64) -> Self {
        debug_assert!(index <= count, "block start out of bounds ({index} > {count})");
        Self {
            items_above: index,
            items_in_block: 0,
            items_below: count.saturating_sub(index),
            extent_above: extent_before,
            extent_in_block: 0,
            extent_below: total.saturating_sub(extent_before),
        }
    }

    pub fn item_count(&self) -> usize {
        self.items_above + self.items_in_block + self.items_below
    }

    pub fn total_extent(&self) -> u64 {
        self.extent_above + self.extent_in_block + self.extent_below
    }

    /// Index of the first item in the block.
    pub fn start(&self) -> usize {
        self.items_above
    }

    /// One past the last item in the block.
    pub fn end(&self) -> usize {
        self.items_above + self.items_in_block
    }

    pub fn range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.items_in_block == 0
    }

    /// Moves the first item below the block into it.
    pub(crate) fn grow_bottom(&mut self, extent: u32) {
        debug_assert!(self.items_below > 0, "grow_bottom with nothing below");
        self.items_below -= 1;
        self.items_in_block += 1;
        self.extent_below = self.extent_below.saturating_sub(extent as u64);
        self.extent_in_block += extent as u64;
    }

    /// Moves the last item above the block into it.
    pub(crate) fn grow_top(&mut self, extent: u32) {
        debug_assert!(self.items_above > 0, "grow_top with nothing above");
        self.items_above -= 1;
        self.items_in_block += 1;
        self.extent_above = self.extent_above.saturating_sub(extent as u64);
        self.extent_in_block += extent as u64;
    }

    /// Moves the first item of the block to the region above.
    pub(crate) fn cull_top(&mut self, extent: u32) {
        debug_assert!(self.items_in_block > 0, "cull_top on an empty block");
        self.items_in_block -= 1;
        self.items_above += 1;
        self.extent_in_block = self.extent_in_block.saturating_sub(extent as u64);
        self.extent_above += extent as u64;
    }

    /// Moves the last item of the block to the region below.
    pub(crate) fn cull_bottom(&mut self, extent: u32) {
        debug_assert!(self.items_in_block > 0, "cull_bottom on an empty block");
        self.items_in_block -= 1;
        self.items_below += 1;
        self.extent_in_block = self.extent_in_block.saturating_sub(extent as u64);
        self.extent_below += extent as u64;
    }

    /// Applies a measured change of an in-block item.
    pub(crate) fn resize_in_block(&mut self, delta: i64) {
        if delta >= 0 {
            self.extent_in_block = self.extent_in_block.saturating_add(delta as u64);
        } else {
            self.extent_in_block = self.extent_in_block.saturating_sub(delta.unsigned_abs());
        }
    }
}

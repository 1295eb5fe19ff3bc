use alloc::string::String;
use alloc::vec::Vec;

use crate::{CellId, Rect, RenderBlock};

/// One mounted cell as the host should paint it.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellFrame<K> {
    pub id: CellId,
    /// The item rendered by the cell. Recycled cells keep their last item here.
    pub item_key: Option<K>,
    /// `None` while the cell waits in the recycle queue.
    pub item_index: Option<usize>,
    pub template: Option<String>,
    /// Painted position along the scroll axis, relative to the content origin.
    pub offset: i64,
    pub extent: u32,
    pub is_visible: bool,
    /// The cell's content must be rendered again.
    pub should_update: bool,
    /// The move to `offset` should be animated.
    pub animate: bool,
    /// The host should report the cell's laid-out extent via
    /// [`crate::VirtualList::on_item_layout`] after painting.
    pub needs_measure: bool,
}

impl<K> CellFrame<K> {
    pub fn is_recycled(&self) -> bool {
        self.item_index.is_none()
    }

    pub fn end(&self) -> i64 {
        self.offset + self.extent as i64
    }
}

/// Everything the host needs to paint the list once.
///
/// Cells are sorted by id, which keeps them in a stable order regardless of scrolling.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListFrame<K> {
    /// Extent of the scrollable content, paddings included.
    pub content_extent: u64,
    pub cells: Vec<CellFrame<K>>,
}

impl<K> ListFrame<K> {
    pub fn cell(&self, id: CellId) -> Option<&CellFrame<K>> {
        self.cells
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &self.cells[i])
    }

    pub fn visible_cells(&self) -> impl Iterator<Item = &CellFrame<K>> + '_ {
        self.cells.iter().filter(|c| c.is_visible)
    }
}

/// A lightweight, serializable snapshot of the list's layout state.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListState {
    pub viewport: Rect,
    pub scroll_offset: u64,
    pub block: RenderBlock,
    pub pending_adjustment: i64,
    pub initial_fill_complete: bool,
}

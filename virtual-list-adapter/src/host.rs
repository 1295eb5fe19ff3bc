use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;

use virtual_list::{CellId, FocusChange, Item, ListKey, NavKey, Rect, VirtualList};

use crate::{Animator, Substrate};

/// Upper bound on paints performed by a single [`ListHost::pump`].
pub const DEFAULT_MAX_PAINTS_PER_PUMP: usize = 8;

/// Renders one item into substrate content.
pub type RenderFn<K, D, C> = Arc<dyn Fn(&Item<K, D>) -> C + Send + Sync>;

#[derive(Clone, Debug)]
struct MountedCell<K> {
    key: Option<K>,
    /// Target offset from the last frame (an animation may still be on its way there).
    offset: i64,
    extent: u32,
    visible: bool,
}

/// Drives a [`VirtualList`] against a [`Substrate`].
///
/// Host events are forwarded to the list as they arrive. [`Self::pump`] then paints pending
/// frames and settles the list until it is quiet; [`Self::tick`] advances cell animations.
pub struct ListHost<K, D, S: Substrate> {
    list: VirtualList<K, D>,
    substrate: S,
    render: RenderFn<K, D, S::Content>,
    animator: Animator,
    mounted: BTreeMap<CellId, MountedCell<K>>,
    max_paints_per_pump: usize,
}

impl<K: ListKey, D: PartialEq, S: Substrate> ListHost<K, D, S> {
    pub fn new(
        list: VirtualList<K, D>,
        mut substrate: S,
        render: impl Fn(&Item<K, D>) -> S::Content + Send + Sync + 'static,
    ) -> Self {
        substrate.create_scroll_container(list.options().axis);
        Self {
            list,
            substrate,
            render: Arc::new(render),
            animator: Animator::default(),
            mounted: BTreeMap::new(),
            max_paints_per_pump: DEFAULT_MAX_PAINTS_PER_PUMP,
        }
    }

    pub fn with_animator(mut self, animator: Animator) -> Self {
        self.animator = animator;
        self
    }

    pub fn with_max_paints_per_pump(mut self, max: usize) -> Self {
        self.max_paints_per_pump = max.max(1);
        self
    }

    pub fn list(&self) -> &VirtualList<K, D> {
        &self.list
    }

    /// Direct access to the list. Changes made here are painted by the next [`Self::pump`].
    pub fn list_mut(&mut self) -> &mut VirtualList<K, D> {
        &mut self.list
    }

    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    pub fn substrate_mut(&mut self) -> &mut S {
        &mut self.substrate
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn into_parts(self) -> (VirtualList<K, D>, S) {
        (self.list, self.substrate)
    }

    /// Number of cells currently mounted on the substrate.
    pub fn mounted_len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_mounted(&self, cell: CellId) -> bool {
        self.mounted.contains_key(&cell)
    }

    pub fn set_items(&mut self, items: Vec<Item<K, D>>) {
        self.list.set_items(items);
    }

    pub fn on_layout(&mut self, rect: Rect) {
        self.list.on_layout(rect);
    }

    pub fn on_layout_size(&mut self, width: u32, height: u32) {
        self.list.on_layout_size(width, height);
    }

    pub fn on_scroll(&mut self, offset: u64) {
        self.list.on_scroll(offset);
    }

    pub fn set_screen_reader_active(&mut self, active: bool) {
        self.list.set_screen_reader_active(active);
    }

    /// Reports the laid-out extent of a mounted cell, in answer to
    /// [`Substrate::request_measure`].
    ///
    /// Returns `false` when the cell is no longer mounted.
    pub fn on_cell_measured(&mut self, cell: CellId, extent: u32) -> bool {
        let Some(key) = self.mounted.get(&cell).and_then(|m| m.key.clone()) else {
            vtrace!(cell = cell.0, "ListHost::on_cell_measured: cell not mounted");
            return false;
        };
        self.list.on_item_layout(cell, &key, extent);
        true
    }

    pub fn on_key(&mut self, key: NavKey) -> FocusChange<K> {
        self.list.handle_key(key)
    }

    /// Paints and settles until the list is quiet (or the paint budget runs out).
    ///
    /// Returns the number of frames painted.
    pub fn pump(&mut self, now_ms: u64) -> usize {
        let mut paints = 0;
        loop {
            if self.list.needs_paint() {
                if paints == self.max_paints_per_pump {
                    vwarn!(paints, "ListHost::pump: paint budget exhausted");
                    break;
                }
                self.paint(now_ms);
                paints += 1;
            }
            if !self.list.settle() {
                break;
            }
        }
        self.forward_scroll_request();
        paints
    }

    /// Advances cell animations to `now_ms`.
    ///
    /// When the last running animation finishes, the list gets to flush its deferred
    /// corrections; returns the number of frames that painted.
    pub fn tick(&mut self, now_ms: u64) -> usize {
        if !self.animator.is_animating() {
            return 0;
        }
        let substrate = &mut self.substrate;
        let mounted = &self.mounted;
        let finished = self.animator.tick(now_ms, |cell, offset| {
            if let Some(m) = mounted.get(&cell) {
                substrate.render_cell(cell, offset, m.extent, m.visible, None);
            }
        });

        let mut settle = false;
        for cell in finished {
            settle |= self.list.on_animation_complete(cell);
        }
        if settle { self.pump(now_ms) } else { 0 }
    }

    fn paint(&mut self, now_ms: u64) {
        let frame = self.list.take_frame();
        vtrace!(
            cells = frame.cells.len(),
            content_extent = frame.content_extent,
            "ListHost::paint"
        );
        self.substrate.set_content_extent(frame.content_extent);
        self.forward_scroll_request();

        let mut live = BTreeSet::new();
        for cell in &frame.cells {
            live.insert(cell.id);
            let content = match cell.item_index {
                Some(index) if cell.should_update => {
                    Some((self.render)(&self.list.items()[index]))
                }
                _ => None,
            };

            let previous = self.mounted.insert(
                cell.id,
                MountedCell {
                    key: cell.item_key.clone(),
                    offset: cell.offset,
                    extent: cell.extent,
                    visible: cell.is_visible,
                },
            );
            let in_flight = self.animator.sample(cell.id, now_ms);
            let offset = match (previous, in_flight) {
                (Some(prev), _) if cell.animate => {
                    self.animator
                        .animate(cell.id, prev.offset, cell.offset, now_ms)
                }
                // Same target: let the running animation carry on.
                (Some(prev), Some(current)) if prev.offset == cell.offset => current,
                _ => {
                    if self.animator.cancel(cell.id) || cell.animate {
                        self.list.on_animation_complete(cell.id);
                    }
                    cell.offset
                }
            };

            self.substrate.render_cell(
                cell.id,
                offset,
                cell.extent,
                cell.is_visible,
                content,
            );
            if cell.needs_measure {
                self.substrate.request_measure(cell.id);
            }
        }

        let gone: Vec<CellId> = self
            .mounted
            .keys()
            .filter(|id| !live.contains(*id))
            .copied()
            .collect();
        for cell in gone {
            self.mounted.remove(&cell);
            if self.animator.cancel(cell) {
                self.list.on_animation_complete(cell);
            }
            self.substrate.unmount_cell(cell);
        }
    }

    fn forward_scroll_request(&mut self) {
        if let Some(request) = self.list.take_scroll_request() {
            vtrace!(
                offset = request.offset,
                animated = request.animated,
                "ListHost: scroll request"
            );
            self.substrate.scroll_to(request.offset, request.animated);
        }
    }
}

impl<K, D, S> core::fmt::Debug for ListHost<K, D, S>
where
    K: core::fmt::Debug,
    D: core::fmt::Debug,
    S: Substrate + core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListHost")
            .field("list", &self.list)
            .field("substrate", &self.substrate)
            .field("animator", &self.animator)
            .field("mounted", &self.mounted.len())
            .field("max_paints_per_pump", &self.max_paints_per_pump)
            .finish_non_exhaustive()
    }
}

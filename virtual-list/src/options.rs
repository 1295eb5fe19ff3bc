use alloc::sync::Arc;

use crate::pool::DEFAULT_POOL_CAPACITY;
use crate::{Axis, VirtualList};

/// Default cap on items waiting for a measurement at the same time.
pub const DEFAULT_MAX_SIMULTANEOUS_MEASURES: usize = 16;

/// A callback fired when the list has a new frame to paint.
pub type OnChangeCallback<K, D> = Arc<dyn Fn(&VirtualList<K, D>) + Send + Sync>;

/// A callback fired when the focused item changes.
pub type OnFocusChangeCallback<K> = Arc<dyn Fn(Option<&K>) + Send + Sync>;

/// Render and cull margins for a given viewport extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Margins {
    /// Extra extent rendered beyond each edge of the viewport.
    pub render: u32,
    /// Distance beyond each edge after which cells are released.
    pub cull: u32,
}

/// Tuning for overdraw and culling.
///
/// The cull margin is kept at least as large as the render margin, so cells that were rendered
/// speculatively survive small scroll reversals.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverdrawPolicy {
    pub overdraw_fraction: f32,
    pub min_overdraw: u32,
    pub max_overdraw: u32,
    pub cull_fraction: f32,
    pub min_cull: u32,
}

impl OverdrawPolicy {
    pub const STANDARD: Self = Self {
        overdraw_fraction: 0.5,
        min_overdraw: 512,
        max_overdraw: 4096,
        cull_fraction: 1.0,
        min_cull: 1024,
    };

    /// Used when unchanged items skip rendering, which makes speculative rendering cheap.
    pub const SKIP_UNCHANGED: Self = Self {
        overdraw_fraction: 5.0,
        min_overdraw: 2048,
        max_overdraw: 4096,
        cull_fraction: 6.0,
        min_cull: 3072,
    };

    pub fn margins(&self, viewport: u32) -> Margins {
        let view = viewport as f32;
        let render = ((view * self.overdraw_fraction) as u32)
            .max(self.min_overdraw)
            .min(self.max_overdraw);
        let cull = ((view * self.cull_fraction) as u32)
            .max(self.min_cull)
            .max(render);
        Margins { render, cull }
    }
}

impl Default for OverdrawPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Configuration for [`crate::VirtualList`].
pub struct ListOptions<K, D = ()> {
    pub axis: Axis,

    /// Space before the first item.
    pub padding_start: u32,
    /// Space after the last item.
    pub padding_end: u32,

    /// Skip re-rendering retained items whose descriptor compares equal.
    ///
    /// Also widens the default overdraw (see [`OverdrawPolicy::SKIP_UNCHANGED`]).
    pub skip_render_if_item_unchanged: bool,

    /// Overrides the overdraw policy derived from `skip_render_if_item_unchanged`.
    pub overdraw: Option<OverdrawPolicy>,

    /// Growth of the render block pauses while this many items wait for a measurement.
    pub max_simultaneous_measures: usize,

    /// Number of recycled cells kept for reuse.
    pub pool_capacity: usize,

    /// Turn recycling off while a screen reader is active (stable reading order).
    pub disable_recycling_with_screen_reader: bool,

    /// Animate cell offset changes (inserts, removals, moves, measurements).
    pub animate_changes: bool,

    /// Space kept between a keyboard-focused item and the viewport edges.
    pub keyboard_focus_margin: u32,

    /// Pending adjustment tolerated before a correction is flushed.
    pub correction_tolerance: u64,

    /// Key selected and focused when the list is created.
    pub initial_selected_key: Option<K>,

    /// Fired after an update that needs a paint.
    pub on_change: Option<OnChangeCallback<K, D>>,

    pub on_focus_change: Option<OnFocusChangeCallback<K>>,
}

impl<K: Clone, D> Clone for ListOptions<K, D> {
    fn clone(&self) -> Self {
        Self {
            axis: self.axis,
            padding_start: self.padding_start,
            padding_end: self.padding_end,
            skip_render_if_item_unchanged: self.skip_render_if_item_unchanged,
            overdraw: self.overdraw,
            max_simultaneous_measures: self.max_simultaneous_measures,
            pool_capacity: self.pool_capacity,
            disable_recycling_with_screen_reader: self.disable_recycling_with_screen_reader,
            animate_changes: self.animate_changes,
            keyboard_focus_margin: self.keyboard_focus_margin,
            correction_tolerance: self.correction_tolerance,
            initial_selected_key: self.initial_selected_key.clone(),
            on_change: self.on_change.clone(),
            on_focus_change: self.on_focus_change.clone(),
        }
    }
}

impl<K, D> Default for ListOptions<K, D> {
    fn default() -> Self {
        Self::new(Axis::Vertical)
    }
}

impl<K, D> ListOptions<K, D> {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            padding_start: 0,
            padding_end: 0,
            skip_render_if_item_unchanged: false,
            overdraw: None,
            max_simultaneous_measures: DEFAULT_MAX_SIMULTANEOUS_MEASURES,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            disable_recycling_with_screen_reader: true,
            animate_changes: false,
            keyboard_focus_margin: 0,
            correction_tolerance: 0,
            initial_selected_key: None,
            on_change: None,
            on_focus_change: None,
        }
    }

    /// The overdraw policy in effect.
    pub fn overdraw_policy(&self) -> OverdrawPolicy {
        match self.overdraw {
            Some(policy) => policy,
            None if self.skip_render_if_item_unchanged => OverdrawPolicy::SKIP_UNCHANGED,
            None => OverdrawPolicy::STANDARD,
        }
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_padding(mut self, padding_start: u32, padding_end: u32) -> Self {
        self.padding_start = padding_start;
        self.padding_end = padding_end;
        self
    }

    pub fn with_skip_render_if_item_unchanged(mut self, skip: bool) -> Self {
        self.skip_render_if_item_unchanged = skip;
        self
    }

    pub fn with_overdraw(mut self, overdraw: Option<OverdrawPolicy>) -> Self {
        self.overdraw = overdraw;
        self
    }

    pub fn with_max_simultaneous_measures(mut self, max: usize) -> Self {
        self.max_simultaneous_measures = max.max(1);
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    pub fn with_disable_recycling_with_screen_reader(mut self, disable: bool) -> Self {
        self.disable_recycling_with_screen_reader = disable;
        self
    }

    pub fn with_animate_changes(mut self, animate: bool) -> Self {
        self.animate_changes = animate;
        self
    }

    pub fn with_keyboard_focus_margin(mut self, margin: u32) -> Self {
        self.keyboard_focus_margin = margin;
        self
    }

    pub fn with_correction_tolerance(mut self, tolerance: u64) -> Self {
        self.correction_tolerance = tolerance;
        self
    }

    pub fn with_initial_selected_key(mut self, key: Option<K>) -> Self {
        self.initial_selected_key = key;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&VirtualList<K, D>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_focus_change(
        mut self,
        on_focus_change: Option<impl Fn(Option<&K>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_focus_change = on_focus_change.map(|f| Arc::new(f) as _);
        self
    }
}

impl<K: core::fmt::Debug, D> core::fmt::Debug for ListOptions<K, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListOptions")
            .field("axis", &self.axis)
            .field("padding_start", &self.padding_start)
            .field("padding_end", &self.padding_end)
            .field(
                "skip_render_if_item_unchanged",
                &self.skip_render_if_item_unchanged,
            )
            .field("overdraw", &self.overdraw)
            .field("max_simultaneous_measures", &self.max_simultaneous_measures)
            .field("pool_capacity", &self.pool_capacity)
            .field(
                "disable_recycling_with_screen_reader",
                &self.disable_recycling_with_screen_reader,
            )
            .field("animate_changes", &self.animate_changes)
            .field("keyboard_focus_margin", &self.keyboard_focus_margin)
            .field("correction_tolerance", &self.correction_tolerance)
            .field("initial_selected_key", &self.initial_selected_key)
            .finish_non_exhaustive()
    }
}

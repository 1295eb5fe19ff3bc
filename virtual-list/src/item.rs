use alloc::string::String;

/// A caller-supplied item descriptor.
///
/// The list treats the item vector as a value: it is replaced wholesale by
/// [`crate::VirtualList::set_items`] and diffed by `key` against the previous one. Structural
/// equality (`PartialEq`, including `data`) decides whether a retained item's cell must re-render
/// when change skipping is enabled.
#[derive(Clone, Debug, PartialEq)]
pub struct Item<K, D = ()> {
    pub key: K,
    /// Extent along the scroll axis. When `measure_extent` is set this is only a guess.
    pub extent: u32,
    pub measure_extent: bool,
    /// Items sharing a template can reuse each other's cells.
    pub template: Option<String>,
    pub is_navigable: bool,
    pub data: D,
}

impl<K> Item<K> {
    /// Creates a constant-extent item without payload.
    pub fn new(key: K, extent: u32) -> Self {
        Self::with_data(key, extent, ())
    }
}

impl<K, D> Item<K, D> {
    pub fn with_data(key: K, extent: u32, data: D) -> Self {
        Self {
            key,
            extent,
            measure_extent: false,
            template: None,
            is_navigable: false,
            data,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Marks `extent` as a guess that must be replaced by a measurement.
    pub fn with_measure_extent(mut self, measure_extent: bool) -> Self {
        self.measure_extent = measure_extent;
        self
    }

    pub fn with_navigable(mut self, is_navigable: bool) -> Self {
        self.is_navigable = is_navigable;
        self
    }

    pub fn is_extent_constant(&self) -> bool {
        !self.measure_extent
    }

    /// Whether a cell that rendered `self` can keep rendering `other` in place.
    ///
    /// Cells are bound to a template and to extent constancy for their whole life.
    pub(crate) fn same_shape<E>(&self, other: &Item<K, E>) -> bool {
        self.template == other.template && self.measure_extent == other.measure_extent
    }
}

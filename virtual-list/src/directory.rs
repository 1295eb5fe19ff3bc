use alloc::vec::Vec;
use core::fmt;

use crate::Item;
use crate::key::{KeyMap, ListKey};

/// Two items in one list share a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateKey {
    pub first_index: usize,
    pub index: usize,
}

impl fmt::Display for DuplicateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicate item key at index {} (first used at index {})",
            self.index, self.first_index
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DuplicateKey {}

/// Maps stable item keys to their index in the current list.
#[derive(Clone, Debug)]
pub struct ItemDirectory<K> {
    index: KeyMap<K, usize>,
}

impl<K: ListKey> Default for ItemDirectory<K> {
    fn default() -> Self {
        Self {
            index: KeyMap::default(),
        }
    }
}

impl<K: ListKey> ItemDirectory<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the directory for `items`; fails on the first repeated key.
    pub fn build<D>(items: &[Item<K, D>]) -> Result<Self, DuplicateKey> {
        let mut index = KeyMap::default();
        #[cfg(feature = "std")]
        index.reserve(items.len());
        for (i, item) in items.iter().enumerate() {
            if let Some(first_index) = index.insert(item.key.clone(), i) {
                return Err(DuplicateKey {
                    first_index,
                    index: i,
                });
            }
        }
        Ok(Self { index })
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Classification of a list update, by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListDiff {
    /// New indexes of keys that were not present before.
    pub added: Vec<usize>,
    /// Old indexes of keys that are gone.
    pub removed: Vec<usize>,
    /// New indexes of retained items whose cell must re-render.
    pub changed: Vec<usize>,
    /// New indexes of retained items whose position changed.
    pub moved: Vec<usize>,
    /// `(old, new)` indexes of retained items whose template or extent constancy changed.
    pub reshaped: Vec<(usize, usize)>,
}

impl ListDiff {
    /// Diffs `prev` against `next` by key.
    ///
    /// With `skip_unchanged` off every retained item counts as changed.
    pub fn compute<K: ListKey, D: PartialEq>(
        prev: &[Item<K, D>],
        prev_directory: &ItemDirectory<K>,
        next: &[Item<K, D>],
        next_directory: &ItemDirectory<K>,
        skip_unchanged: bool,
    ) -> Self {
        let mut diff = Self::default();

        for (old, item) in prev.iter().enumerate() {
            if !next_directory.contains(&item.key) {
                diff.removed.push(old);
            }
        }

        for (new, item) in next.iter().enumerate() {
            let Some(old) = prev_directory.index_of(&item.key) else {
                diff.added.push(new);
                continue;
            };
            let before = &prev[old];
            if !before.same_shape(item) {
                diff.reshaped.push((old, new));
            }
            if !skip_unchanged || before != item {
                diff.changed.push(new);
            }
            if old != new {
                diff.moved.push(new);
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.moved.is_empty()
    }
}

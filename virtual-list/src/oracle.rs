use crate::Item;
use crate::key::{KeyMap, KeySet, ListKey};

/// Resolves item extents along the scroll axis.
///
/// Constant-extent items are trusted. Everything else is served from a key → extent cache of
/// measurements, falling back to the item's declared guess until a measurement arrives. The cache
/// outlives cells: an item that scrolls out and back in is not measured again.
#[derive(Clone, Debug)]
pub struct SizeOracle<K> {
    cache: KeyMap<K, u32>,
    pending: KeySet<K>,
}

impl<K: ListKey> Default for SizeOracle<K> {
    fn default() -> Self {
        Self {
            cache: KeyMap::default(),
            pending: KeySet::default(),
        }
    }
}

impl<K: ListKey> SizeOracle<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the extent to assume for `item`, marking it as pending measurement when only a
    /// guess is available.
    pub fn extent_of<D>(&mut self, item: &Item<K, D>) -> u32 {
        if item.is_extent_constant() {
            return item.extent;
        }
        if let Some(&extent) = self.cache.get(&item.key) {
            return extent;
        }
        if !self.pending.contains(&item.key) {
            self.pending.insert(item.key.clone());
        }
        item.extent
    }

    /// Like [`Self::extent_of`], without touching the pending set.
    pub fn peek_extent<D>(&self, item: &Item<K, D>) -> u32 {
        if item.is_extent_constant() {
            return item.extent;
        }
        self.cache.get(&item.key).copied().unwrap_or(item.extent)
    }

    pub fn is_known<D>(&self, item: &Item<K, D>) -> bool {
        item.is_extent_constant() || self.cache.contains_key(&item.key)
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains(key)
    }

    /// Stores a measurement and returns its difference to the previously assumed extent.
    pub fn record_measurement<D>(&mut self, item: &Item<K, D>, measured: u32) -> i64 {
        let assumed = self.peek_extent(item);
        self.pending.remove(&item.key);
        self.cache.insert(item.key.clone(), measured);
        measured as i64 - assumed as i64
    }

    /// Seeds the cache, e.g. from a previous session.
    pub fn insert(&mut self, key: K, extent: u32) {
        self.pending.remove(&key);
        self.cache.insert(key, extent);
    }

    /// Drops a pending request for an item that left the render block unmeasured.
    pub fn cancel_pending(&mut self, key: &K) {
        self.pending.remove(key);
    }

    /// Forgets everything about a deleted item.
    pub fn forget(&mut self, key: &K) {
        self.pending.remove(key);
        self.cache.remove(key);
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn cached(&self, key: &K) -> Option<u32> {
        self.cache.get(key).copied()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn for_each_cached(&self, mut f: impl FnMut(&K, u32)) {
        for (k, v) in self.cache.iter() {
            f(k, *v);
        }
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.pending.clear();
    }
}

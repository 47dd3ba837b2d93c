//! Bounded cache of decoded pixel data.
//!
//! Entries are keyed by instance identity and carry an explicit recency
//! stamp. Inserting refreshes an entry; reading does not. Once the cache
//! grows past its capacity the entry with the oldest stamp is dropped.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use tracing::debug;

pub const DEFAULT_CAPACITY: usize = 8;

struct CacheEntry<V> {
    value: V,
    stamp: u64,
}

pub struct FrameCache<K, V> {
    capacity: usize,
    entries: HashMap<K, CacheEntry<V>>,
    /// stamp -> key, oldest first
    recency: BTreeMap<u64, K>,
    next_stamp: u64,
}

impl<K, V> FrameCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity + 1),
            recency: BTreeMap::new(),
            next_stamp: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Look up an entry without touching its recency.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Insert `value` as the most recently used entry, replacing any previous
    /// value for `key`, then evict from the old end until within capacity.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(previous) = self.entries.remove(&key) {
            self.recency.remove(&previous.stamp);
        }

        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.recency.insert(stamp, key.clone());
        self.entries.insert(key, CacheEntry { value, stamp });

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(resident = self.entries.len(), "evicted least recently used frame data");
        }
    }

    /// Keys ordered from least to most recently inserted.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.recency.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }
}

impl<K, V> Default for FrameCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

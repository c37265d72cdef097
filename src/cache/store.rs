//! Cache Store Module
//!
//! Main cache engine combining a key lookup table with an ordered recency
//! list, bounded by item count and estimated memory.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, NodeId, OrderedList, SizeEstimate, Sizer};
use crate::config::{CacheConfig, CacheLimits, MemoryProbe, SystemMemory};
use crate::error::Result;

// == Insertion Outcome ==
/// Result of [`LruCache::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// A new entry was created
    Inserted,
    /// An existing entry was overwritten in place
    Updated,
    /// The value can never fit under the memory limit; nothing changed
    Rejected { size: usize, limit: usize },
}

impl Insertion {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Insertion::Rejected { .. })
    }
}

// == LRU Cache ==
/// In-memory LRU cache bounded by item count and estimated memory.
///
/// Every entry lives in exactly one node of the recency list; the lookup
/// table only maps keys to node handles. Single-key operations are O(1).
///
/// The cache is not synchronized. Callers sharing it across tasks must wrap
/// it in a single lock.
#[derive(Debug)]
pub struct LruCache<K, V> {
    /// Key to node handle
    lookup: HashMap<K, NodeId>,
    /// Entries ordered from most to least recently used
    order: OrderedList<CacheEntry<K, V>>,
    /// Size estimator for stored values
    sizer: Sizer<V>,
    /// Item and byte limits
    limits: CacheLimits,
    /// Sum of recorded sizes of all entries
    memory_usage: usize,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: SizeEstimate,
{
    // == Constructor ==
    /// Creates a new cache from the given configuration.
    ///
    /// A missing byte limit is derived from the host's available memory.
    ///
    /// # Errors
    /// Returns `CacheError::InvalidConfig` if a limit is zero or no limit is set.
    pub fn new(config: CacheConfig<V>) -> Result<Self> {
        Self::with_probe(config, &SystemMemory)
    }

    /// Creates a new cache, deriving any missing byte limit from `probe`.
    pub fn with_probe(config: CacheConfig<V>, probe: &dyn MemoryProbe) -> Result<Self> {
        let limits = config.resolve_limits(probe)?;
        let sizer = match config.size_calculator {
            Some(f) => Sizer::Custom(f),
            None => Sizer::Heuristic,
        };

        debug!(
            max_items = ?limits.max_items,
            max_memory_bytes = limits.max_memory_bytes,
            custom_sizer = sizer.is_custom(),
            "Cache created"
        );

        Ok(Self {
            lookup: HashMap::new(),
            order: OrderedList::new(),
            sizer,
            limits,
            memory_usage: 0,
            stats: CacheStats::new(),
        })
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Returns None for a missing key.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.lookup.get(key) else {
            self.stats.record_miss();
            return None;
        };

        self.stats.record_hit();
        self.order.move_to_front(id);
        self.order.get(id).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Retrieves a value by key without touching recency order or stats.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.lookup.get(key)?;
        self.order.get(id).map(|entry| &entry.value)
    }

    // == Has ==
    /// Checks membership without touching recency order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lookup.contains_key(key)
    }

    // == Set ==
    /// Stores a key-value pair, evicting least recently used entries as needed.
    ///
    /// A value larger than the whole memory limit is silently dropped; use
    /// [`insert`](Self::insert) to observe that case.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        self.insert(key, value);
        self
    }

    // == Insert ==
    /// Stores a key-value pair and reports what happened.
    ///
    /// - Existing key: the value is overwritten in place and promoted. Item
    ///   count never changes on this path, so no count eviction happens.
    /// - New key larger than `max_memory_bytes`: rejected, nothing changes.
    /// - New key otherwise: entries are evicted from the tail until both
    ///   limits admit the new entry, then it is inserted as most recent.
    pub fn insert(&mut self, key: K, value: V) -> Insertion {
        let size = self.sizer.estimate(&value);
        let limit = self.limits.max_memory_bytes;

        if let Some(&id) = self.lookup.get(&key) {
            if size > limit {
                return self.reject(size);
            }
            if let Some(entry) = self.order.get_mut(id) {
                let previous = entry.replace(value, size);
                self.memory_usage = self.memory_usage - previous + size;
            }
            self.order.move_to_front(id);

            // A grown value may push usage over the limit; shed older
            // entries. The updated entry is the head and fits on its own.
            let evicted = self.evict_while_pressured(0, false);
            if evicted > 0 {
                debug!(evicted, memory_usage = self.memory_usage, "Evicted after update");
            }
            return Insertion::Updated;
        }

        if size > limit {
            return self.reject(size);
        }

        let evicted = self.evict_while_pressured(size, true);
        if evicted > 0 {
            debug!(evicted, memory_usage = self.memory_usage, "Evicted to admit new entry");
        }

        let id = self.order.push_front(CacheEntry::new(key.clone(), value, size));
        self.lookup.insert(key, id);
        self.memory_usage += size;
        Insertion::Inserted
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether the key existed.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove(key).is_some()
    }

    // == Remove ==
    /// Removes an entry by key and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.lookup.remove(key)?;
        let entry = self.order.remove(id)?;
        self.memory_usage -= entry.size;
        Some(entry.value)
    }

    // == Clear ==
    /// Removes every entry and resets memory usage to zero.
    ///
    /// Hit, miss and eviction counters are kept.
    pub fn clear(&mut self) {
        self.lookup.clear();
        self.order.clear();
        self.memory_usage = 0;
    }

    // == Eviction ==
    /// Evicts from the tail while the cache is non-empty and under count or
    /// memory pressure, re-checking both after every eviction.
    ///
    /// Returns the number of entries evicted.
    fn evict_while_pressured(&mut self, required: usize, count_limited: bool) -> usize {
        let mut evicted = 0;
        while !self.order.is_empty() && self.under_pressure(required, count_limited) {
            if self.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        evicted
    }

    fn under_pressure(&self, required: usize, count_limited: bool) -> bool {
        let count_pressure = count_limited
            && self
                .limits
                .max_items
                .is_some_and(|max| self.order.len() >= max);
        let memory_pressure =
            self.memory_usage.saturating_add(required) > self.limits.max_memory_bytes;

        count_pressure || memory_pressure
    }

    /// Removes the least recently used entry.
    fn evict_lru(&mut self) -> Option<CacheEntry<K, V>> {
        let entry = self.order.pop_back()?;
        self.lookup.remove(&entry.key);
        self.memory_usage -= entry.size;
        self.stats.record_eviction();
        Some(entry)
    }

    fn reject(&mut self, size: usize) -> Insertion {
        let limit = self.limits.max_memory_bytes;
        self.stats.record_rejection();
        debug!(size, limit, "Rejected value larger than memory limit");
        Insertion::Rejected { size, limit }
    }

    /// Panics if the lookup table, recency list and memory total disagree.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.lookup.len(), self.order.len(), "lookup and list lengths differ");

        for (key, &id) in &self.lookup {
            let entry = self.order.get(id).expect("lookup points at a free slot");
            assert!(entry.key == *key, "lookup points at another key's node");
        }

        let mut walked = 0;
        let mut total = 0;
        for entry in self.order.iter() {
            walked += 1;
            total += entry.size;
            assert_eq!(entry.size, self.sizer.estimate(&entry.value), "stale recorded size");
        }
        assert_eq!(walked, self.order.len(), "list walk disagrees with len");
        assert_eq!(total, self.memory_usage, "memory usage drifted");

        if let Some(max) = self.limits.max_items {
            assert!(self.order.len() <= max, "item limit exceeded");
        }
        assert!(
            self.memory_usage <= self.limits.max_memory_bytes,
            "memory limit exceeded"
        );
    }
}

impl<K, V> LruCache<K, V> {
    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns the sum of the estimated sizes of all stored values.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn max_items(&self) -> Option<usize> {
        self.limits.max_items
    }

    pub fn max_memory_bytes(&self) -> usize {
        self.limits.max_memory_bytes
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_occupancy(self.order.len(), self.memory_usage);
        stats
    }

    // == Iteration ==
    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order.iter().map(|entry| (&entry.key, &entry.value))
    }
}

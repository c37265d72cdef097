//! Cache Entry Module
//!
//! Defines the payload stored in each node of the recency list.

// == Cache Entry ==
/// Represents a single cache entry with its recorded size.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<K, V> {
    /// The key this entry is stored under
    pub key: K,
    /// The stored value
    pub value: V,
    /// Estimated size of `value` in bytes, recorded when it was stored
    pub size: usize,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The key the entry is stored under
    /// * `value` - The value to store
    /// * `size` - Estimated size of the value in bytes
    pub fn new(key: K, value: V, size: usize) -> Self {
        Self { key, value, size }
    }

    // == Replace ==
    /// Overwrites the value in place and returns the previously recorded size.
    pub fn replace(&mut self, value: V, size: usize) -> usize {
        self.value = value;
        std::mem::replace(&mut self.size, size)
    }
}

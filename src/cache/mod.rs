//! Cache Module
//!
//! Provides an in-memory LRU cache bounded by item count and estimated memory.

mod entry;
mod list;
mod size;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use list::{Iter, NodeId, OrderedList};
pub use size::{
    sequence_size, serialized_size, text_size, SizeEstimate, SizeFn, Sizer, BOOL_SIZE,
    NUMBER_SIZE, OPAQUE_SIZE, SEQUENCE_BASE_SIZE, SEQUENCE_SLOT_SIZE, TEMPORAL_SIZE,
    TEXT_UNIT_SIZE, UNSERIALIZABLE_SIZE,
};
pub use stats::CacheStats;
pub use store::{Insertion, LruCache};

// == Public Constants ==
/// Maximum allowed key length in bytes for keys arriving over HTTP
pub const MAX_KEY_LENGTH: usize = 256;

//! Size Estimation Module
//!
//! Heuristic byte-cost estimates for cached values.
//!
//! Estimates are approximate: they use fixed per-shape constants and never
//! inspect allocator state. They are pure, so the cache can rely on the same
//! value always reporting the same size.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

// == Size Constants ==
/// Cost of a boolean
pub const BOOL_SIZE: usize = 4;
/// Cost of any numeric value
pub const NUMBER_SIZE: usize = 8;
/// Cost of a date or timestamp
pub const TEMPORAL_SIZE: usize = 8;
/// Bytes per UTF-16 code unit of text
pub const TEXT_UNIT_SIZE: usize = 2;
/// Fixed overhead of a sequence
pub const SEQUENCE_BASE_SIZE: usize = 40;
/// Per-element cost of a sequence
pub const SEQUENCE_SLOT_SIZE: usize = 8;
/// Cost of a structured value that cannot be serialized
pub const UNSERIALIZABLE_SIZE: usize = 1024;
/// Cost of a value with no more specific estimate
pub const OPAQUE_SIZE: usize = 100;

// == Size Estimate Trait ==
/// Built-in size heuristic, chosen by the shape of a value.
///
/// The default method returns [`OPAQUE_SIZE`], so any type can opt in with an
/// empty `impl SizeEstimate for MyType {}`.
pub trait SizeEstimate {
    /// Returns the estimated cost of this value in bytes.
    fn estimated_size(&self) -> usize {
        OPAQUE_SIZE
    }
}

/// Cost of a string: two bytes per UTF-16 code unit.
pub fn text_size(s: &str) -> usize {
    s.encode_utf16().count() * TEXT_UNIT_SIZE
}

/// Cost of a sequence holding `len` elements.
pub fn sequence_size(len: usize) -> usize {
    SEQUENCE_BASE_SIZE + SEQUENCE_SLOT_SIZE * len
}

/// Cost of a structured value: the length of its JSON encoding.
///
/// Falls back to [`UNSERIALIZABLE_SIZE`] if serialization fails.
pub fn serialized_size<T: Serialize + ?Sized>(value: &T) -> usize {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .unwrap_or(UNSERIALIZABLE_SIZE)
}

impl SizeEstimate for () {
    fn estimated_size(&self) -> usize {
        0
    }
}

impl SizeEstimate for bool {
    fn estimated_size(&self) -> usize {
        BOOL_SIZE
    }
}

macro_rules! impl_numeric_size {
    ($($t:ty),* $(,)?) => {
        $(
            impl SizeEstimate for $t {
                fn estimated_size(&self) -> usize {
                    NUMBER_SIZE
                }
            }
        )*
    };
}

impl_numeric_size!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl SizeEstimate for char {
    fn estimated_size(&self) -> usize {
        self.len_utf16() * TEXT_UNIT_SIZE
    }
}

impl SizeEstimate for str {
    fn estimated_size(&self) -> usize {
        text_size(self)
    }
}

impl SizeEstimate for String {
    fn estimated_size(&self) -> usize {
        text_size(self)
    }
}

impl SizeEstimate for SystemTime {
    fn estimated_size(&self) -> usize {
        TEMPORAL_SIZE
    }
}

impl<Tz: chrono::TimeZone> SizeEstimate for chrono::DateTime<Tz> {
    fn estimated_size(&self) -> usize {
        TEMPORAL_SIZE
    }
}

impl SizeEstimate for chrono::NaiveDateTime {
    fn estimated_size(&self) -> usize {
        TEMPORAL_SIZE
    }
}

impl SizeEstimate for chrono::NaiveDate {
    fn estimated_size(&self) -> usize {
        TEMPORAL_SIZE
    }
}

impl<T: SizeEstimate> SizeEstimate for Option<T> {
    fn estimated_size(&self) -> usize {
        self.as_ref().map_or(0, SizeEstimate::estimated_size)
    }
}

impl<T: SizeEstimate + ?Sized> SizeEstimate for Box<T> {
    fn estimated_size(&self) -> usize {
        (**self).estimated_size()
    }
}

impl<T: SizeEstimate + ?Sized> SizeEstimate for Arc<T> {
    fn estimated_size(&self) -> usize {
        (**self).estimated_size()
    }
}

impl<T> SizeEstimate for [T] {
    fn estimated_size(&self) -> usize {
        sequence_size(self.len())
    }
}

impl<T> SizeEstimate for Vec<T> {
    fn estimated_size(&self) -> usize {
        sequence_size(self.len())
    }
}

impl<T> SizeEstimate for VecDeque<T> {
    fn estimated_size(&self) -> usize {
        sequence_size(self.len())
    }
}

impl<K: Serialize, V: Serialize, S> SizeEstimate for HashMap<K, V, S> {
    fn estimated_size(&self) -> usize {
        // Serialize through an ordered view; HashMap<K, V, S> only implements
        // Serialize for S: BuildHasher.
        let entries: Vec<(&K, &V)> = self.iter().collect();
        serialized_map_size(&entries)
    }
}

impl<K: Serialize, V: Serialize> SizeEstimate for BTreeMap<K, V> {
    fn estimated_size(&self) -> usize {
        serialized_size(self)
    }
}

impl SizeEstimate for serde_json::Value {
    fn estimated_size(&self) -> usize {
        use serde_json::Value;

        match self {
            Value::Null => 0,
            Value::Bool(_) => BOOL_SIZE,
            Value::Number(_) => NUMBER_SIZE,
            Value::String(s) => text_size(s),
            Value::Array(items) => sequence_size(items.len()),
            Value::Object(map) => serialized_size(map),
        }
    }
}

/// Serializes `(key, value)` pairs as a JSON object and returns its length.
fn serialized_map_size<K: Serialize, V: Serialize>(entries: &[(&K, &V)]) -> usize {
    struct AsMap<'a, K, V>(&'a [(&'a K, &'a V)]);

    impl<K: Serialize, V: Serialize> Serialize for AsMap<'_, K, V> {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_map(self.0.iter().map(|(k, v)| (*k, *v)))
        }
    }

    serialized_size(&AsMap(entries))
}

// == Sizer ==
/// Caller-supplied size function.
pub type SizeFn<V> = Arc<dyn Fn(&V) -> usize + Send + Sync>;

/// Chooses between the built-in heuristic and a custom size function.
///
/// A custom function, when present, is used exclusively.
pub enum Sizer<V> {
    /// Use [`SizeEstimate::estimated_size`]
    Heuristic,
    /// Use a caller-supplied function
    Custom(SizeFn<V>),
}

impl<V> Sizer<V> {
    /// Wraps a closure as a custom sizer.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&V) -> usize + Send + Sync + 'static,
    {
        Sizer::Custom(Arc::new(f))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Sizer::Custom(_))
    }
}

impl<V: SizeEstimate> Sizer<V> {
    // == Estimate ==
    /// Returns the estimated cost of `value` in bytes.
    pub fn estimate(&self, value: &V) -> usize {
        match self {
            Sizer::Heuristic => value.estimated_size(),
            Sizer::Custom(f) => f(value),
        }
    }
}

impl<V> Default for Sizer<V> {
    fn default() -> Self {
        Sizer::Heuristic
    }
}

impl<V> Clone for Sizer<V> {
    fn clone(&self) -> Self {
        match self {
            Sizer::Heuristic => Sizer::Heuristic,
            Sizer::Custom(f) => Sizer::Custom(Arc::clone(f)),
        }
    }
}

impl<V> fmt::Debug for Sizer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sizer::Heuristic => f.write_str("Sizer::Heuristic"),
            Sizer::Custom(_) => f.write_str("Sizer::Custom(..)"),
        }
    }
}

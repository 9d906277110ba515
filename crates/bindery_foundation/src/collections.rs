//! List and map payloads of [`Value`].
//!
//! Both are backed by `im` persistent structures, so cloning an attribute
//! value is O(1) and every edit produces a new collection that leaves the
//! stored one untouched.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::value::Value;

// =============================================================================
// List
// =============================================================================

/// An ordered list of values.
#[derive(Clone, Default)]
pub struct List(im::Vector<Value>);

impl List {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(im::Vector::new())
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the list has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets an item by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Iterates the items in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    /// Returns a copy with `value` appended.
    #[must_use]
    pub fn pushed(&self, value: impl Into<Value>) -> Self {
        let mut items = self.0.clone();
        items.push_back(value.into());
        Self(items)
    }

    /// Runs `f` over an editable copy of the items and returns the edited
    /// list together with `f`'s result.
    pub fn edit<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> (Self, R) {
        let mut items = self.to_vec();
        let result = f(&mut items);
        (items.into(), result)
    }

    /// Copies the items into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.iter().cloned().collect()
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for List {}

impl Hash for List {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self.iter() {
            item.hash(state);
        }
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for List {
    fn from(items: Vec<Value>) -> Self {
        Self(im::Vector::from(items))
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = im::vector::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Map
// =============================================================================

/// A string-keyed map of values. Key order is unspecified.
#[derive(Clone, Default)]
pub struct Map(im::HashMap<Arc<str>, Value>);

impl Map {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self(im::HashMap::new())
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.0.iter()
    }

    /// Iterates the keys.
    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> {
        self.0.keys()
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with(&self, key: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        Self(self.0.update(key.into(), value.into()))
    }

    /// Returns a copy without `key`.
    #[must_use]
    pub fn without(&self, key: &str) -> Self {
        Self(self.0.without(key))
    }

    /// Sets (`Some`) or deletes (`None`) one key.
    ///
    /// Returns `None` when the edit would leave the map unchanged.
    #[must_use]
    pub fn apply(&self, key: &str, value: Option<Value>) -> Option<Self> {
        match value {
            Some(value) if self.get(key) != Some(&value) => Some(self.with(key, value)),
            None if self.contains_key(key) => Some(self.without(key)),
            _ => None,
        }
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Map {}

impl Hash for Map {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Summed per-entry hashes, so equal maps hash equally whatever their
        // insertion history.
        let mut combined: u64 = 0;
        for (k, v) in self.iter() {
            let mut entry = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut entry);
            v.hash(&mut entry);
            combined = combined.wrapping_add(entry.finish());
        }
        self.len().hash(state);
        combined.hash(state);
    }
}

impl FromIterator<(Arc<str>, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (Arc<str>, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! Insertion-ordered attribute batches.
//!
//! Both `set(name, value)` and `set(map)` call styles normalize into an
//! [`Attributes`] batch. Computed setters return one to redirect writes, and
//! model snapshots are returned as one. Insertion order is preserved so
//! writes and their change events happen in the order they were declared.

use indexmap::IndexMap;

use crate::value::Value;

/// Attribute name.
pub type AttrName = String;

/// Ordered map from attribute name to value.
pub type Attributes = IndexMap<AttrName, Value>;

/// Builds an [`Attributes`] batch from name/value pairs.
///
/// ```
/// use bindery_foundation::{attributes, Value};
///
/// let attrs = attributes([("payment", Value::Int(200))]);
/// assert_eq!(attrs.get("payment"), Some(&Value::Int(200)));
/// ```
pub fn attributes<K, V, I>(pairs: I) -> Attributes
where
    K: Into<AttrName>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

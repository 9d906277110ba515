//! Native attribute storage.
//!
//! The plain name-to-value table a model wraps. It knows nothing about
//! cells or events; it applies writes, skips writes of equal values, and
//! reports exactly which attributes changed so the model can notify.

use bindery_foundation::{AttrName, Attributes, Value};
use indexmap::IndexMap;

/// Options accepted by attribute writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Remove the named attributes instead of writing them. Bypasses computed
    /// setters.
    pub unset: bool,
    /// Apply the write without dispatching change events.
    pub silent: bool,
}

impl SetOptions {
    /// Options for a removal.
    #[must_use]
    pub fn unset() -> Self {
        Self {
            unset: true,
            ..Self::default()
        }
    }

    /// Options for a write that fires no events.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::default()
        }
    }

    /// Builder method to set the unset flag.
    #[must_use]
    pub fn with_unset(mut self, unset: bool) -> Self {
        self.unset = unset;
        self
    }

    /// Builder method to set the silent flag.
    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

/// One effective attribute change.
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    /// The attribute that changed.
    pub name: AttrName,
    /// Value before the write (`None` if the attribute was absent).
    pub old: Option<Value>,
    /// Value after the write (`None` if the attribute was removed).
    pub new: Option<Value>,
}

/// Plain attribute table with previous-value tracking.
#[derive(Clone, Debug, Default)]
pub struct AttributeStore {
    values: IndexMap<AttrName, Value>,
    /// Values changed by the most recent write, as they were before it.
    previous: IndexMap<AttrName, Option<Value>>,
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `defaults`, with no recorded changes.
    #[must_use]
    pub fn with_defaults(defaults: Attributes) -> Self {
        Self {
            values: defaults,
            previous: IndexMap::new(),
        }
    }

    /// Gets an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of stored attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no attribute is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttrName, &Value)> {
        self.values.iter()
    }

    /// Copies every attribute into a batch.
    #[must_use]
    pub fn snapshot(&self) -> Attributes {
        self.values.clone()
    }

    /// Applies a batch of writes (or removals, with `options.unset`).
    ///
    /// Writes of a value equal to the stored one are skipped. The previous
    /// values recorded by the last call are replaced by the ones from this
    /// call. Returns the effective changes in batch order.
    pub fn set(&mut self, attrs: Attributes, options: SetOptions) -> Vec<Change> {
        self.previous.clear();
        let mut changes = Vec::new();

        for (name, value) in attrs {
            let old = self.values.get(&name).cloned();
            let new = if options.unset {
                if old.is_none() {
                    continue;
                }
                self.values.shift_remove(&name);
                None
            } else {
                if old.as_ref() == Some(&value) {
                    continue;
                }
                self.values.insert(name.clone(), value.clone());
                Some(value)
            };

            self.previous.entry(name.clone()).or_insert_with(|| old.clone());
            changes.push(Change { name, old, new });
        }

        changes
    }

    /// Replaces one value without equality checks or change tracking.
    ///
    /// Used by in-place modifiers that always notify.
    pub fn replace(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Removes one attribute without change tracking, returning its value.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.previous.shift_remove(name);
        self.values.shift_remove(name)
    }

    /// Value the attribute had before the most recent write.
    ///
    /// Attributes the last write did not touch report their current value.
    #[must_use]
    pub fn previous(&self, name: &str) -> Option<&Value> {
        match self.previous.get(name) {
            Some(old) => old.as_ref(),
            None => self.values.get(name),
        }
    }

    /// Names changed by the most recent write.
    pub fn changed(&self) -> impl Iterator<Item = &AttrName> {
        self.previous.keys()
    }

    /// Removes everything, including change tracking.
    pub fn clear(&mut self) {
        self.values.clear();
        self.previous.clear();
    }
}

//! Integration tests for the native attribute store
//!
//! Tests change reporting, removal, and previous-value tracking.

use bindery_foundation::{Value, attributes};
use bindery_storage::{AttributeStore, SetOptions};

// =============================================================================
// Writes
// =============================================================================

#[test]
fn defaults_are_not_changes() {
    let store = AttributeStore::with_defaults(attributes([("firstName", "Charlie")]));
    assert_eq!(store.get("firstName"), Some(&Value::from("Charlie")));
    assert_eq!(store.changed().count(), 0);
}

#[test]
fn mixed_batch_reports_only_effective_changes() {
    let mut store = AttributeStore::with_defaults(attributes([("a", 1), ("b", 2)]));
    let changes = store.set(
        attributes([("a", 1), ("b", 3), ("c", 4)]),
        SetOptions::default(),
    );

    let names: Vec<_> = changes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["b", "c"]);
    assert_eq!(changes[0].old, Some(Value::Int(2)));
    assert_eq!(changes[1].old, None);
}

#[test]
fn composite_values_compare_structurally() {
    let mut store = AttributeStore::with_defaults(attributes([("tags", vec!["x", "y"])]));
    assert!(store
        .set(attributes([("tags", vec!["x", "y"])]), SetOptions::default())
        .is_empty());
    assert_eq!(
        store
            .set(attributes([("tags", vec!["y", "x"])]), SetOptions::default())
            .len(),
        1
    );
}

#[test]
fn silent_flag_does_not_change_storage_semantics() {
    let mut store = AttributeStore::new();
    let changes = store.set(attributes([("a", 1)]), SetOptions::silent());
    assert_eq!(changes.len(), 1);
    assert_eq!(store.get("a"), Some(&Value::Int(1)));
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn unset_reports_removed_value() {
    let mut store = AttributeStore::with_defaults(attributes([("a", 1)]));
    let changes = store.set(attributes([("a", Value::Nil)]), SetOptions::unset());

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].old, Some(Value::Int(1)));
    assert_eq!(changes[0].new, None);
    assert_eq!(store.previous("a"), Some(&Value::Int(1)));
}

#[test]
fn clear_forgets_everything() {
    let mut store = AttributeStore::with_defaults(attributes([("a", 1)]));
    store.set(attributes([("a", 2)]), SetOptions::default());
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.changed().count(), 0);
    assert_eq!(store.previous("a"), None);
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn snapshot_preserves_order() {
    let mut store = AttributeStore::new();
    store.set(attributes([("z", 1), ("a", 2)]), SetOptions::default());
    let keys: Vec<_> = store.snapshot().keys().cloned().collect();
    assert_eq!(keys, ["z", "a"]);
    assert_eq!(store.iter().count(), 2);
}

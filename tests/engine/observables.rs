//! Integration tests for observable cells
//!
//! Tests declaration, reads, writes, and change notification.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_engine::{CellKind, ComputedSpec, Model};
use bindery_foundation::{Value, attributes};
use bindery_storage::SetOptions;

/// Helper to build a model with the two observables used throughout
fn selectable() -> Model {
    Model::builder()
        .attribute("firstName", "Charlie")
        .observable("isSelected", false)
        .observable("testArray", Value::empty_list())
        .build()
        .unwrap()
}

fn count_events(model: &Model, event: &str) -> Rc<RefCell<usize>> {
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    model.on(event, move |_e| {
        *sink.borrow_mut() += 1;
        Ok(())
    });
    count
}

fn event_order(model: &Model, events: &[&str]) -> Rc<RefCell<Vec<String>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for event in events {
        let sink = Rc::clone(&log);
        model.on(*event, move |e| {
            sink.borrow_mut().push(e.name.to_string());
            Ok(())
        });
    }
    log
}

// =============================================================================
// Declaration
// =============================================================================

#[test]
fn declared_observable_is_readable() {
    let model = selectable();
    assert_eq!(model.get("isSelected"), Value::Bool(false));
    assert!(model.has_observable("isSelected"));
    assert!(!model.has_computed("isSelected"));
}

#[test]
fn observable_cell_is_directly_accessible() {
    let model = selectable();
    let cell = model.cell("isSelected").unwrap();
    assert_eq!(cell.kind(), CellKind::Observable);
    assert_eq!(cell.get(false).unwrap(), Value::Bool(false));

    cell.set(Value::Bool(true)).unwrap();
    assert_eq!(cell.get(false).unwrap(), Value::Bool(true));
    assert_eq!(model.get("isSelected"), Value::Bool(true));
}

#[test]
fn observables_are_not_native_attributes() {
    let model = selectable();
    let native = model.to_attributes(false);
    assert!(native.contains_key("firstName"));
    assert!(!native.contains_key("isSelected"));
    assert!(model.to_attributes(true).contains_key("isSelected"));
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn set_routes_to_observable() {
    let model = selectable();
    model.set("isSelected", true).unwrap();
    assert_eq!(model.get("isSelected"), Value::Bool(true));
}

#[test]
fn equal_write_fires_nothing() {
    let model = selectable();
    let count = count_events(&model, "change:isSelected");

    model.set("isSelected", false).unwrap();
    assert_eq!(*count.borrow(), 0);

    model.set("isSelected", true).unwrap();
    model.set("isSelected", true).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn observable_change_also_fires_general_change() {
    let model = selectable();
    let count = count_events(&model, "change");
    model.set("isSelected", true).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn observable_change_fires_general_before_attribute_event() {
    let model = selectable();
    let log = event_order(&model, &["change:isSelected", "change"]);
    model.set("isSelected", true).unwrap();
    assert_eq!(*log.borrow(), ["change", "change:isSelected"]);
}

#[test]
fn computed_change_fires_general_before_attribute_event() {
    let model = selectable();
    model
        .add_computed(
            "label",
            ComputedSpec::new(|cx| if cx.get("isSelected").is_truthy() { "on" } else { "off" }),
        )
        .unwrap();
    let log = event_order(&model, &["change:label", "change:isSelected", "change"]);

    model.set("isSelected", true).unwrap();
    // `label` subscribed first, so its events nest inside the
    // `change:isSelected` dispatch.
    assert_eq!(
        *log.borrow(),
        ["change", "change", "change:label", "change:isSelected"]
    );
}

#[test]
fn general_change_listener_sees_stale_computed() {
    let model = selectable();
    model
        .add_computed("selected", ComputedSpec::new(|cx| cx.get("isSelected")))
        .unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let reader = model.downgrade();
    model.on("change", move |_e| {
        if let Some(model) = reader.upgrade() {
            sink.borrow_mut().push(model.get("selected"));
        }
        Ok(())
    });

    model.set("isSelected", true).unwrap();
    assert_eq!(*seen.borrow(), [Value::Bool(false), Value::Bool(true)]);
}

#[test]
fn modify_list_fires_general_before_attribute_event() {
    let model = selectable();
    let log = event_order(&model, &["change:testArray", "change"]);
    model
        .modify_list("testArray", |items| items.push(Value::Int(1)))
        .unwrap();
    assert_eq!(*log.borrow(), ["change", "change:testArray"]);
}

#[test]
fn silent_option_does_not_silence_cells() {
    let model = selectable();
    let count = count_events(&model, "change:isSelected");
    model
        .set_with("isSelected", true, SetOptions::silent())
        .unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn add_observable_at_runtime() {
    let model = Model::new();
    model.add_observable("count", 0).unwrap();
    model.set("count", 3).unwrap();
    assert_eq!(model.get("count"), Value::Int(3));
}

#[test]
fn add_observable_replaces_native_value() {
    let model = Model::with_attributes(attributes([("count", 10)]));
    model.add_observable("count", 0).unwrap();
    assert_eq!(model.get("count"), Value::Int(0));
    assert!(model.to_attributes(false).is_empty());
}

// =============================================================================
// In-place edits
// =============================================================================

#[test]
fn modify_list_pushes_into_observable() {
    let model = selectable();
    let count = count_events(&model, "change:testArray");

    model
        .modify_list("testArray", |items| items.push(Value::from("beachball")))
        .unwrap();

    assert_eq!(model.get("testArray"), Value::from(vec!["beachball"]));
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn modify_list_on_non_list_is_deferred() {
    let model = selectable();
    let result = model
        .modify_list("isSelected", |items| items.push(Value::from("beachball")))
        .unwrap();
    assert!(result.is_none());
    assert_eq!(model.get("isSelected"), Value::Bool(false));
}

#[test]
fn modify_map_on_observable() {
    let model = Model::builder()
        .observable("prefs", Value::empty_map())
        .build()
        .unwrap();
    let count = count_events(&model, "change:prefs");

    model
        .modify_map("prefs", "theme", Some(Value::from("dark")))
        .unwrap();
    model
        .modify_map("prefs", "theme", Some(Value::from("dark")))
        .unwrap();

    assert_eq!(
        model.get("prefs"),
        [("theme", "dark")].into_iter().collect::<Value>()
    );
    assert_eq!(*count.borrow(), 1);
}

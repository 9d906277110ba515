//! Integration tests for bindings
//!
//! Tests that handlers follow attribute values and stop on disposal.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_engine::{Binding, ComputedSpec, Model};
use bindery_foundation::Value;

fn rendered(model: &Model, attribute: &str) -> (Binding, Rc<RefCell<String>>) {
    let text = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&text);
    let binding = Binding::new(model, attribute, move |v| *sink.borrow_mut() = v.to_string());
    (binding, text)
}

fn person() -> Model {
    Model::builder()
        .attribute("firstName", "Luke")
        .attribute("lastName", "Skywalker")
        .computed(
            "nameDisplay",
            ComputedSpec::new(|cx| format!("{}, {}", cx.get("lastName"), cx.get("firstName"))),
        )
        .computed(
            "errorDisplay",
            ComputedSpec::new(|cx| {
                let missing = |v: Value| v.as_str().is_none_or(str::is_empty);
                if missing(cx.get("firstName")) || missing(cx.get("lastName")) {
                    "block"
                } else {
                    "none"
                }
            }),
        )
        .build()
        .unwrap()
}

#[test]
fn binding_renders_immediately() {
    let model = person();
    let (_binding, text) = rendered(&model, "nameDisplay");
    assert_eq!(*text.borrow(), "Skywalker, Luke");
}

#[test]
fn binding_follows_computed_changes() {
    let model = person();
    let (name, name_text) = rendered(&model, "nameDisplay");
    let (_error, error_text) = rendered(&model, "errorDisplay");

    model.set("firstName", "").unwrap();
    assert_eq!(*name_text.borrow(), "Skywalker, ");
    assert_eq!(*error_text.borrow(), "block");
    assert_eq!(name.value(), Value::from("Skywalker, "));

    model.set("firstName", "Leia").unwrap();
    assert_eq!(*error_text.borrow(), "none");
}

#[test]
fn disposed_binding_is_inert() {
    let model = person();
    let (binding, text) = rendered(&model, "nameDisplay");
    binding.dispose();

    model.set("firstName", "Anakin").unwrap();
    assert_eq!(*text.borrow(), "Skywalker, Luke");
    binding.refresh();
    assert_eq!(*text.borrow(), "Skywalker, Luke");
}

#[test]
fn dropping_bindings_detaches_listeners() {
    let model = person();
    let before = model.events().len();
    {
        let _a = rendered(&model, "nameDisplay");
        let _b = rendered(&model, "firstName");
        assert_eq!(model.events().len(), before + 2);
    }
    assert_eq!(model.events().len(), before);
}

#[test]
fn two_way_binding_writes_back() {
    let model = person();
    let (input, _text) = rendered(&model, "firstName");
    let (_display, display_text) = rendered(&model, "nameDisplay");

    input.write("Han").unwrap();
    assert_eq!(model.get("firstName"), Value::from("Han"));
    assert_eq!(*display_text.borrow(), "Skywalker, Han");
}

#[test]
fn binding_outlives_model() {
    let model = person();
    let (binding, _text) = rendered(&model, "firstName");
    drop(model);
    assert!(!binding.is_active());
    assert!(binding.write("x").is_ok());
}

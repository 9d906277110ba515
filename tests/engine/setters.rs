//! Integration tests for computed setters and deep-set
//!
//! Tests read-only rejection, redirected writes, cross-setting, and circular
//! setter detection.

use std::cell::RefCell;
use std::rc::Rc;

use bindery_engine::{ComputedSpec, Model};
use bindery_foundation::{Error, ErrorKind, Result, Value, attributes};
use bindery_storage::SetOptions;

/// Helper: `paymentCurrency` reads as "$<payment>" and parses writes back
fn payment_currency() -> ComputedSpec {
    ComputedSpec::new(|cx| format!("${}", cx.get("payment"))).with_setter(|_model, value| {
        let Some(text) = value.as_str() else {
            return Ok(None);
        };
        let amount = text
            .trim_start_matches('$')
            .parse::<i64>()
            .map_err(|e| Error::setter_failed("paymentCurrency", e.to_string()))?;
        Ok(Some(attributes([("payment", amount)])))
    })
}

fn ledger() -> Model {
    Model::builder()
        .attribute("firstName", "Charlie")
        .attribute("lastName", "Brown")
        .attribute("payment", 100)
        .observable("isSelected", false)
        .computed(
            "fullName",
            ComputedSpec::new(|cx| format!("{} {}", cx.get("firstName"), cx.get("lastName"))),
        )
        .computed("paymentCurrency", payment_currency())
        .build()
        .unwrap()
}

fn redirect(target: &'static str, value: impl Into<Value> + Clone + 'static) -> ComputedSpec {
    ComputedSpec::new(|_cx| "Nothing")
        .with_setter(move |_model, _v| Ok(Some(attributes([(target, value.clone())]))))
}

// =============================================================================
// Read-only
// =============================================================================

#[test]
fn writing_read_only_computed_fails() {
    let model = ledger();
    let err = model.set("fullName", "Charlie Black").unwrap_err();

    assert!(err.is_read_only_computed());
    assert_eq!(
        err.to_string(),
        "cannot set read-only computed observable: fullName"
    );
    assert_eq!(model.get("fullName"), Value::from("Charlie Brown"));
    assert_eq!(model.get("lastName"), Value::from("Brown"));
}

#[test]
fn failed_batch_leaves_native_store_untouched() {
    let model = ledger();
    let err = model
        .set_many(
            attributes([
                ("lastName", Value::from("Black")),
                ("isSelected", Value::Bool(true)),
                ("fullName", Value::from("x")),
            ]),
            SetOptions::default(),
        )
        .unwrap_err();

    assert!(err.is_read_only_computed());
    assert_eq!(model.get("lastName"), Value::from("Brown"));
    assert_eq!(model.get("fullName"), Value::from("Charlie Brown"));
    // Cells written before the failure keep their new value.
    assert_eq!(model.get("isSelected"), Value::Bool(true));
}

// =============================================================================
// Redirected writes
// =============================================================================

#[test]
fn setter_redirects_into_native_attribute() {
    let model = ledger();
    assert_eq!(model.get("payment"), Value::Int(100));

    model.set("paymentCurrency", "$200").unwrap();
    assert_eq!(model.get("payment"), Value::Int(200));
    assert_eq!(model.get("paymentCurrency"), Value::from("$200"));
}

#[test]
fn setter_returning_none_writes_nothing() {
    let model = ledger();
    model.set("paymentCurrency", Value::Nil).unwrap();
    assert_eq!(model.get("payment"), Value::Int(100));
}

#[test]
fn setter_errors_propagate() {
    let model = ledger();
    let err = model.set("paymentCurrency", "$lots").unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::SetterFailed { ref attribute, .. } if attribute == "paymentCurrency"
    ));
    assert_eq!(model.get("payment"), Value::Int(100));
}

#[test]
fn cross_setter_fires_target_change_in_same_write() {
    let model = ledger();
    model
        .add_computed(
            "crossSetter",
            ComputedSpec::new(|cx| cx.get("isSelected"))
                .with_setter(|_model, _value| Ok(Some(attributes([("isSelected", true)])))),
        )
        .unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    model.on("change:isSelected", move |e| {
        sink.borrow_mut().push(e.name.to_string());
        Ok(())
    });

    assert_eq!(model.get("crossSetter"), Value::Bool(false));
    model.set("crossSetter", true).unwrap();

    assert_eq!(model.get("isSelected"), Value::Bool(true));
    assert_eq!(model.get("crossSetter"), Value::Bool(true));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn params_computed_with_deps_and_setter() {
    let model = ledger();
    model
        .add_computed(
            "addedProp",
            ComputedSpec::new(|cx| {
                if cx.get("payment").as_int().unwrap_or(0) > 50 {
                    cx.get("firstName")
                } else {
                    cx.get("lastName")
                }
            })
            .with_deps(["payment", "firstName", "lastName"])
            .with_setter(|_model, value| Ok(Some(attributes([("payment", value)])))),
        )
        .unwrap();

    assert_eq!(model.get("addedProp"), Value::from("Charlie"));
    model.set("payment", 0).unwrap();
    assert_eq!(model.get("addedProp"), Value::from("Brown"));
    model.set("lastName", "Black").unwrap();
    assert_eq!(model.get("addedProp"), Value::from("Black"));

    model.set("addedProp", 123).unwrap();
    assert_eq!(model.get("payment"), Value::Int(123));
}

#[test]
fn setter_may_read_its_model() {
    let model = ledger();
    model
        .add_computed(
            "bump",
            ComputedSpec::new(|cx| cx.get("payment")).with_setter(|model: &Model, by: Value| -> Result<_> {
                let current = model.get("payment").as_int().unwrap_or(0);
                Ok(Some(attributes([("payment", current + by.as_int().unwrap_or(0))])))
            }),
        )
        .unwrap();

    model.set("bump", 5).unwrap();
    assert_eq!(model.get("payment"), Value::Int(105));
}

// =============================================================================
// Circular setters
// =============================================================================

#[test]
fn circular_setters_are_rejected() {
    let model = ledger();
    model
        .add_computed("loopSetter1", redirect("loopSetter2", false))
        .unwrap();
    model
        .add_computed("loopSetter2", redirect("loopSetter1", false))
        .unwrap();

    let err = model.set("loopSetter1", true).unwrap_err();
    assert!(err.is_circular_setter());
    assert_eq!(
        err.to_string(),
        "circular setter: loopSetter1 > loopSetter2"
    );

    let err = model.set("loopSetter2", true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "circular setter: loopSetter2 > loopSetter1"
    );
}

#[test]
fn circular_detection_leaves_native_store_untouched() {
    let model = ledger();
    model
        .add_computed(
            "a",
            ComputedSpec::new(|_cx| 0).with_setter(|_model, v| {
                Ok(Some(attributes([("payment", Value::Int(999)), ("b", v)])))
            }),
        )
        .unwrap();
    model.add_computed("b", redirect("a", 1)).unwrap();

    assert!(model.set("a", 1).unwrap_err().is_circular_setter());
    assert_eq!(model.get("payment"), Value::Int(100));
    assert_eq!(model.get("paymentCurrency"), Value::from("$100"));
}

#[test]
fn diamond_redirects_are_not_cycles() {
    let model = ledger();
    model
        .add_computed("left", redirect("payment", 1))
        .unwrap();
    model
        .add_computed("right", redirect("payment", 2))
        .unwrap();
    model
        .add_computed(
            "both",
            ComputedSpec::new(|_cx| 0).with_setter(|_model, _v| {
                Ok(Some(attributes([("left", 0), ("right", 0)])))
            }),
        )
        .unwrap();

    model.set("both", 0).unwrap();
    assert_eq!(model.get("payment"), Value::Int(2));
}

#[test]
fn unset_bypasses_setters() {
    let model = ledger();
    model.add_computed("loop", redirect("loop", 0)).unwrap();
    model.set_with("loop", 0, SetOptions::unset()).unwrap();
    assert!(model.has_computed("loop"));

    model.unset("payment").unwrap();
    assert!(!model.has("payment"));
    assert_eq!(model.get("paymentCurrency"), Value::from("$nil"));
}

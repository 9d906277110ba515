//! Property tests across models and bindings
//!
//! Arbitrary write sequences must leave every computed and every binding
//! agreeing with a direct evaluation of the current attributes.

use std::cell::RefCell;
use std::rc::Rc;

use bindery::{Binding, ComputedSpec, Model, Value, attributes};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Write {
    First(String),
    Last(String),
    Rate(i64),
    Payment(i64),
}

fn write() -> impl Strategy<Value = Write> {
    prop_oneof![
        "[A-Z][a-z]{0,6}".prop_map(Write::First),
        "[A-Z][a-z]{0,6}".prop_map(Write::Last),
        (1i64..10).prop_map(Write::Rate),
        (0i64..1000).prop_map(Write::Payment),
    ]
}

proptest! {
    #[test]
    fn computeds_and_bindings_track_every_write(writes in prop::collection::vec(write(), 0..24)) {
        let rates = Model::with_attributes(attributes([("rate", 2)]));
        let remote = rates.clone();
        let model = Model::builder()
            .attribute("firstName", "Charlie")
            .attribute("lastName", "Brown")
            .attribute("payment", 100)
            .computed(
                "fullName",
                ComputedSpec::new(|cx| format!("{} {}", cx.get("firstName"), cx.get("lastName"))),
            )
            .computed(
                "owed",
                ComputedSpec::new(move |cx| {
                    cx.get("payment").as_int().unwrap_or(0) * cx.get_from(&remote, "rate").as_int().unwrap_or(0)
                }),
            )
            .build()
            .unwrap();

        let shown = Rc::new(RefCell::new(Value::Nil));
        let sink = Rc::clone(&shown);
        let _binding = Binding::new(&model, "owed", move |v| *sink.borrow_mut() = v.clone());

        for w in writes {
            match w {
                Write::First(name) => model.set("firstName", name).unwrap(),
                Write::Last(name) => model.set("lastName", name).unwrap(),
                Write::Rate(rate) => rates.set("rate", rate).unwrap(),
                Write::Payment(amount) => model.set("payment", amount).unwrap(),
            }
        }

        let expected_name = format!("{} {}", model.get("firstName"), model.get("lastName"));
        let expected_owed = model.get("payment").as_int().unwrap_or(0) * rates.get("rate").as_int().unwrap_or(0);
        prop_assert_eq!(model.get("fullName"), Value::from(expected_name));
        prop_assert_eq!(model.get("owed"), Value::Int(expected_owed));
        prop_assert_eq!(shown.borrow().clone(), Value::Int(expected_owed));
    }
}

//! View-side consumers of attribute values.
//!
//! A [`Binding`] pushes one attribute's value into a handler now and again
//! on every `change:<name>` event, until it is disposed or dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use bindery_foundation::{AttrName, Result, Value};
use bindery_storage::{Event, EventHandler, ListenerId, change_event};

use crate::model::{Model, WeakModel};

struct BindingInner {
    model: WeakModel,
    attribute: AttrName,
    listener: RefCell<Option<ListenerId>>,
    value: RefCell<Value>,
    handler: Box<dyn Fn(&Value)>,
}

impl BindingInner {
    fn pull(&self) {
        let Some(model) = self.model.upgrade() else {
            return;
        };
        let value = model.get(&self.attribute);
        *self.value.borrow_mut() = value.clone();
        (self.handler)(&value);
    }
}

/// Keeps a handler in sync with one attribute of a model.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use bindery_engine::{Binding, Model};
/// use bindery_foundation::{Value, attributes};
///
/// let model = Model::with_attributes(attributes([("title", "Peanuts")]));
/// let shown = Rc::new(RefCell::new(String::new()));
/// let sink = Rc::clone(&shown);
/// let binding = Binding::new(&model, "title", move |v| *sink.borrow_mut() = v.to_string());
///
/// model.set("title", "Snoopy").unwrap();
/// assert_eq!(*shown.borrow(), "Snoopy");
/// drop(binding);
/// ```
pub struct Binding {
    inner: Rc<BindingInner>,
}

impl Binding {
    /// Reads `attribute` into `handler` immediately and on every change.
    pub fn new(model: &Model, attribute: impl Into<AttrName>, handler: impl Fn(&Value) + 'static) -> Self {
        let inner = Rc::new(BindingInner {
            model: model.downgrade(),
            attribute: attribute.into(),
            listener: RefCell::new(None),
            value: RefCell::new(Value::Nil),
            handler: Box::new(handler),
        });

        inner.pull();

        let weak = Rc::downgrade(&inner);
        let on_change: EventHandler = Rc::new(move |_event: &Event<'_>| {
            if let Some(inner) = weak.upgrade() {
                inner.pull();
            }
            Ok(())
        });
        let listener = model.events().on(change_event(&inner.attribute), on_change);
        *inner.listener.borrow_mut() = Some(listener);

        Self { inner }
    }

    /// The bound attribute.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.inner.attribute
    }

    /// The value most recently pushed to the handler.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Returns true until the binding is disposed or its model dropped.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.listener.borrow().is_some() && self.inner.model.upgrade().is_some()
    }

    /// Re-reads the attribute and calls the handler.
    pub fn refresh(&self) {
        if self.inner.listener.borrow().is_some() {
            self.inner.pull();
        }
    }

    /// Writes a value back into the bound attribute.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Model::set`]. Writing through a disposed
    /// binding is a no-op.
    pub fn write(&self, value: impl Into<Value>) -> Result<()> {
        if self.inner.listener.borrow().is_none() {
            return Ok(());
        }
        match self.inner.model.upgrade() {
            Some(model) => model.set(self.inner.attribute.clone(), value),
            None => Ok(()),
        }
    }

    /// Stops listening for changes.
    pub fn dispose(&self) {
        let listener = self.inner.listener.borrow_mut().take();
        if let (Some(listener), Some(model)) = (listener, self.inner.model.upgrade()) {
            model.off(listener);
        }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("model", &self.inner.model.id())
            .field("attribute", &self.inner.attribute)
            .field("value", &*self.inner.value.borrow())
            .field("active", &self.is_active())
            .finish()
    }
}

//! Named-event subscription and synchronous dispatch.
//!
//! Every model owns one [`Events`] registry. Handlers are invoked inline, in
//! registration order, before [`Events::trigger`] returns. The registry never
//! holds a borrow while a handler runs, so handlers may subscribe,
//! unsubscribe, and trigger further events re-entrantly.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use bindery_foundation::{ModelId, Result};

/// Prefix of per-attribute change events.
pub const CHANGE_PREFIX: &str = "change:";

/// General change event, fired once after any effective change.
pub const CHANGE: &str = "change";

/// Returns the per-attribute change event name for `attribute`.
///
/// Names that already carry the `change:` prefix are returned unchanged, so
/// callers may pass either form.
#[must_use]
pub fn change_event(attribute: &str) -> String {
    if attribute.starts_with(CHANGE_PREFIX) {
        attribute.to_string()
    } else {
        format!("{CHANGE_PREFIX}{attribute}")
    }
}

/// A dispatched event.
#[derive(Clone, Copy, Debug)]
pub struct Event<'a> {
    /// Event name, e.g. `change` or `change:firstName`.
    pub name: &'a str,
    /// The model that emitted the event.
    pub source: ModelId,
}

impl Event<'_> {
    /// Returns the attribute for a `change:<attribute>` event.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.name.strip_prefix(CHANGE_PREFIX)
    }
}

/// Event handler. Errors abort the current dispatch and surface from
/// [`Events::trigger`].
pub type EventHandler = Rc<dyn Fn(&Event<'_>) -> Result<()>>;

/// Identifies one registered listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    event: String,
    handler: EventHandler,
}

/// Event registry for a single model.
pub struct Events {
    source: ModelId,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
}

impl Events {
    /// Creates an empty registry emitting on behalf of `source`.
    #[must_use]
    pub fn new(source: ModelId) -> Self {
        Self {
            source,
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Returns the emitting model.
    #[must_use]
    pub fn source(&self) -> ModelId {
        self.source
    }

    /// Registers `handler` for `event`.
    pub fn on(&self, event: impl Into<String>, handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Listener {
            id,
            event: event.into(),
            handler,
        });
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Removes every listener for `event`. Returns the number removed.
    pub fn off_event(&self, event: &str) -> usize {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|l| l.event != event);
        before - listeners.len()
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.event == event)
            .count()
    }

    /// Total number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns true if no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|l| l.id == id)
    }

    /// Dispatches a space-separated list of events, in order.
    ///
    /// Each event's listeners are snapshotted before dispatch; listeners
    /// added during dispatch do not see the current event, and listeners
    /// removed during dispatch are skipped.
    ///
    /// # Errors
    ///
    /// Returns the first handler error. Remaining handlers and events are not
    /// dispatched.
    pub fn trigger(&self, events: &str) -> Result<()> {
        for name in events.split_whitespace() {
            let snapshot: Vec<(ListenerId, EventHandler)> = self
                .listeners
                .borrow()
                .iter()
                .filter(|l| l.event == name)
                .map(|l| (l.id, Rc::clone(&l.handler)))
                .collect();

            if snapshot.is_empty() {
                continue;
            }
            tracing::trace!(source = %self.source, event = name, listeners = snapshot.len(), "dispatch");

            let event = Event {
                name,
                source: self.source,
            };
            for (id, handler) in snapshot {
                if self.is_registered(id) {
                    handler(&event)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.borrow();
        f.debug_struct("Events")
            .field("source", &self.source)
            .field(
                "listeners",
                &listeners.iter().map(|l| l.event.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

//! Observable and computed cells.
//!
//! A cell overlays one attribute of a model. Observable cells hold a value
//! set directly; computed cells derive theirs from a getter and stay current
//! by subscribing to the `change:` events of everything the getter read
//! during initialization.
//!
//! Cells keep only weak handles to their owner and their dependency targets,
//! and listeners keep only weak handles to cells, so no reference cycle is
//! formed through the event graph.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_foundation::{
    AttrName, Attributes, Error, ErrorContext, ModelId, Result, SemanticLimit, Value,
};
use bindery_storage::{Event, EventHandler, ListenerId};
use indexmap::IndexMap;

use crate::computed::{ComputedSpec, Getter, Setter};
use crate::model::{Model, ModelInner};
use crate::recorder::{Dependency, DependencyRecorder, Scope};

// =============================================================================
// Cell Kind
// =============================================================================

/// What kind of cell overlays an attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// A plain value with change notification.
    Observable,
    /// A getter with no setter.
    ReadOnlyComputed,
    /// A getter with a setter.
    Computed,
}

impl CellKind {
    /// Returns true for either computed kind.
    #[must_use]
    pub fn is_computed(self) -> bool {
        !matches!(self, Self::Observable)
    }
}

// =============================================================================
// Cell
// =============================================================================

struct Subscription {
    target: Weak<ModelInner>,
    target_id: ModelId,
    event: String,
    listener: ListenerId,
}

struct CellInner {
    name: AttrName,
    owner: RefCell<Weak<ModelInner>>,
    value: RefCell<Value>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    /// Manually declared dependencies.
    deps: Vec<Dependency>,
    subscriptions: RefCell<Vec<Subscription>>,
    /// Current nesting of `update` on this cell.
    depth: std::cell::Cell<usize>,
    initialized: std::cell::Cell<bool>,
    disposed: std::cell::Cell<bool>,
}

/// A reactive attribute cell. Cloning yields another handle to the same cell.
#[derive(Clone)]
pub struct Cell {
    inner: Rc<CellInner>,
}

impl Cell {
    pub(crate) fn observable(owner: &Model, name: impl Into<AttrName>, value: Value) -> Self {
        Self::build(owner, name.into(), value, None, None, Vec::new())
    }

    pub(crate) fn computed(owner: &Model, name: impl Into<AttrName>, spec: ComputedSpec) -> Self {
        let ComputedSpec {
            getter,
            setter,
            deps,
        } = spec;
        Self::build(owner, name.into(), Value::Nil, Some(getter), setter, deps)
    }

    fn build(
        owner: &Model,
        name: AttrName,
        value: Value,
        getter: Option<Getter>,
        setter: Option<Setter>,
        deps: Vec<Dependency>,
    ) -> Self {
        Self {
            inner: Rc::new(CellInner {
                name,
                owner: RefCell::new(owner.downgrade().into_inner()),
                value: RefCell::new(value),
                getter,
                setter,
                deps,
                subscriptions: RefCell::new(Vec::new()),
                depth: std::cell::Cell::new(0),
                initialized: std::cell::Cell::new(false),
                disposed: std::cell::Cell::new(false),
            }),
        }
    }

    /// The attribute this cell overlays.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The kind of cell.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        match (&self.inner.getter, &self.inner.setter) {
            (None, _) => CellKind::Observable,
            (Some(_), None) => CellKind::ReadOnlyComputed,
            (Some(_), Some(_)) => CellKind::Computed,
        }
    }

    /// Returns true if the cell has a getter.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.inner.getter.is_some()
    }

    /// Returns true once `init` has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.get()
    }

    /// Returns true once the cell has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// The owning model, unless the cell was disposed or the model dropped.
    #[must_use]
    pub fn owner(&self) -> Option<Model> {
        self.inner.owner.borrow().upgrade().map(Model::from_inner)
    }

    /// The cached value. Never recomputes.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// Returns the value, recomputing it first when `force_recompute` is set
    /// and the cell has a getter.
    ///
    /// A recompute that produces a different value fires
    /// `change change:<name>` on the owner.
    ///
    /// # Errors
    ///
    /// Returns any error raised by listeners of the fired change events.
    pub fn get(&self, force_recompute: bool) -> Result<Value> {
        if force_recompute && self.is_computed() {
            if let Some(owner) = self.owner() {
                if let Some(value) = self.evaluate(&owner, None) {
                    self.change(&owner, value)?;
                }
            }
        }
        Ok(self.value())
    }

    /// Writes to the cell.
    ///
    /// Observable cells store the value and fire change if it differs.
    /// Computed cells hand the value to their setter and return whatever
    /// attributes it redirects the write into.
    ///
    /// # Errors
    ///
    /// Returns `ReadOnlyComputed` for a computed cell without a setter, or
    /// any error from the setter or from change listeners.
    pub fn set(&self, value: Value) -> Result<Option<Attributes>> {
        let Some(owner) = self.owner() else {
            return Ok(None);
        };

        if self.inner.getter.is_none() {
            self.change(&owner, value)?;
            return Ok(None);
        }

        match &self.inner.setter {
            Some(setter) => setter(&owner, value),
            None => Err(Error::read_only_computed(self.name()).with_context(
                ErrorContext::new()
                    .with_model(owner.id())
                    .with_attribute(self.name()),
            )),
        }
    }

    /// Computes the initial value and subscribes to every dependency.
    ///
    /// Runs the getter with a recording scope seeded with the declared
    /// dependencies. Calling `init` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns any error raised by listeners of the fired change events.
    pub fn init(&self) -> Result<()> {
        if self.inner.initialized.replace(true) || self.inner.getter.is_none() {
            return Ok(());
        }
        let Some(owner) = self.owner() else {
            return Ok(());
        };

        let (value, deps) =
            DependencyRecorder::record(owner.id(), self.inner.deps.clone(), |recorder| {
                self.evaluate(&owner, Some(recorder))
            });
        self.subscribe(&owner, &deps);

        tracing::debug!(
            model = %owner.id(),
            attribute = %self.inner.name,
            dependencies = self.inner.subscriptions.borrow().len(),
            "computed initialized"
        );

        match value {
            Some(value) => self.change(&owner, value),
            None => Ok(()),
        }
    }

    /// Recomputes in response to a dependency change.
    ///
    /// # Errors
    ///
    /// Returns `LimitExceeded` if this cell re-enters its own update more
    /// than the owner's `max_recompute_depth` allows.
    pub fn update(&self) -> Result<()> {
        let Some(owner) = self.owner() else {
            return Ok(());
        };
        let config = owner.config();
        let limit = config.max_recompute_depth;
        let depth = self.inner.depth.get();
        if depth >= limit {
            tracing::warn!(
                model = %owner.id(),
                attribute = %self.inner.name,
                limit,
                "recompute depth exceeded"
            );
            return Err(Error::limit_exceeded(SemanticLimit::MaxRecomputeDepth {
                limit,
                attribute: self.inner.name.clone(),
            })
            .with_context(
                ErrorContext::new()
                    .with_model(owner.id())
                    .with_attribute(self.name()),
            ));
        }

        if config.trace_propagation {
            tracing::debug!(model = %owner.id(), attribute = %self.inner.name, depth, "recompute");
        } else {
            tracing::trace!(model = %owner.id(), attribute = %self.inner.name, depth, "recompute");
        }

        let _guard = DepthGuard::enter(&self.inner.depth);
        self.get(true).map(|_| ())
    }

    /// The events this cell listens to, as `(model, event)` pairs in
    /// subscription order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<(ModelId, String)> {
        self.inner
            .subscriptions
            .borrow()
            .iter()
            .map(|s| (s.target_id, s.event.clone()))
            .collect()
    }

    /// Detaches every listener and releases the owner and value.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        tracing::debug!(attribute = %self.inner.name, "cell disposed");
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        for subscription in subscriptions {
            if let Some(target) = subscription.target.upgrade() {
                target.events.off(subscription.listener);
            }
        }
        *self.inner.owner.borrow_mut() = Weak::new();
        *self.inner.value.borrow_mut() = Value::Nil;
    }

    /// Overwrites the cached value without comparing or notifying.
    pub(crate) fn replace_value(&self, value: Value) {
        *self.inner.value.borrow_mut() = value;
    }

    /// Stores `value` and notifies the owner if it differs from the cache.
    fn change(&self, owner: &Model, value: Value) -> Result<()> {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return Ok(());
            }
            *current = value;
        }
        owner.fire_change(&self.inner.name)
    }

    fn evaluate(&self, owner: &Model, recorder: Option<&mut DependencyRecorder>) -> Option<Value> {
        let getter = self.inner.getter.as_ref()?;
        let mut scope = Scope::new(owner, recorder);
        scope.inject(&self.inner.deps);
        Some(getter(&mut scope))
    }

    /// Subscribes `update` to each distinct `(target, event)` pair.
    fn subscribe(&self, owner: &Model, deps: &[Dependency]) {
        let mut targets: IndexMap<String, Vec<Model>> = IndexMap::new();
        for dep in deps {
            let Some(target) = dep.resolve(owner) else {
                continue;
            };
            let models = targets.entry(dep.event()).or_default();
            if !models.iter().any(|m| m.id() == target.id()) {
                models.push(target);
            }
        }

        let weak = Rc::downgrade(&self.inner);
        let handler: EventHandler = Rc::new(move |_event: &Event<'_>| match weak.upgrade() {
            Some(inner) => Cell { inner }.update(),
            None => Ok(()),
        });

        let mut subscriptions = self.inner.subscriptions.borrow_mut();
        for (event, models) in targets {
            for model in models {
                let listener = model.events().on(event.clone(), Rc::clone(&handler));
                subscriptions.push(Subscription {
                    target: model.downgrade().into_inner(),
                    target_id: model.id(),
                    event: event.clone(),
                    listener,
                });
            }
        }
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("name", &self.inner.name)
            .field("kind", &self.kind())
            .field("value", &*self.inner.value.borrow())
            .field("dependencies", &self.dependencies())
            .finish()
    }
}

/// Restores a cell's recompute depth when an update unwinds.
struct DepthGuard<'a> {
    depth: &'a std::cell::Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a std::cell::Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

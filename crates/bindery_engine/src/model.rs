//! The entity attribute table.
//!
//! A [`Model`] is a native attribute store overlaid with cells. Reads return
//! the cell value when a cell exists and the native value otherwise. Writes
//! are routed through **deep-set**: values aimed at computed cells are handed
//! to their setters, whose redirected attributes are resolved recursively,
//! and only the plain attributes left at the end reach the native store.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use bindery_foundation::{
    AttrName, Attributes, Error, ErrorContext, ModelId, Result, SemanticLimit, Value,
};
use bindery_storage::{
    AttributeStore, CHANGE, Event, EventHandler, Events, ListenerId, SetOptions, change_event,
};
use indexmap::IndexMap;

use crate::cell::{Cell, CellKind};
use crate::computed::ComputedSpec;
use crate::config::EngineConfig;

// =============================================================================
// Model
// =============================================================================

pub(crate) struct ModelInner {
    id: ModelId,
    config: EngineConfig,
    store: RefCell<AttributeStore>,
    cells: RefCell<IndexMap<AttrName, Cell>>,
    pub(crate) events: Events,
    /// Set while the builder runs its second pass; cells added meanwhile are
    /// initialized by the builder instead of immediately.
    initializing: std::cell::Cell<bool>,
    destroyed: std::cell::Cell<bool>,
}

/// A shared handle to an entity's attributes, cells, and events.
///
/// Cloning a `Model` yields another handle to the same entity.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

/// A non-owning handle to a [`Model`].
#[derive(Clone, Debug)]
pub struct WeakModel(Weak<ModelInner>);

impl WeakModel {
    /// Returns the model if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Model> {
        self.0.upgrade().map(Model::from_inner)
    }

    /// The model's id, if it is still alive.
    #[must_use]
    pub fn id(&self) -> Option<ModelId> {
        self.0.upgrade().map(|inner| inner.id)
    }

    pub(crate) fn into_inner(self) -> Weak<ModelInner> {
        self.0
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates an empty model with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Attributes::new(), EngineConfig::default())
    }

    /// Creates a model holding `attrs` as native attributes.
    #[must_use]
    pub fn with_attributes(attrs: Attributes) -> Self {
        Self::with_config(attrs, EngineConfig::default())
    }

    /// Creates a model with native attributes and a configuration.
    #[must_use]
    pub fn with_config(attrs: Attributes, config: EngineConfig) -> Self {
        let id = ModelId::next();
        Self {
            inner: Rc::new(ModelInner {
                id,
                config,
                store: RefCell::new(AttributeStore::with_defaults(attrs)),
                cells: RefCell::new(IndexMap::new()),
                events: Events::new(id),
                initializing: std::cell::Cell::new(false),
                destroyed: std::cell::Cell::new(false),
            }),
        }
    }

    /// Starts declaring a model.
    #[must_use]
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub(crate) fn from_inner(inner: Rc<ModelInner>) -> Self {
        Self { inner }
    }

    /// This model's id.
    #[must_use]
    pub fn id(&self) -> ModelId {
        self.inner.id
    }

    /// This model's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The model's event emitter.
    #[must_use]
    pub fn events(&self) -> &Events {
        &self.inner.events
    }

    /// Creates a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakModel {
        WeakModel(Rc::downgrade(&self.inner))
    }

    /// Returns true if both handles refer to the same model.
    #[must_use]
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns true once `destroy` has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_destroyed() {
            Err(Error::model_destroyed(self.id()))
        } else {
            Ok(())
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Reads an attribute: the cell value if a cell overlays `name`, else the
    /// native value, else `Nil`.
    ///
    /// This read is never tracked as a dependency; getters read through their
    /// [`Scope`](crate::Scope).
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        if let Some(cell) = self.cell(name) {
            return cell.value();
        }
        self.inner
            .store
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if `name` has a cell or a native value.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.has_cell(name) || self.inner.store.borrow().contains(name)
    }

    /// The cell overlaying `name`, if any.
    #[must_use]
    pub fn cell(&self, name: &str) -> Option<Cell> {
        self.inner.cells.borrow().get(name).cloned()
    }

    /// Returns true if `name` has any cell.
    #[must_use]
    pub fn has_cell(&self, name: &str) -> bool {
        self.inner.cells.borrow().contains_key(name)
    }

    /// Returns true if `name` has an observable cell.
    #[must_use]
    pub fn has_observable(&self, name: &str) -> bool {
        self.cell_kind(name) == Some(CellKind::Observable)
    }

    /// Returns true if `name` has a computed cell.
    #[must_use]
    pub fn has_computed(&self, name: &str) -> bool {
        self.cell_kind(name).is_some_and(CellKind::is_computed)
    }

    fn cell_kind(&self, name: &str) -> Option<CellKind> {
        self.inner.cells.borrow().get(name).map(Cell::kind)
    }

    /// Names of every cell, in declaration order.
    #[must_use]
    pub fn cell_names(&self) -> Vec<AttrName> {
        self.inner.cells.borrow().keys().cloned().collect()
    }

    /// Value the native attribute had before the most recent write.
    #[must_use]
    pub fn previous(&self, name: &str) -> Value {
        self.inner
            .store
            .borrow()
            .previous(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Native attributes changed by the most recent write.
    #[must_use]
    pub fn changed_attributes(&self) -> Vec<AttrName> {
        self.inner.store.borrow().changed().cloned().collect()
    }

    /// Snapshot of the native attributes, plus every cell's value when
    /// `include_computed` is set.
    #[must_use]
    pub fn to_attributes(&self, include_computed: bool) -> Attributes {
        let mut attrs = self.inner.store.borrow().snapshot();
        if include_computed {
            let cells: Vec<Cell> = self.inner.cells.borrow().values().cloned().collect();
            for cell in cells {
                attrs.insert(cell.name().to_string(), cell.value());
            }
        }
        attrs
    }

    // -------------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------------

    /// Overlays `name` with an observable cell, replacing any existing cell.
    ///
    /// # Errors
    ///
    /// Returns `ModelDestroyed` after `destroy`.
    pub fn add_observable(&self, name: impl Into<AttrName>, value: impl Into<Value>) -> Result<()> {
        self.ensure_alive()?;
        let name = name.into();
        let cell = Cell::observable(self, name.clone(), value.into());
        self.install(name, cell)
    }

    /// Overlays `name` with a computed cell, replacing any existing cell.
    ///
    /// Accepts a bare getter or a [`ComputedSpec`]. Outside of construction
    /// the cell is initialized immediately.
    ///
    /// # Errors
    ///
    /// Returns `ModelDestroyed` after `destroy`, or any error raised while
    /// the new cell initializes.
    pub fn add_computed(&self, name: impl Into<AttrName>, spec: impl Into<ComputedSpec>) -> Result<()> {
        self.ensure_alive()?;
        let name = name.into();
        let cell = Cell::computed(self, name.clone(), spec.into());
        self.install(name, cell)
    }

    fn install(&self, name: AttrName, cell: Cell) -> Result<()> {
        self.remove_cell(&name);
        self.inner.store.borrow_mut().take(&name);
        self.inner.cells.borrow_mut().insert(name.clone(), cell.clone());
        tracing::trace!(model = %self.id(), attribute = %name, kind = ?cell.kind(), "cell added");

        if self.inner.initializing.get() {
            Ok(())
        } else {
            cell.init()
        }
    }

    /// Removes and disposes the cell overlaying `name`, of either kind.
    pub fn remove_cell(&self, name: &str) -> bool {
        let removed = self.inner.cells.borrow_mut().shift_remove(name);
        match removed {
            Some(cell) => {
                cell.dispose();
                true
            }
            None => false,
        }
    }

    /// Removes the observable cell at `name`. Returns false if `name` has no
    /// observable cell.
    pub fn remove_observable(&self, name: &str) -> bool {
        self.has_observable(name) && self.remove_cell(name)
    }

    /// Removes the computed cell at `name`. Returns false if `name` has no
    /// computed cell.
    pub fn remove_computed(&self, name: &str) -> bool {
        self.has_computed(name) && self.remove_cell(name)
    }

    /// Removes every observable cell.
    pub fn clear_observables(&self) {
        self.clear_where(|cell| !cell.is_computed());
    }

    /// Removes every computed cell.
    pub fn clear_computeds(&self) {
        self.clear_where(Cell::is_computed);
    }

    fn clear_where(&self, predicate: impl Fn(&Cell) -> bool) {
        let mut removed = Vec::new();
        self.inner.cells.borrow_mut().retain(|_, cell| {
            if predicate(cell) {
                removed.push(cell.clone());
                false
            } else {
                true
            }
        });
        for cell in removed {
            cell.dispose();
        }
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Writes one attribute.
    ///
    /// # Errors
    ///
    /// See [`Model::set_many`].
    pub fn set(&self, name: impl Into<AttrName>, value: impl Into<Value>) -> Result<()> {
        self.set_with(name, value, SetOptions::default())
    }

    /// Writes one attribute with options.
    ///
    /// # Errors
    ///
    /// See [`Model::set_many`].
    pub fn set_with(
        &self,
        name: impl Into<AttrName>,
        value: impl Into<Value>,
        options: SetOptions,
    ) -> Result<()> {
        let mut attrs = Attributes::new();
        attrs.insert(name.into(), value.into());
        self.set_many(attrs, options)
    }

    /// Writes a batch of attributes.
    ///
    /// Unless `options.unset` is given, the batch is resolved by deep-set
    /// first; the native store is written only once every setter has run, so
    /// a failed resolution leaves it untouched. Each effective native change
    /// fires `change:<name>`, followed by one `change`, unless
    /// `options.silent` is given.
    ///
    /// # Errors
    ///
    /// Returns `ReadOnlyComputed` when writing a getter-only computed,
    /// `CircularSetter` when setters redirect back into an attribute already
    /// being resolved, `ModelDestroyed` after `destroy`, and any error raised
    /// by a setter or change listener.
    pub fn set_many(&self, attrs: Attributes, options: SetOptions) -> Result<()> {
        self.ensure_alive()?;

        let resolved = if options.unset {
            attrs
        } else {
            let mut resolved = Attributes::new();
            self.deep_set(attrs, &mut resolved, &[])?;
            tracing::debug!(model = %self.id(), native = resolved.len(), "deep-set resolved");
            resolved
        };

        if resolved.is_empty() {
            return Ok(());
        }
        let changes = self.inner.store.borrow_mut().set(resolved, options);
        if options.silent || changes.is_empty() {
            return Ok(());
        }

        tracing::trace!(model = %self.id(), changes = changes.len(), "attributes changed");
        for change in &changes {
            self.trigger(&change_event(&change.name))?;
        }
        self.trigger(CHANGE)
    }

    /// Removes a native attribute, bypassing computed setters.
    ///
    /// # Errors
    ///
    /// See [`Model::set_many`].
    pub fn unset(&self, name: impl Into<AttrName>) -> Result<()> {
        let mut attrs = Attributes::new();
        attrs.insert(name.into(), Value::Nil);
        self.set_many(attrs, SetOptions::unset())
    }

    /// Resolves `to_set` into plain attributes destined for the native store.
    ///
    /// `stack` holds the computed attributes whose setters led here; each
    /// branch of the recursion gets its own copy.
    fn deep_set(&self, to_set: Attributes, resolved: &mut Attributes, stack: &[AttrName]) -> Result<()> {
        let limit = self.inner.config.max_setter_depth;
        if stack.len() > limit {
            tracing::warn!(model = %self.id(), limit, "setter depth exceeded");
            return Err(Error::limit_exceeded(SemanticLimit::MaxSetterDepth { limit })
                .with_context(self.stack_context(stack)));
        }

        for (name, value) in to_set {
            let Some(cell) = self.cell(&name) else {
                resolved.insert(name, value);
                continue;
            };

            if stack.contains(&name) {
                let path = stack.to_vec();
                tracing::warn!(model = %self.id(), attribute = %name, path = %path.join(" > "), "circular setter");
                let context = self.stack_context(stack).with_attribute(name);
                return Err(Error::circular_setter(path).with_context(context));
            }

            if let Some(redirect) = cell.set(value)? {
                let mut branch = stack.to_vec();
                branch.push(name);
                self.deep_set(redirect, resolved, &branch)?;
            }
        }
        Ok(())
    }

    fn stack_context(&self, stack: &[AttrName]) -> ErrorContext {
        let mut context = ErrorContext::new().with_model(self.id());
        if let Some(first) = stack.first() {
            context = context.with_attribute(first.clone());
        }
        for frame in stack {
            context = context.with_frame(format!("setter {frame}"));
        }
        context
    }

    /// Edits a list attribute in place and always fires change.
    ///
    /// Returns `None`, without calling `f`, if the attribute does not hold a
    /// list.
    ///
    /// # Errors
    ///
    /// Returns `ModelDestroyed` after `destroy`, or any change listener error.
    pub fn modify_list<R>(&self, name: &str, f: impl FnOnce(&mut Vec<Value>) -> R) -> Result<Option<R>> {
        self.ensure_alive()?;
        let Value::List(list) = self.get(name) else {
            return Ok(None);
        };

        let (edited, result) = list.edit(f);
        self.write_in_place(name, Value::List(edited));
        self.fire_change(name)?;
        Ok(Some(result))
    }

    /// Inserts (`Some`) or deletes (`None`) one key of a map attribute and
    /// fires change if the map changed.
    ///
    /// Returns the resulting map, or `None` if the attribute does not hold a
    /// map.
    ///
    /// # Errors
    ///
    /// Returns `ModelDestroyed` after `destroy`, or any change listener error.
    pub fn modify_map(&self, name: &str, key: &str, value: Option<Value>) -> Result<Option<Value>> {
        self.ensure_alive()?;
        let Value::Map(map) = self.get(name) else {
            return Ok(None);
        };

        match map.apply(key, value) {
            Some(map) => {
                let value = Value::Map(map);
                self.write_in_place(name, value.clone());
                self.fire_change(name)?;
                Ok(Some(value))
            }
            None => Ok(Some(Value::Map(map))),
        }
    }

    fn write_in_place(&self, name: &str, value: Value) {
        match self.cell(name) {
            Some(cell) => cell.replace_value(value),
            None => self.inner.store.borrow_mut().replace(name, value),
        }
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Subscribes `handler` to `event`.
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&Event<'_>) -> Result<()> + 'static,
    {
        let handler: EventHandler = Rc::new(handler);
        self.inner.events.on(event, handler)
    }

    /// Removes a listener.
    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    /// Dispatches a space-separated list of events.
    ///
    /// # Errors
    ///
    /// Returns the first listener error.
    pub fn trigger(&self, events: &str) -> Result<()> {
        self.inner.events.trigger(events)
    }

    /// Fires the notifications for a cell or in-place change of `name`:
    /// the general `change` first, then `change:<name>`.
    pub(crate) fn fire_change(&self, name: &str) -> Result<()> {
        self.trigger(&format!("{CHANGE} {}", change_event(name)))
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Fires `destroy`, then disposes every cell, drops every listener, and
    /// clears the native store. Later writes fail with `ModelDestroyed`.
    ///
    /// # Errors
    ///
    /// Returns any error raised by a `destroy` listener; the model is torn
    /// down regardless.
    pub fn destroy(&self) -> Result<()> {
        if self.inner.destroyed.replace(true) {
            return Ok(());
        }
        let notified = self.trigger("destroy");

        let cells: Vec<Cell> = self.inner.cells.borrow_mut().drain(..).map(|(_, c)| c).collect();
        for cell in cells {
            cell.dispose();
        }
        self.inner.events.clear();
        self.inner.store.borrow_mut().clear();
        tracing::debug!(model = %self.id(), "model destroyed");
        notified
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.inner.id)
            .field("attributes", &self.inner.store.borrow().snapshot())
            .field("cells", &self.cell_names())
            .finish()
    }
}

// =============================================================================
// Model Builder
// =============================================================================

#[derive(Clone, Debug)]
enum Declaration {
    Observable(Value),
    Computed(ComputedSpec),
}

/// Declares a model's defaults, observables, and computeds.
///
/// Building is two-pass: every cell is created first, then computeds are
/// initialized in declaration order, so a computed may be declared before
/// the attributes it reads. A builder may be reused to build any number of
/// models.
#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
    config: EngineConfig,
    defaults: Attributes,
    cells: Vec<(AttrName, Declaration)>,
}

impl ModelBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Declares a native attribute default.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<AttrName>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Declares several native attribute defaults.
    #[must_use]
    pub fn attributes(mut self, attrs: Attributes) -> Self {
        self.defaults.extend(attrs);
        self
    }

    /// Declares an observable cell.
    #[must_use]
    pub fn observable(mut self, name: impl Into<AttrName>, value: impl Into<Value>) -> Self {
        self.cells.push((name.into(), Declaration::Observable(value.into())));
        self
    }

    /// Declares a computed cell.
    #[must_use]
    pub fn computed(mut self, name: impl Into<AttrName>, spec: impl Into<ComputedSpec>) -> Self {
        self.cells.push((name.into(), Declaration::Computed(spec.into())));
        self
    }

    /// Creates the model.
    ///
    /// # Errors
    ///
    /// Returns any error raised while the computeds initialize.
    pub fn build(&self) -> Result<Model> {
        let model = Model::with_config(self.defaults.clone(), self.config.clone());

        model.inner.initializing.set(true);
        let installed = self.cells.iter().try_for_each(|(name, declaration)| match declaration {
            Declaration::Observable(value) => model.add_observable(name.clone(), value.clone()),
            Declaration::Computed(spec) => model.add_computed(name.clone(), spec.clone()),
        });
        model.inner.initializing.set(false);
        installed?;

        let cells: Vec<Cell> = model.inner.cells.borrow().values().cloned().collect();
        for cell in cells {
            cell.init()?;
        }

        tracing::debug!(model = %model.id(), cells = model.cell_names().len(), "model built");
        Ok(model)
    }
}

//! Dependency discovery for computed getters.
//!
//! A getter reads other attributes through the [`Scope`] it is handed. While
//! a cell initializes, that scope carries a [`DependencyRecorder`] and every
//! read is captured as a [`Dependency`]; during later recomputes the scope
//! carries no recorder and reads are plain.

use std::fmt;

use bindery_foundation::{AttrName, ModelId, Value};
use bindery_storage::change_event;

use crate::model::{Model, WeakModel};

/// One attribute a computed cell depends on.
#[derive(Clone)]
pub struct Dependency {
    attribute: AttrName,
    /// `None` means the cell's own model.
    target: Option<WeakModel>,
}

impl Dependency {
    /// Dependency on an attribute of the owning model.
    #[must_use]
    pub fn local(attribute: impl Into<AttrName>) -> Self {
        Self {
            attribute: attribute.into(),
            target: None,
        }
    }

    /// Dependency on an attribute of another model.
    ///
    /// Only a weak handle is kept; a dependency whose model has been dropped
    /// is ignored.
    #[must_use]
    pub fn foreign(attribute: impl Into<AttrName>, model: &Model) -> Self {
        Self {
            attribute: attribute.into(),
            target: Some(model.downgrade()),
        }
    }

    /// The attribute name as declared.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The `change:` event this dependency subscribes to.
    #[must_use]
    pub fn event(&self) -> String {
        change_event(&self.attribute)
    }

    /// The attribute name with any `change:` prefix removed.
    #[must_use]
    pub fn attribute_name(&self) -> &str {
        self.attribute
            .strip_prefix(bindery_storage::CHANGE_PREFIX)
            .unwrap_or(&self.attribute)
    }

    /// Resolves the model this dependency reads from.
    #[must_use]
    pub fn resolve(&self, owner: &Model) -> Option<Model> {
        match &self.target {
            None => Some(owner.clone()),
            Some(weak) => weak.upgrade(),
        }
    }

    /// Reads the current value, or `Nil` if the target is gone.
    #[must_use]
    pub fn read(&self, owner: &Model) -> Value {
        self.resolve(owner)
            .map(|model| model.get(self.attribute_name()))
            .unwrap_or_default()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            None => write!(f, "Dependency({})", self.attribute),
            Some(weak) => match weak.id() {
                Some(id) => write!(f, "Dependency({}.{})", id, self.attribute),
                None => write!(f, "Dependency(<dropped>.{})", self.attribute),
            },
        }
    }
}

/// Collects the dependencies read during one getter evaluation.
#[derive(Debug)]
pub struct DependencyRecorder {
    owner: ModelId,
    captured: Vec<Dependency>,
}

impl DependencyRecorder {
    /// Creates a recorder for a cell of `owner`, pre-seeded with `seed`.
    #[must_use]
    pub fn new(owner: ModelId, seed: Vec<Dependency>) -> Self {
        Self {
            owner,
            captured: seed,
        }
    }

    /// Runs `f` with an open recorder and returns its result together with
    /// every dependency captured (the seed first).
    pub fn record<R>(
        owner: ModelId,
        seed: Vec<Dependency>,
        f: impl FnOnce(&mut DependencyRecorder) -> R,
    ) -> (R, Vec<Dependency>) {
        let mut recorder = Self::new(owner, seed);
        let result = f(&mut recorder);
        (result, recorder.finish())
    }

    /// Records a read of `attribute` on `model`.
    pub fn capture(&mut self, attribute: &str, model: &Model) {
        let dependency = if model.id() == self.owner {
            Dependency::local(attribute)
        } else {
            Dependency::foreign(attribute, model)
        };
        self.captured.push(dependency);
    }

    /// Number of captured dependencies, including duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.captured.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }

    /// Closes the recorder.
    #[must_use]
    pub fn finish(self) -> Vec<Dependency> {
        self.captured
    }
}

/// Read context handed to computed getters.
pub struct Scope<'a> {
    owner: &'a Model,
    recorder: Option<&'a mut DependencyRecorder>,
    args: Vec<Value>,
}

impl<'a> Scope<'a> {
    /// Creates a scope for a getter of `owner`. Reads are recorded when a
    /// recorder is given.
    #[must_use]
    pub fn new(owner: &'a Model, recorder: Option<&'a mut DependencyRecorder>) -> Self {
        Self {
            owner,
            recorder,
            args: Vec::new(),
        }
    }

    /// The model that owns the cell being computed.
    #[must_use]
    pub fn model(&self) -> &Model {
        self.owner
    }

    /// Reads an attribute of the owning model.
    pub fn get(&mut self, attribute: &str) -> Value {
        let owner = self.owner;
        self.get_from(owner, attribute)
    }

    /// Reads an attribute of any model.
    pub fn get_from(&mut self, model: &Model, attribute: &str) -> Value {
        if let Some(recorder) = self.recorder.as_deref_mut() {
            recorder.capture(attribute, model);
        }
        model.get(attribute)
    }

    /// Values of the manually declared dependencies, in declaration order.
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// One declared dependency value, or `Nil` if out of range.
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// Returns true while dependencies are being recorded.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    /// Reads each declared dependency through this scope and exposes the
    /// values as [`Scope::args`].
    pub(crate) fn inject(&mut self, deps: &[Dependency]) {
        let mut args = Vec::with_capacity(deps.len());
        for dep in deps {
            let value = match dep.resolve(self.owner) {
                Some(model) => self.get_from(&model, dep.attribute_name()),
                None => Value::Nil,
            };
            args.push(value);
        }
        self.args = args;
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("owner", &self.owner.id())
            .field("recording", &self.is_recording())
            .field("args", &self.args)
            .finish()
    }
}

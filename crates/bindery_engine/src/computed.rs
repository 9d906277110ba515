//! Declarations of computed attributes.

use std::fmt;
use std::rc::Rc;

use bindery_foundation::{AttrName, Attributes, Result, Value};

use crate::model::Model;
use crate::recorder::{Dependency, Scope};

/// Computes a cell's value. Reads made through the [`Scope`] are tracked.
pub type Getter = Rc<dyn Fn(&mut Scope<'_>) -> Value>;

/// Accepts a write to a computed attribute and optionally redirects it into
/// other attributes of the owning model.
pub type Setter = Rc<dyn Fn(&Model, Value) -> Result<Option<Attributes>>>;

/// A computed attribute: a getter, an optional setter, and any dependencies
/// declared up front.
///
/// ```
/// use bindery_engine::{ComputedSpec, Model};
/// use bindery_foundation::{Value, attributes};
///
/// let model = Model::with_attributes(attributes([("first", "Charlie"), ("last", "Brown")]));
/// model
///     .add_computed(
///         "fullName",
///         ComputedSpec::new(|cx| format!("{} {}", cx.get("first"), cx.get("last"))),
///     )
///     .unwrap();
/// assert_eq!(model.get("fullName"), Value::from("Charlie Brown"));
/// ```
#[derive(Clone)]
pub struct ComputedSpec {
    pub(crate) getter: Getter,
    pub(crate) setter: Option<Setter>,
    pub(crate) deps: Vec<Dependency>,
}

impl ComputedSpec {
    /// Creates a read-only computed attribute.
    pub fn new<F, V>(getter: F) -> Self
    where
        F: Fn(&mut Scope<'_>) -> V + 'static,
        V: Into<Value>,
    {
        Self {
            getter: Rc::new(move |cx: &mut Scope<'_>| getter(cx).into()),
            setter: None,
            deps: Vec::new(),
        }
    }

    /// Builder method to make the attribute writable.
    #[must_use]
    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&Model, Value) -> Result<Option<Attributes>> + 'static,
    {
        self.setter = Some(Rc::new(setter));
        self
    }

    /// Builder method to declare one dependency on the owning model.
    #[must_use]
    pub fn with_dep(mut self, attribute: impl Into<AttrName>) -> Self {
        self.deps.push(Dependency::local(attribute));
        self
    }

    /// Builder method to declare dependencies on the owning model.
    #[must_use]
    pub fn with_deps<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<AttrName>,
    {
        self.deps.extend(attributes.into_iter().map(Dependency::local));
        self
    }

    /// Builder method to declare a dependency on another model.
    #[must_use]
    pub fn with_foreign_dep(mut self, attribute: impl Into<AttrName>, model: &Model) -> Self {
        self.deps.push(Dependency::foreign(attribute, model));
        self
    }

    /// Returns true if the attribute has no setter.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    /// The declared dependencies.
    #[must_use]
    pub fn deps(&self) -> &[Dependency] {
        &self.deps
    }
}

impl<F, V> From<F> for ComputedSpec
where
    F: Fn(&mut Scope<'_>) -> V + 'static,
    V: Into<Value>,
{
    fn from(getter: F) -> Self {
        Self::new(getter)
    }
}

impl fmt::Debug for ComputedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedSpec")
            .field("read_only", &self.is_read_only())
            .field("deps", &self.deps)
            .finish_non_exhaustive()
    }
}

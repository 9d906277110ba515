//! The value held by every model attribute.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::collections::{List, Map};
use crate::id::ModelId;

/// An attribute value.
///
/// Change detection compares values with `==`, so equality is structural
/// all the way down: two lists are equal when their items are, two maps when
/// their entries are. Every variant clones in O(1), which is what lets a read
/// hand out a copy the caller is free to edit.
#[derive(Clone, Default)]
pub enum Value {
    /// No value. Reading an attribute that was never set yields `Nil`.
    #[default]
    Nil,
    /// A boolean.
    Bool(bool),
    /// A whole number.
    Int(i64),
    /// A floating point number. `NaN` equals itself.
    Float(f64),
    /// A string.
    String(Arc<str>),
    /// A handle to another model.
    ModelRef(ModelId),
    /// An ordered list.
    List(List),
    /// A string-keyed map.
    Map(Map),
}

/// The variant of a [`Value`], without its payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Nil`]
    Nil,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::ModelRef`]
    ModelRef,
    /// [`Value::List`]
    List,
    /// [`Value::Map`]
    Map,
}

impl ValueKind {
    /// Lists and maps are composite; `modify_list` and `modify_map` only
    /// apply to them.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::List | Self::Map)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::ModelRef => "model",
            Self::List => "list",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// The variant of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Nil => ValueKind::Nil,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::ModelRef(_) => ValueKind::ModelRef,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// `[]`
    #[must_use]
    pub fn empty_list() -> Self {
        Self::List(List::new())
    }

    /// `{}`
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map(Map::new())
    }

    /// Returns true for `Nil`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Only `Nil` and `false` are falsy; `0` and `""` are truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// The payload of a `Bool`.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self { Some(*b) } else { None }
    }

    /// The payload of an `Int`.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(n) = self { Some(*n) } else { None }
    }

    /// The payload of a `Float`.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        if let Self::Float(n) = self { Some(*n) } else { None }
    }

    /// Either numeric payload widened to `f64`. Integers beyond 2^53 lose
    /// precision.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            Self::Int(n) => Some(n as f64),
            Self::Float(n) => Some(n),
            _ => None,
        }
    }

    /// The payload of a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let Self::String(s) = self { Some(s) } else { None }
    }

    /// The payload of a `ModelRef`.
    #[must_use]
    pub const fn as_model(&self) -> Option<ModelId> {
        if let Self::ModelRef(id) = self { Some(*id) } else { None }
    }

    /// The payload of a `List`.
    #[must_use]
    pub const fn as_list(&self) -> Option<&List> {
        if let Self::List(items) = self { Some(items) } else { None }
    }

    /// The payload of a `Map`.
    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        if let Self::Map(entries) = self { Some(entries) } else { None }
    }
}

// Floats compare by bit pattern so `NaN == NaN` and equal values hash equally.
// An `Int` never equals a `Float`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::ModelRef(a), Self::ModelRef(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (a, b) => a.is_nil() && b.is_nil(),
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::Nil => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::ModelRef(id) => id.hash(state),
            Self::List(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::ModelRef(id) => write!(f, "{id:?}"),
            Self::List(items) => fmt::Debug::fmt(items, f),
            Self::Map(entries) => fmt::Debug::fmt(entries, f),
            scalar => fmt::Display::fmt(scalar, f),
        }
    }
}

/// Renders the way a bound view would show the value. Map keys are sorted so
/// the output is stable.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<'a>(
            f: &mut fmt::Formatter<'_>,
            parts: impl Iterator<Item = (Option<&'a str>, &'a Value)>,
        ) -> fmt::Result {
            for (i, (key, value)) in parts.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                if let Some(key) = key {
                    write!(f, "{key}: ")?;
                }
                write!(f, "{value}")?;
            }
            Ok(())
        }

        match self {
            Self::Nil => f.write_str("nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::ModelRef(id) => write!(f, "{id}"),
            Self::List(items) => {
                f.write_str("[")?;
                join(f, items.iter().map(|v| (None, v)))?;
                f.write_str("]")
            }
            Self::Map(entries) => {
                let mut sorted: Vec<_> = entries.iter().collect();
                sorted.sort_by(|a, b| a.0.cmp(b.0));
                f.write_str("{")?;
                join(f, sorted.into_iter().map(|(k, v)| (Some(&**k), v)))?;
                f.write_str("}")
            }
        }
    }
}

macro_rules! value_from {
    ($($source:ty => |$x:ident| $body:expr;)*) => {
        $(
            impl From<$source> for Value {
                fn from($x: $source) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    bool => |b| Self::Bool(b);
    i64 => |n| Self::Int(n);
    i32 => |n| Self::Int(i64::from(n));
    f64 => |n| Self::Float(n);
    &str => |s| Self::String(Arc::from(s));
    String => |s| Self::String(Arc::from(s));
    Arc<str> => |s| Self::String(s);
    ModelId => |id| Self::ModelRef(id);
    List => |items| Self::List(items);
    Map => |entries| Self::Map(entries);
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// `None` becomes `Nil`.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

/// Collects key/value pairs into a `Map` value.
impl<K: Into<Arc<str>>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

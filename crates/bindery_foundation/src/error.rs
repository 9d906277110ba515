//! Error types for the Bindery system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::id::ModelId;

/// The main error type for Bindery operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a read-only computed error.
    #[must_use]
    pub fn read_only_computed(attribute: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReadOnlyComputed {
            attribute: attribute.into(),
        })
    }

    /// Creates a circular setter error from the visited trail.
    #[must_use]
    pub fn circular_setter(path: Vec<String>) -> Self {
        Self::new(ErrorKind::CircularSetter { path })
    }

    /// Creates a destroyed model error.
    #[must_use]
    pub fn model_destroyed(id: ModelId) -> Self {
        Self::new(ErrorKind::ModelDestroyed(id))
    }

    /// Creates a setter failure error.
    #[must_use]
    pub fn setter_failed(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SetterFailed {
            attribute: attribute.into(),
            message: message.into(),
        })
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }

    /// Returns true if this is a read-only computed error.
    #[must_use]
    pub fn is_read_only_computed(&self) -> bool {
        matches!(self.kind, ErrorKind::ReadOnlyComputed { .. })
    }

    /// Returns true if this is a circular setter error.
    #[must_use]
    pub fn is_circular_setter(&self) -> bool {
        matches!(self.kind, ErrorKind::CircularSetter { .. })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// A computed attribute without a setter was written.
    #[error("cannot set read-only computed observable: {attribute}")]
    ReadOnlyComputed {
        /// The computed attribute that was written.
        attribute: String,
    },

    /// Computed setters redirected into each other.
    #[error("circular setter: {}", path.join(" > "))]
    CircularSetter {
        /// Computed setters being resolved when the repeat was found.
        path: Vec<String>,
    },

    /// Operation on a model after `destroy`.
    #[error("model destroyed: {0}")]
    ModelDestroyed(ModelId),

    /// A user setter rejected its input.
    #[error("setter for {attribute} failed: {message}")]
    SetterFailed {
        /// The computed attribute whose setter failed.
        attribute: String,
        /// Description of the failure.
        message: String,
    },

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// A computed attribute re-entered its own recompute too many times,
    /// which means its getter depends on itself through change events.
    MaxRecomputeDepth {
        /// The configured limit.
        limit: usize,
        /// The computed attribute that exceeded the limit.
        attribute: String,
    },
    /// Deep-set recursed through too many computed setters.
    MaxSetterDepth {
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxRecomputeDepth { limit, attribute } => {
                write!(f, "max recompute depth ({limit}) exceeded for {attribute}")
            }
            Self::MaxSetterDepth { limit } => {
                write!(f, "max setter depth ({limit}) exceeded")
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Model the failing operation ran on.
    pub model: Option<ModelId>,
    /// Attribute being read, written, or recomputed.
    pub attribute: Option<String>,
    /// Chain of attribute operations leading to the error, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the attribute.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(model) = &self.model {
            write!(f, "at {model}")?;
            if let Some(attribute) = &self.attribute {
                write!(f, ".{attribute}")?;
            }
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}

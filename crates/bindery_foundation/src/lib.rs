//! Core values, identifiers, and errors for Bindery.
//!
//! This crate provides:
//! - [`Value`] - The tagged value type stored in every attribute
//! - [`ModelId`] - Process-unique model identifiers
//! - [`Attributes`] - Insertion-ordered attribute batches
//! - [`Error`] - Rich error types with context
//! - Persistent list and map payloads ([`List`], [`Map`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod attributes;
pub mod collections;
pub mod error;
pub mod id;
pub mod value;

#[cfg(feature = "serde")]
mod serde_impl;

pub use attributes::{AttrName, Attributes, attributes};
pub use collections::{List, Map};
pub use error::{Error, ErrorContext, ErrorKind, SemanticLimit};
pub use id::ModelId;
pub use value::{Value, ValueKind};

/// Result type alias using Bindery's Error type.
pub type Result<T> = std::result::Result<T, Error>;

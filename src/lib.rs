//! Bindery - Reactive data binding for model attributes
//!
//! This crate re-exports all layers of the Bindery system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: bindery_engine     - Cells, dependency tracking, models, bindings
//! Layer 1: bindery_storage    - Event emitter, native attribute store
//! Layer 0: bindery_foundation - Core types (Value, ModelId, Error)
//! ```

pub use bindery_engine as engine;
pub use bindery_foundation as foundation;
pub use bindery_storage as storage;

pub use bindery_engine::{Binding, ComputedSpec, EngineConfig, Model, ModelBuilder, Scope};
pub use bindery_foundation::{Attributes, Error, ErrorKind, Result, Value, attributes};
pub use bindery_storage::SetOptions;

//! Reactive cells and models for Bindery.
//!
//! This crate provides:
//! - [`Model`] - Native attributes overlaid with cells, with deep-set writes
//! - [`Cell`] - Observable and computed attribute cells
//! - [`Scope`] / [`DependencyRecorder`] - Dependency discovery for getters
//! - [`Binding`] - A handler kept in sync with one attribute
//! - [`EngineConfig`] - Propagation limits

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod binding;
pub mod cell;
pub mod computed;
pub mod config;
pub mod model;
pub mod recorder;

pub use binding::Binding;
pub use cell::{Cell, CellKind};
pub use computed::{ComputedSpec, Getter, Setter};
pub use config::EngineConfig;
pub use model::{Model, ModelBuilder, WeakModel};
pub use recorder::{Dependency, DependencyRecorder, Scope};

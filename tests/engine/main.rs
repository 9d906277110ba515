//! Integration tests for Layer 2: Engine
//!
//! Tests for observable and computed cells, deep-set, model lifecycle, and
//! bindings.

mod bindings;
mod observables;
mod setters;

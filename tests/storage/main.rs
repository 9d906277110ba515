//! Integration tests for Layer 1: Storage
//!
//! Tests for the event emitter and the native attribute store.

mod store;

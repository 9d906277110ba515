//! Event emitter and native attribute store for Bindery.
//!
//! This crate provides:
//! - [`Events`] - Named-event subscription and synchronous dispatch
//! - [`AttributeStore`] - The plain attribute table a model wraps

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod events;
pub mod store;

pub use events::{CHANGE, CHANGE_PREFIX, Event, EventHandler, Events, ListenerId, change_event};
pub use store::{AttributeStore, Change, SetOptions};

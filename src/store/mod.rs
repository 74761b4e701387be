//! Identity-keyed side-table for attaching metadata to runtime entities.
//!
//! Integration modules need to remember things about live objects and
//! opaque resource handles (a connection's host, a statement's query text)
//! without touching the entity's own fields and without the entity's type
//! cooperating. [`EntitySideStore`] keeps that state fully out-of-band,
//! keyed by instance identity for objects and by generation-counted handle
//! identity for resources.

pub mod entity;
pub mod store;

pub use entity::{Entity, ResourceHandle};
pub use store::EntitySideStore;

//! Entity identity: objects and resource handles.

use std::sync::{Arc, Weak};

use crate::value::ObjectRef;

/// A resource handle of the embedded runtime (socket, connection, cursor).
///
/// Such handles cannot carry attached fields, and the runtime may reuse a
/// raw identifier for a new, unrelated resource after the first is
/// released. Each allocation therefore pairs the raw identifier with a
/// generation drawn from a monotonic counter; a handle whose generation no
/// longer matches the live one is stale and degrades to no-op/default
/// behavior everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    pub(crate) raw: u64,
    pub(crate) generation: u64,
}

impl ResourceHandle {
    /// The runtime-level identifier, shared with any later reuse.
    pub fn raw(&self) -> u64 {
        self.raw
    }
}

/// An entity the side-table can key on.
pub enum Entity<'a> {
    /// A live object instance; identity is the instance itself.
    Object(&'a ObjectRef),
    /// A resource handle; identity is (raw id, generation).
    Resource(ResourceHandle),
}

impl<'a> From<&'a ObjectRef> for Entity<'a> {
    fn from(obj: &'a ObjectRef) -> Self {
        Entity::Object(obj)
    }
}

impl<'a> From<ResourceHandle> for Entity<'a> {
    fn from(handle: ResourceHandle) -> Self {
        Entity::Resource(handle)
    }
}

/// Address of an object allocation, used as the map key for object entries.
pub(crate) fn object_addr(obj: &ObjectRef) -> usize {
    Arc::as_ptr(obj) as *const () as usize
}

/// Liveness guard for an object entry.
///
/// The store holds a `Weak` so it never extends the entity's lifetime; an
/// entry whose weak reference is dead belongs to a destroyed object (or to
/// a previous allocation at a since-reused address) and is discarded on
/// sight.
pub(crate) struct ObjectGuard(Weak<dyn std::any::Any + Send + Sync>);

impl ObjectGuard {
    pub(crate) fn new(obj: &ObjectRef) -> Self {
        Self(Arc::downgrade(obj))
    }

    pub(crate) fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

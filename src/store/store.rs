//! The side-table itself.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::store::entity::{object_addr, Entity, ObjectGuard, ResourceHandle};
use crate::value::Value;

struct ObjectEntry {
    guard: ObjectGuard,
    values: HashMap<String, Value>,
}

#[derive(Default)]
struct StoreInner {
    objects: HashMap<usize, ObjectEntry>,
    resources: HashMap<ResourceHandle, HashMap<String, Value>>,
    /// raw id -> generation of the currently live handle.
    live: HashMap<u64, u64>,
    next_generation: u64,
}

impl StoreInner {
    fn handle_is_live(&self, handle: ResourceHandle) -> bool {
        self.live.get(&handle.raw) == Some(&handle.generation)
    }

    fn lookup(&mut self, entity: &Entity<'_>, key: &str) -> Option<Value> {
        match entity {
            Entity::Object(obj) => {
                let addr = object_addr(obj);
                match self.objects.get(&addr) {
                    Some(entry) if entry.guard.is_live() => entry.values.get(key).cloned(),
                    Some(_) => {
                        // Address reused by a new allocation; the old
                        // owner's entries must not leak onto it.
                        self.objects.remove(&addr);
                        None
                    }
                    None => None,
                }
            }
            Entity::Resource(handle) => {
                if !self.handle_is_live(*handle) {
                    return None;
                }
                self.resources.get(handle).and_then(|m| m.get(key).cloned())
            }
        }
    }

    fn insert(&mut self, entity: &Entity<'_>, key: &str, value: Value) {
        match entity {
            Entity::Object(obj) => {
                let addr = object_addr(obj);
                let stale = self
                    .objects
                    .get(&addr)
                    .is_some_and(|entry| !entry.guard.is_live());
                if stale {
                    self.objects.remove(&addr);
                }
                self.objects
                    .entry(addr)
                    .or_insert_with(|| ObjectEntry {
                        guard: ObjectGuard::new(obj),
                        values: HashMap::new(),
                    })
                    .values
                    .insert(key.to_string(), value);
            }
            Entity::Resource(handle) => {
                if !self.handle_is_live(*handle) {
                    tracing::debug!(raw = handle.raw, "put on stale resource handle ignored");
                    return;
                }
                self.resources
                    .entry(*handle)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }
    }
}

/// Out-of-band storage of `(entity, key) -> value` entries.
///
/// Every operation degrades silently on invalid input (empty key, stale
/// handle, dead object): callers at instrumentation boundaries must never
/// be the reason application code fails.
#[derive(Default)]
pub struct EntitySideStore {
    inner: Mutex<StoreInner>,
}

impl EntitySideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a handle for a runtime resource identified by `raw`.
    ///
    /// If `raw` was previously allocated, the prior handle (and any entries
    /// under it) is invalidated first, so identifier reuse never resurrects
    /// another resource's metadata.
    pub fn allocate_handle(&self, raw: u64) -> ResourceHandle {
        let mut inner = self.inner.lock();
        if let Some(generation) = inner.live.get(&raw).copied() {
            inner.resources.remove(&ResourceHandle { raw, generation });
        }
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.live.insert(raw, generation);
        ResourceHandle { raw, generation }
    }

    /// Invalidate a handle on resource release, dropping its entries.
    ///
    /// Stale handles are ignored, so release can race with identifier reuse
    /// from multiple cleanup paths.
    pub fn release_handle(&self, handle: ResourceHandle) {
        let mut inner = self.inner.lock();
        if inner.handle_is_live(handle) {
            inner.live.remove(&handle.raw);
            inner.resources.remove(&handle);
        }
    }

    /// Attach `value` under `key` to `entity`, overwriting any prior value.
    ///
    /// No-op if `key` is empty or the entity is invalid.
    pub fn put<'a>(&self, entity: impl Into<Entity<'a>>, key: &str, value: Value) {
        if key.is_empty() {
            return;
        }
        self.inner.lock().insert(&entity.into(), key, value);
    }

    /// Stored value for `(entity, key)`, or `default` if there is none or
    /// the input is invalid.
    pub fn get<'a>(&self, entity: impl Into<Entity<'a>>, key: &str, default: Value) -> Value {
        if key.is_empty() {
            return default;
        }
        self.inner
            .lock()
            .lookup(&entity.into(), key)
            .unwrap_or(default)
    }

    /// Copy the current value for `key` from `src` to `dst`.
    ///
    /// No-op if `src` has no entry; `src`'s own entry is left untouched.
    pub fn propagate<'a, 'b>(
        &self,
        src: impl Into<Entity<'a>>,
        dst: impl Into<Entity<'b>>,
        key: &str,
    ) {
        if key.is_empty() {
            return;
        }
        let mut inner = self.inner.lock();
        if let Some(value) = inner.lookup(&src.into(), key) {
            inner.insert(&dst.into(), key, value);
        }
    }

    /// Sweep entries whose objects have been destroyed.
    ///
    /// Dead entries are also discarded opportunistically on access; this is
    /// for callers that want bounded memory between accesses.
    pub fn prune(&self) {
        let mut inner = self.inner.lock();
        let before = inner.objects.len();
        inner.objects.retain(|_, entry| entry.guard.is_live());
        let swept = before - inner.objects.len();
        if swept > 0 {
            tracing::debug!(swept, "pruned side-table entries for destroyed objects");
        }
    }
}

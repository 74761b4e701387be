//! Hook registry: registration, deferred activation, and dispatch.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::hooks::context::InvocationContext;
use crate::hooks::hook::{Hook, HookCallback, HookError, HookId, HookOptions, Target};
use crate::tracer::Tracer;
use crate::value::{Args, ObjectRef, ThrownError, Value};

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    /// Activated hooks per target, in registration order.
    active: HashMap<Target, Vec<Arc<Hook>>>,
    /// Hooks whose target is not yet resolvable, in registration order.
    pending: Vec<Arc<Hook>>,
    /// Targets known to exist.
    defined: HashSet<Target>,
    /// In-flight dispatch depth per hook, for recursion suppression.
    depth: HashMap<HookId, usize>,
}

impl RegistryInner {
    /// Record that `target` exists, activating any pending hooks for it.
    fn define(&mut self, target: &Target) {
        if !self.defined.insert(target.clone()) {
            return;
        }
        let (ready, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|hook| &hook.target == target);
        self.pending = rest;
        if !ready.is_empty() {
            tracing::debug!(
                hooked = %target,
                count = ready.len(),
                "activating deferred hooks"
            );
            self.active.entry(target.clone()).or_default().extend(ready);
        }
    }
}

/// Registry of interception points.
///
/// An explicit, injectable object: tests and embeddings instantiate their
/// own registries, each with its own tracer. Dispatch iterates a snapshot
/// of the target's hook list taken at call time, so callbacks registering
/// or unregistering hooks — their own included — affect future calls only,
/// never the dispatch already in flight.
pub struct HookRegistry {
    tracer: Tracer,
    inner: Mutex<RegistryInner>,
}

impl HookRegistry {
    pub fn new(tracer: Tracer) -> Self {
        Self {
            tracer,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// The tracer spans are opened against.
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Register an interception point on `target`.
    ///
    /// At least one of `pre`/`post` is required. If the target is not yet
    /// resolvable the hook is queued and activates automatically the moment
    /// the target is defined — no polling, no re-registration.
    pub fn register(
        &self,
        target: Target,
        pre: Option<HookCallback>,
        post: Option<HookCallback>,
        options: HookOptions,
    ) -> Result<HookId, HookError> {
        if pre.is_none() && post.is_none() {
            return Err(HookError::NoCallbacks);
        }
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = HookId(inner.next_id);
        let hook = Arc::new(Hook {
            id,
            target: target.clone(),
            pre,
            post,
            recurse: options.recurse,
        });
        if inner.defined.contains(&target) {
            inner.active.entry(target).or_default().push(hook);
        } else {
            tracing::debug!(%id, hooked = %target, "target not yet resolvable, deferring hook");
            inner.pending.push(hook);
        }
        Ok(id)
    }

    /// Remove a hook. Idempotent: unknown or already-removed ids are a
    /// no-op. Safe to call from inside any callback, including the hook's
    /// own — the dispatch in flight finishes over its snapshot.
    pub fn unregister(&self, id: HookId) {
        let mut inner = self.inner.lock();
        inner.pending.retain(|hook| hook.id != id);
        for hooks in inner.active.values_mut() {
            hooks.retain(|hook| hook.id != id);
        }
    }

    /// Notify the registry that `target` is now resolvable (function
    /// defined, class declared, file loaded), activating pending hooks.
    pub fn mark_defined(&self, target: &Target) {
        self.inner.lock().define(target);
    }

    /// Whether `target` is known to exist.
    pub fn is_defined(&self, target: &Target) -> bool {
        self.inner.lock().defined.contains(target)
    }

    /// Number of hooks currently active for `target`.
    pub fn active_count(&self, target: &Target) -> usize {
        self.inner.lock().active.get(target).map_or(0, Vec::len)
    }

    /// Number of hooks awaiting deferred activation.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Intercepted execution of `target`'s original implementation.
    ///
    /// Called by the embedding runtime at the call site. A call proves the
    /// target exists, so pending hooks for it activate first. If no hook
    /// fires (none registered, or all suppressed by recursion), the
    /// original runs directly with no interception overhead.
    ///
    /// Lifecycle per invocation: pre-callbacks in registration order, the
    /// original target, post-callbacks in reverse registration order, then
    /// auto-close of the invocation span. The original's result or error is
    /// returned unchanged unless a callback itself fails (see error policy
    /// on the module docs and [`Self::dispatch`] internals).
    pub fn dispatch<F>(
        &self,
        target: &Target,
        receiver: Option<ObjectRef>,
        args: Args,
        original: F,
    ) -> Result<Value, ThrownError>
    where
        F: FnOnce(Option<&ObjectRef>, &Args) -> Result<Value, ThrownError>,
    {
        let snapshot = {
            let mut inner = self.inner.lock();
            inner.define(target);
            let hooks = inner.active.get(target).cloned().unwrap_or_default();
            let mut selected = Vec::with_capacity(hooks.len());
            for hook in hooks {
                let depth = inner.depth.get(&hook.id).copied().unwrap_or(0);
                if depth > 0 && !hook.recurse {
                    tracing::debug!(id = %hook.id, hooked = %target, "re-entrant call, skipping hook");
                    continue;
                }
                inner.depth.insert(hook.id, depth + 1);
                selected.push(hook);
            }
            selected
        };

        if snapshot.is_empty() {
            return original(receiver.as_ref(), &args);
        }

        let result = self.run_intercepted(&snapshot, target, receiver, args, original);

        let mut inner = self.inner.lock();
        for hook in &snapshot {
            if let Entry::Occupied(mut entry) = inner.depth.entry(hook.id) {
                *entry.get_mut() -= 1;
                if *entry.get() == 0 {
                    entry.remove();
                }
            }
        }

        result
    }

    /// Dispatch for a file target, around the file's top-level code.
    pub fn dispatch_file<F>(&self, path: impl AsRef<Path>, load: F) -> Result<Value, ThrownError>
    where
        F: FnOnce() -> Result<Value, ThrownError>,
    {
        self.dispatch(&Target::file(path.as_ref()), None, Vec::new(), |_, _| load())
    }

    fn run_intercepted<F>(
        &self,
        snapshot: &[Arc<Hook>],
        target: &Target,
        receiver: Option<ObjectRef>,
        args: Args,
        original: F,
    ) -> Result<Value, ThrownError>
    where
        F: FnOnce(Option<&ObjectRef>, &Args) -> Result<Value, ThrownError>,
    {
        let mut ctx =
            InvocationContext::new(args, receiver, self.tracer.clone(), target.to_string());

        // Pre phase, registration order. A failing pre-callback aborts the
        // invocation: the instrumentation cannot guarantee it is safe to
        // proceed, so the target is not called and the error propagates.
        for hook in snapshot {
            let Some(pre) = &hook.pre else { continue };
            ctx.set_current(hook.id);
            if let Err(err) = pre(&mut ctx) {
                tracing::warn!(id = %hook.id, hooked = %target, error = %err, "pre-callback failed");
                ctx.finish_span(Some(&err));
                return Err(err);
            }
        }

        let outcome = original(ctx.receiver(), ctx.args());
        match &outcome {
            Ok(value) => ctx.set_returned(value.clone()),
            Err(err) => ctx.set_thrown(err.clone()),
        }

        // Post phase, reverse registration order (outer wraps inner). A
        // failing post-callback never stops its siblings: the target has
        // already run and every hook still gets its completion signal.
        let mut callback_error: Option<ThrownError> = None;
        for hook in snapshot.iter().rev() {
            let Some(post) = &hook.post else { continue };
            ctx.set_current(hook.id);
            if let Err(err) = post(&mut ctx) {
                tracing::warn!(id = %hook.id, hooked = %target, error = %err, "post-callback failed");
                if callback_error.is_none() {
                    callback_error = Some(err);
                }
            }
        }

        // The target's own error outranks callback errors on the span and
        // in propagation; a broken integration is surfaced, but never at
        // the cost of masking a real application error.
        let span_error = ctx.thrown().cloned().or_else(|| callback_error.clone());
        ctx.finish_span(span_error.as_ref());

        match (outcome, callback_error) {
            (Err(err), Some(suppressed)) => {
                tracing::warn!(
                    hooked = %target,
                    error = %suppressed,
                    "post-callback error suppressed by target error"
                );
                Err(err)
            }
            (Err(err), None) => Err(err),
            (Ok(_), Some(err)) => Err(err),
            (Ok(value), None) => Ok(value),
        }
    }
}

//! Per-invocation context handed to pre- and post-callbacks.

use std::collections::HashMap;

use crate::hooks::hook::HookId;
use crate::tracer::{Scope, Span, Tracer};
use crate::value::{Args, ObjectRef, ThrownError, Value};

/// State of one intercepted invocation.
///
/// Created fresh per dispatch and shared by every hook firing for that
/// call. Arguments are mutable during the pre phase; `returned`/`thrown`
/// are populated between the target's execution and the post phase; the
/// `data` slot is private to each hook within this single invocation.
pub struct InvocationContext {
    args: Args,
    receiver: Option<ObjectRef>,
    current: HookId,
    data: HashMap<HookId, Value>,
    returned: Option<Value>,
    thrown: Option<ThrownError>,
    scope: Option<Scope>,
    tracer: Tracer,
    span_name: String,
}

impl InvocationContext {
    pub(crate) fn new(
        args: Args,
        receiver: Option<ObjectRef>,
        tracer: Tracer,
        span_name: String,
    ) -> Self {
        Self {
            args,
            receiver,
            current: HookId(0),
            data: HashMap::new(),
            returned: None,
            thrown: None,
            scope: None,
            tracer,
            span_name,
        }
    }

    /// Positional arguments of the call.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Mutable arguments; changes made in the pre phase alter what the
    /// target receives. Mutation in the post phase has no effect on the
    /// already-completed call.
    pub fn args_mut(&mut self) -> &mut Args {
        &mut self.args
    }

    /// The object instance the call is bound to, if any.
    pub fn receiver(&self) -> Option<&ObjectRef> {
        self.receiver.as_ref()
    }

    /// Id of the hook whose callback is currently running.
    ///
    /// A callback unregistering this id removes its own hook — safe even
    /// mid-callback.
    pub fn id(&self) -> HookId {
        self.current
    }

    /// Stash a value for the current hook, visible unmodified to the same
    /// hook's post-callback for this invocation only.
    pub fn set_data(&mut self, value: Value) {
        self.data.insert(self.current, value);
    }

    /// The current hook's stashed value, if the pre-callback set one.
    pub fn data(&self) -> Option<&Value> {
        self.data.get(&self.current)
    }

    /// The target's return value. Post phase only; `None` if it threw.
    pub fn returned(&self) -> Option<&Value> {
        self.returned.as_ref()
    }

    /// The target's propagating error. Post phase only; `None` if it
    /// returned normally.
    pub fn thrown(&self) -> Option<&ThrownError> {
        self.thrown.as_ref()
    }

    /// Lazily create-or-return the span scoped to this invocation.
    ///
    /// If no callback closes it explicitly, the registry closes it once the
    /// post phase completes.
    pub fn span(&mut self) -> &mut Span {
        let tracer = &self.tracer;
        let name = &self.span_name;
        self.scope
            .get_or_insert_with(|| tracer.start_span(name.clone()))
            .span()
    }

    /// Whether a span has been opened for this invocation.
    pub fn has_span(&self) -> bool {
        self.scope.is_some()
    }

    /// Close the invocation's span now instead of leaving it to the
    /// registry. No-op if no span was opened or it is already closed.
    pub fn close_span(&mut self) {
        if let Some(scope) = self.scope.as_mut() {
            scope.close();
        }
    }

    pub(crate) fn set_current(&mut self, id: HookId) {
        self.current = id;
    }

    pub(crate) fn set_returned(&mut self, value: Value) {
        self.returned = Some(value);
        self.thrown = None;
    }

    pub(crate) fn set_thrown(&mut self, err: ThrownError) {
        self.thrown = Some(err);
        self.returned = None;
    }

    /// Close the invocation's span if one is open, tagging it with `err`
    /// first. Called by the registry after the post phase and on
    /// pre-callback failure.
    pub(crate) fn finish_span(&mut self, err: Option<&ThrownError>) {
        if let Some(scope) = self.scope.as_mut() {
            if !scope.is_closed() {
                if let Some(e) = err {
                    scope.span().tag_error(e);
                }
                scope.close();
            }
        }
    }
}

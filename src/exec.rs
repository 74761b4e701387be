//! Scope-guaranteed execution of instrumented calls.
//!
//! The explicit counterpart to registry dispatch: integration code that
//! already holds a [`Scope`] wraps a call here and gets one hard guarantee
//! in return — the scope closes exactly once, whether the target returns,
//! throws, or doesn't exist and falls through to the receiver's catch-all
//! dispatch. Thrown errors are tagged onto the span and re-propagated with
//! identity intact; upstream callers observe nothing but the span side
//! effect.

use crate::tracer::{Scope, Span};
use crate::value::{Args, DynamicDispatch, ObjectRef, ThrownError, Value};

/// Success enricher: runs with the result and the still-open span so a
/// caller can tag the span from the return value before the scope closes.
pub type AfterSuccess = fn(&Value, &mut Span);

/// Execute a free function under `scope`.
pub fn execute_function<F, A>(
    scope: Scope,
    target: F,
    args: &Args,
    after_success: Option<A>,
) -> Result<Value, ThrownError>
where
    F: FnOnce(&Args) -> Result<Value, ThrownError>,
    A: FnOnce(&Value, &mut Span),
{
    run_scoped(scope, after_success, || target(args))
}

/// Execute a public method under `scope`, bound to `receiver`.
pub fn execute_method<F, A>(
    scope: Scope,
    receiver: &ObjectRef,
    target: F,
    args: &Args,
    after_success: Option<A>,
) -> Result<Value, ThrownError>
where
    F: FnOnce(&ObjectRef, &Args) -> Result<Value, ThrownError>,
    A: FnOnce(&Value, &mut Span),
{
    run_scoped(scope, after_success, || target(receiver, args))
}

/// Execute a non-public or dynamically-dispatched method under `scope`.
///
/// Call semantics match a call made from within the declaring type: a
/// declared method is invoked directly, and a missing one falls through to
/// the receiver's catch-all fallback.
pub fn execute_dynamic<A>(
    scope: Scope,
    receiver: &dyn DynamicDispatch,
    method: &str,
    args: &Args,
    after_success: Option<A>,
) -> Result<Value, ThrownError>
where
    A: FnOnce(&Value, &mut Span),
{
    run_scoped(scope, after_success, || {
        if receiver.has_method(method) {
            receiver.call_method(method, args)
        } else {
            receiver.call_missing(method, args)
        }
    })
}

/// One algorithm behind all three entry points.
fn run_scoped<A>(
    mut scope: Scope,
    after_success: Option<A>,
    call: impl FnOnce() -> Result<Value, ThrownError>,
) -> Result<Value, ThrownError>
where
    A: FnOnce(&Value, &mut Span),
{
    match call() {
        Ok(value) => {
            if let Some(after) = after_success {
                after(&value, scope.span());
            }
            scope.close();
            Ok(value)
        }
        Err(err) => {
            scope.span().tag_error(&err);
            scope.close();
            Err(err)
        }
    }
}

//! Value and call model of the embedded dynamic runtime.
//!
//! The instrumented program lives in a dynamic-language runtime. Its values
//! cross into this crate as JSON-shaped [`Value`]s, its object instances as
//! identity-carrying [`ObjectRef`]s, and its thrown errors as structured
//! [`ThrownError`]s that propagate by value without losing identity.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// Positional arguments of an intercepted call.
///
/// Pre-callbacks may mutate these; the target then receives the mutated
/// arguments.
pub type Args = Vec<Value>;

/// An object instance of the embedded runtime.
///
/// Identity is `Arc` pointer identity: two `ObjectRef`s refer to the same
/// instance exactly when they point at the same allocation.
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// An error thrown by instrumented code.
///
/// Carries the runtime-level error category, message, and captured stack
/// frames. Cloned and compared by value; re-propagation hands callers the
/// exact error that was thrown, so upstream code observes no difference
/// from an uninstrumented call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ThrownError {
    /// Error category (exception class name, error code family, ...).
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Captured stack frames, outermost last.
    pub stack: Vec<String>,
}

impl ThrownError {
    /// Create an error with an empty stack.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Attach captured stack frames.
    pub fn with_stack(mut self, frames: Vec<String>) -> Self {
        self.stack = frames;
        self
    }
}

/// Dynamically-dispatched method calls on a runtime object.
///
/// Implemented by receiver shims for types whose methods are not statically
/// known — the non-public/dynamic call path goes through this trait so that
/// invoking a method here is indistinguishable from a call made inside the
/// declaring type, including the catch-all fallback for missing methods.
pub trait DynamicDispatch: Send + Sync {
    /// Whether the receiver declares a method with this name.
    fn has_method(&self, name: &str) -> bool;

    /// Invoke a declared method.
    fn call_method(&self, name: &str, args: &Args) -> Result<Value, ThrownError>;

    /// Fallback invoked when the named method does not exist.
    ///
    /// Default: throw a `MethodNotFound` error, matching a runtime with no
    /// catch-all handler on the receiver.
    fn call_missing(&self, name: &str, _args: &Args) -> Result<Value, ThrownError> {
        Err(ThrownError::new(
            "MethodNotFound",
            format!("call to undefined method {name}"),
        ))
    }
}

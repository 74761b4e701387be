//! Call interception: targets, hooks, invocation contexts, and the registry.
//!
//! Integration modules declare "run this before/after invocations of target
//! X" at load time; the embedding runtime drives the registry by calling
//! [`HookRegistry::dispatch`] at call sites and
//! [`HookRegistry::mark_defined`] at definition/load sites. Targets may be
//! registered before they exist — such hooks sit pending and activate the
//! moment the target becomes resolvable.

pub mod context;
pub mod hook;
pub mod registry;

pub use context::InvocationContext;
pub use hook::{callback, HookCallback, HookError, HookId, HookOptions, Target};
pub use registry::HookRegistry;

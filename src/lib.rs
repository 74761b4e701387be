//! Runtime support layer for in-process tracing agents.
//!
//! Framework-specific instrumentation modules (a WordPress integration, a
//! Redis integration, ...) need three primitives to attach tracing behavior
//! to already-compiled code without modifying its source:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Integration Modules                        │
//! │        (framework-specific span names, tags, targets)         │
//! └──────┬──────────────────────┬──────────────────────┬──────────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────────────┐
//! │ HookRegistry │   │  EntitySideStore  │   │   exec::execute_* │
//! │  pre/post    │   │  (entity, key) →  │   │  scope closed    │
//! │ interception │   │  value side-table │   │  exactly once    │
//! └──────┬───────┘   └───────────────────┘   └────────┬─────────┘
//!        └──────────────────┬───────────────────────── ┘
//!                           ▼
//!                 ┌──────────────────┐
//!                 │  Tracer facade   │
//!                 │  span open/close │
//!                 └──────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - **Exactly-once span lifecycle** — a span opened for an invocation is
//!   closed exactly once, across nested calls, self-modifying hook graphs,
//!   and thrown errors.
//! - **Transparent error propagation** — errors thrown by instrumented code
//!   are tagged onto the span and re-propagated with identity intact.
//! - **Safe self-modification** — callbacks may register and unregister
//!   hooks (their own included) while dispatch is in flight; the dispatch
//!   already running is unaffected.
//! - **Deferred activation** — hooks on not-yet-existing targets activate
//!   automatically when the target becomes resolvable.
//!
//! Span transport, batching, and sampling are out of scope: finished spans
//! accumulate in the [`Tracer`](tracer::Tracer) sink for a transport layer
//! to drain.

pub mod error;
pub mod exec;
pub mod hooks;
pub mod store;
pub mod tracer;
pub mod value;

pub use error::{Error, Result};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::exec::{execute_dynamic, execute_function, execute_method, AfterSuccess};
    pub use crate::hooks::{
        callback, HookCallback, HookError, HookId, HookOptions, HookRegistry, InvocationContext,
        Target,
    };
    pub use crate::store::{Entity, EntitySideStore, ResourceHandle};
    pub use crate::tracer::{FinishedSpan, Scope, Span, Tracer};
    pub use crate::value::{Args, DynamicDispatch, ObjectRef, ThrownError, Value};
}

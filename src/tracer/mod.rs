//! Minimal tracer facade: spans, scopes, and the sink for finished spans.
//!
//! This crate opens and closes spans; it does not serialize or ship them.
//! The [`Tracer`] here mints [`Scope`]s and collects [`FinishedSpan`]s in
//! memory, where the transport layer (out of scope) drains them.

pub mod scope;
pub mod span;

pub use scope::{Scope, Tracer};
pub use span::{FinishedSpan, Span};

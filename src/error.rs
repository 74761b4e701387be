//! Error types for tracetap.
//!
//! Two error worlds meet here and deliberately stay separate:
//!
//! - [`Error`] — faults of this crate's own API surface, returned to the
//!   integration author (bad registration, malformed target spec).
//! - [`ThrownError`](crate::value::ThrownError) — errors thrown by the
//!   instrumented program. Those belong to the application, propagate by
//!   value with identity intact, and are never folded into [`Error`].

/// Top-level error type for the runtime support layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Hook error: {0}")]
    Hook(#[from] crate::hooks::HookError),
}

/// Result type alias for the runtime support layer.
pub type Result<T> = std::result::Result<T, Error>;

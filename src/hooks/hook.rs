//! Core hook types.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::hooks::context::InvocationContext;
use crate::value::ThrownError;

/// Opaque hook identifier, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(pub(crate) u64);

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook-{}", self.0)
    }
}

/// What a hook intercepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A free function, by name.
    Function(String),
    /// A method, by class and name.
    Method { class: String, name: String },
    /// A file; fires when the file's top-level code runs.
    File(PathBuf),
}

impl Target {
    pub fn function(name: impl Into<String>) -> Self {
        Target::Function(name.into())
    }

    pub fn method(class: impl Into<String>, name: impl Into<String>) -> Self {
        Target::Method {
            class: class.into(),
            name: name.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Target::File(path.into())
    }

    /// Parse a target spec string.
    ///
    /// `"Class::method"` is a method target, anything containing a path
    /// separator is a file target, the rest is a function name. Specs that
    /// don't fit (extensionless relative file names, say) should use the
    /// direct constructors instead.
    pub fn parse(spec: &str) -> Result<Self, HookError> {
        if let Some((class, name)) = spec.split_once("::") {
            if class.is_empty() || name.is_empty() || name.contains("::") {
                return Err(HookError::InvalidTarget { spec: spec.into() });
            }
            return Ok(Target::method(class, name));
        }
        if spec.contains('/') || spec.contains('\\') {
            return Ok(Target::file(spec));
        }
        if spec.is_empty() {
            return Err(HookError::InvalidTarget { spec: spec.into() });
        }
        Ok(Target::function(spec))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Function(name) => write!(f, "{name}"),
            Target::Method { class, name } => write!(f, "{class}::{name}"),
            Target::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Registration options.
#[derive(Debug, Clone, Copy)]
pub struct HookOptions {
    /// If false (default), re-entrant invocations of the same target while
    /// a prior invocation is still in flight are not intercepted again —
    /// only the outermost call fires. Opt in for code where every recursive
    /// level should be traced independently.
    pub recurse: bool,
}

impl Default for HookOptions {
    fn default() -> Self {
        Self { recurse: false }
    }
}

/// A pre- or post-callback.
///
/// Callbacks receive the invocation's context and may mutate arguments (pre
/// phase), stash per-invocation data, open the invocation span, and
/// register or unregister hooks — including their own.
pub type HookCallback =
    Arc<dyn Fn(&mut InvocationContext) -> Result<(), ThrownError> + Send + Sync>;

/// Wrap a closure as a [`HookCallback`].
pub fn callback<F>(f: F) -> HookCallback
where
    F: Fn(&mut InvocationContext) -> Result<(), ThrownError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Hook registration errors.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("hook registration requires at least one callback")]
    NoCallbacks,

    #[error("invalid target spec: {spec}")]
    InvalidTarget { spec: String },
}

/// A registered interception point.
pub(crate) struct Hook {
    pub(crate) id: HookId,
    pub(crate) target: Target,
    pub(crate) pre: Option<HookCallback>,
    pub(crate) post: Option<HookCallback>,
    pub(crate) recurse: bool,
}

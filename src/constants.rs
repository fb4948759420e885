//! Reserved keys of the chain-wide shared data mapping.
//!
//! These keys are written by the rendering machinery (partial registration,
//! invocation tracking, helper dispatch) and read back through
//! [`Scope::data_get`](crate::Scope::data_get). They carry a `scopestack#`
//! prefix so they cannot collide with user-supplied data names, which are
//! plain identifiers in templates.

/// Registry of named partial templates available to the whole chain.
pub const PARTIALS: &str = "scopestack#partials";

/// Registry of inline partials declared inside the template being rendered.
pub const INLINE_PARTIALS: &str = "scopestack#inline_partials";

/// Stack of template sources currently being rendered, used by callers for
/// partial-cycle detection.
pub const INVOCATION_STACK: &str = "scopestack#invocation_stack";

/// Number of parameters passed to the helper currently executing.
pub const PARAM_SIZE: &str = "scopestack#param_size";

/// The root scope's model, reachable from any depth as `@root`.
pub const ROOT: &str = "root";

//! Error types for scope construction.
//!
//! The error surface of this crate is deliberately tiny. Every ordinary
//! template-evaluation outcome - a missing variable, an absent dotted leaf,
//! an out-of-range index - is representable as `None` at the lookup boundary,
//! so the executor never needs error-based control flow for "variable not
//! found". The only failures are caller programming errors detected while
//! building a scope, reported synchronously at construction time.

use thiserror::Error;

/// A rejected scope construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// An empty resolver list was supplied to the builder.
    #[error("at least one value resolver must be present")]
    NoResolvers,

    /// Block-parameter names and values could not be zipped into bindings.
    #[error("block parameter names and values differ in length ({names} names, {values} values)")]
    BlockParamMismatch {
        /// Number of names supplied by the helper.
        names: usize,
        /// Number of values supplied by the helper.
        values: usize,
    },
}

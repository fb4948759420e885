//! scopestack - Scope-chain variable resolution for logic-less templates
//!
//! Mustache/Handlebars-style template engines are contextual: every block
//! pushes a new evaluation scope onto a chain, and a variable reference such
//! as `user.address.city`, `../title`, `@partials` or `items.[3]` is resolved
//! by walking that chain. This crate implements the scope chain and the
//! lookup algorithm; it does not parse templates, execute helpers, or render
//! output. The executor hands a path expression to the current [`Scope`] and
//! gets back `Option<serde_json::Value>` - failed lookups are falsy, never
//! errors.
//!
//! # Architecture Overview
//!
//! Resolution runs across four surfaces per scope, in precedence order:
//! - the scope's own model (the value exposed as `this`/`.`)
//! - the "extended" frame of ad-hoc combined values ([`Scope::combine`])
//! - the chain-wide shared data mapping (`@`-prefixed metadata keys)
//! - the parent scope, recursively
//!
//! Dotted names respect the Mustache precedence rule: once a lookup has
//! descended into a sub-object, an absent leaf is final for that path and the
//! parent chain is not consulted.
//!
//! # Core Modules
//!
//! - [`scope`] - Scope nodes, the resolution algorithm, builder and lifecycle
//! - [`resolver`] - The pluggable [`ValueResolver`] contract and defaults
//! - [`path`] - Path-expression parsing (`a.b`, `a/[b.c]/d`, `items.[0]`)
//! - [`constants`] - Reserved keys of the shared data mapping
//! - [`error`] - Builder-misuse errors ([`ScopeError`])
//!
//! # Example
//!
//! ```rust
//! use scopestack::Scope;
//! use serde_json::json;
//!
//! let root = Scope::root(json!({"title": "Home", "nav": {"items": ["a", "b"]}}));
//! assert_eq!(root.get("title"), Some(json!("Home")));
//! assert_eq!(root.get("nav.items.[1]"), Some(json!("b")));
//!
//! let child = Scope::child(&root, json!({"title": "About"}));
//! assert_eq!(child.get("title"), Some(json!("About")));
//! assert_eq!(child.get("../title"), Some(json!("Home")));
//! ```

pub mod constants;
pub mod error;
pub mod path;
pub mod resolver;
pub mod scope;

pub use error::ScopeError;
pub use resolver::{CompositeResolver, MapResolver, Resolved, ValueResolver, default_resolver};
pub use scope::{Scope, ScopeBuilder};

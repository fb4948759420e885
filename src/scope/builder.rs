//! Construction of root, child and block-parameter scopes.
//!
//! The builder wires the pieces a frame needs before its first lookup:
//! the extended frame, the shared data mapping, the parent link, and the
//! resolver. Resolver propagation to the extended frame happens at build
//! finalization, not at attachment time, so an override set after
//! attachment still reaches both surfaces.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::constants;
use crate::error::ScopeError;
use crate::resolver::{CompositeResolver, ValueResolver, default_resolver};

use super::{Scope, ScopeKind};

/// Builder for [`Scope`] frames.
///
/// # Examples
///
/// ```rust
/// use scopestack::{MapResolver, ScopeBuilder};
/// use serde_json::json;
/// use std::rc::Rc;
///
/// # fn example() -> Result<(), scopestack::ScopeError> {
/// let scope = ScopeBuilder::root(json!({"a": 1}))
///     .resolvers(vec![Rc::new(MapResolver)])?
///     .combine("injected", json!(true))
///     .build();
/// assert_eq!(scope.get("a"), Some(json!(1)));
/// assert_eq!(scope.get("injected"), Some(json!(true)));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct ScopeBuilder {
    scope: Scope,
}

impl ScopeBuilder {
    /// Start building a root scope over `model`.
    ///
    /// Allocates the chain's shared data mapping, pre-seeded with the
    /// reserved entries: empty partials and inline-partials registries, an
    /// empty invocation stack, and the root model under
    /// [`constants::ROOT`].
    #[must_use]
    pub fn root(model: Value) -> Self {
        let scope = Scope::bare(ScopeKind::Standard, model.clone(), true);

        let mut data = Map::new();
        data.insert(constants::PARTIALS.to_string(), json!({}));
        data.insert(constants::INLINE_PARTIALS.to_string(), json!({}));
        data.insert(constants::INVOCATION_STACK.to_string(), json!([]));
        data.insert(constants::ROOT.to_string(), model);
        scope.set_data(Some(Rc::new(RefCell::new(data))));

        scope.set_extended(fresh_extended());
        Self {
            scope,
        }
    }

    /// Start building a root scope from any serializable model.
    ///
    /// This is the entry point for record-like hosts: serde serialization
    /// turns them into objects the default resolver understands.
    pub fn from_serialize<T: Serialize>(model: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::root(serde_json::to_value(model)?))
    }

    /// Start building a child scope of `parent` over `model`.
    ///
    /// The child references the parent's data mapping (never a copy) and
    /// will inherit the parent's resolver at build time unless one is set
    /// explicitly. Children of parent-first and block-parameter scopes are
    /// parent-first.
    #[must_use]
    pub fn child(parent: &Scope, model: Value) -> Self {
        let scope = Scope::bare(parent.child_kind(), model, false);
        scope.set_extended(fresh_extended());
        scope.set_parent(parent.clone());
        scope.set_data(parent.data());
        Self {
            scope,
        }
    }

    /// Set the value resolvers, composed in the order given; the first
    /// non-unresolved answer wins.
    ///
    /// # Errors
    ///
    /// Returns [`ScopeError::NoResolvers`] for an empty list.
    pub fn resolvers(self, resolvers: Vec<Rc<dyn ValueResolver>>) -> Result<Self, ScopeError> {
        if resolvers.is_empty() {
            return Err(ScopeError::NoResolvers);
        }
        self.scope.set_resolver(Rc::new(CompositeResolver::new(resolvers)));
        Ok(self)
    }

    /// Insert a named value into the extended frame of the scope being
    /// built.
    #[must_use]
    pub fn combine(self, name: impl Into<String>, value: Value) -> Self {
        self.scope.combine(name, value);
        self
    }

    /// Insert every entry of `entries` into the extended frame.
    #[must_use]
    pub fn combine_map(self, entries: Map<String, Value>) -> Self {
        self.scope.combine_map(entries);
        self
    }

    /// Finalize the frame.
    ///
    /// A frame built without explicit resolvers inherits the parent's; a
    /// root falls back to the built-in default composite. Either way the
    /// resolver is mirrored onto the extended frame here, so overrides set
    /// after attachment propagate correctly.
    #[must_use]
    pub fn build(self) -> Scope {
        let resolver = self
            .scope
            .resolver()
            .or_else(|| self.scope.parent().and_then(|parent| parent.resolver()))
            .unwrap_or_else(default_resolver);
        self.scope.set_resolver(resolver);
        self.scope
    }
}

fn fresh_extended() -> Scope {
    Scope::bare(ScopeKind::Standard, Value::Object(Map::new()), false)
}

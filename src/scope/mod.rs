//! Scope nodes, the resolution algorithm, builder and lifecycle.
//!
//! A [`Scope`] is one frame of the evaluation environment a template renders
//! in. Each frame wraps a model value (exposed as `this`/`.`), a back-link to
//! its parent frame, an "extended" sibling frame for ad-hoc combined values,
//! and a data mapping shared by reference across the whole chain. Lookups
//! walk these surfaces in precedence order; see [`Scope::get`].
//!
//! Frames are cheap-clone handles over shared state, so the executor can
//! pass them around freely while block helpers push child frames. The engine
//! is single-threaded by design - each render owns its own root scope - and
//! is therefore built on `Rc`/`RefCell` rather than atomics.
//!
//! # Scope variants
//!
//! Three behaviors exist, carried as a tag on the frame:
//! - **Standard**: the precedence order described on [`Scope::get`].
//! - **Parent-first**: the parent chain is consulted before the local model;
//!   children of a parent-first frame are parent-first themselves.
//! - **Block-parameter**: the model is a synthetic mapping of helper block
//!   parameters; keys starting with `.` bypass the bindings and resolve
//!   against the designated parent, and children become parent-first so
//!   nearer bindings keep winning transitively.

mod builder;
mod lookup;

pub use builder::ScopeBuilder;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ScopeError;
use crate::path;
use crate::resolver::{Resolved, ValueResolver};
use lookup::Lookup;

/// The data mapping shared by reference across an entire scope chain.
pub(crate) type SharedData = Rc<RefCell<Map<String, Value>>>;

/// Behavior tag distinguishing the scope variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScopeKind {
    Standard,
    ParentFirst,
    BlockParam,
}

struct ScopeInner {
    kind: ScopeKind,
    /// Only the root frame clears the shared data mapping on teardown.
    owns_data: bool,
    model: RefCell<Value>,
    parent: RefCell<Option<Scope>>,
    extended: RefCell<Option<Scope>>,
    data: RefCell<Option<SharedData>>,
    resolver: RefCell<Option<Rc<dyn ValueResolver>>>,
}

/// One frame of the scope chain. Cloning a `Scope` clones the handle, not
/// the frame.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// Create a root scope over `model` with the default resolver.
    ///
    /// Allocates the shared data mapping (pre-seeded with the reserved
    /// entries from [`crate::constants`]) and a fresh extended frame.
    #[must_use]
    pub fn root(model: Value) -> Self {
        ScopeBuilder::root(model).build()
    }

    /// Create a child scope of `parent` over `model`.
    ///
    /// The child shares the parent's data mapping by reference and inherits
    /// its resolver.
    #[must_use]
    pub fn child(parent: &Self, model: Value) -> Self {
        ScopeBuilder::child(parent, model).build()
    }

    /// Create a block-parameter scope under `parent` from parallel name and
    /// value sequences.
    ///
    /// The sequences are zipped into the synthetic model; mismatched lengths
    /// are rejected. The data mapping is copied by reference directly from
    /// the designated parent.
    pub fn block_params(
        parent: &Self,
        names: Vec<String>,
        values: Vec<Value>,
    ) -> Result<Self, ScopeError> {
        if names.len() != values.len() {
            return Err(ScopeError::BlockParamMismatch {
                names: names.len(),
                values: values.len(),
            });
        }
        let mut bindings = Map::new();
        for (name, value) in names.into_iter().zip(values) {
            bindings.insert(name, value);
        }

        let scope = Self::bare(ScopeKind::BlockParam, Value::Object(bindings), false);
        scope.set_extended(Self::bare(ScopeKind::Standard, Value::Object(Map::new()), false));
        scope.set_parent(parent.clone());
        scope.set_data(parent.data());
        if let Some(resolver) = parent.resolver() {
            scope.set_resolver(resolver);
        }
        Ok(scope)
    }

    /// Lookup `key` against this scope chain.
    ///
    /// Returns `None` for every kind of miss: unknown names, absent dotted
    /// leaves, out-of-range indices and null values all collapse to `None`
    /// at this boundary, matching falsy template semantics.
    ///
    /// Key grammar:
    /// - `.` / `this` - the scope's own model, self-resolved;
    /// - `..` - the parent's model; `../x` - `x` looked up on the parent;
    /// - `@name` - metadata from the shared data mapping;
    /// - anything else - a dotted/bracketed property path resolved across
    ///   the local model, the extended frame, the data mapping and finally
    ///   the parent chain. Once a dotted lookup has descended into a found
    ///   sub-object, an absent leaf there is final: the parent chain is not
    ///   consulted for that path.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.inner.kind {
            ScopeKind::BlockParam => {
                if key.starts_with('.') {
                    // Pathed references bypass the block-param bindings and
                    // resolve against the designated parent.
                    return self.parent().and_then(|parent| parent.get(key));
                }
                self.get_standard(key)
            }
            ScopeKind::ParentFirst => {
                if let Some(value) = self.parent().and_then(|parent| parent.get(key)) {
                    return Some(value);
                }
                self.get_standard(key)
            }
            ScopeKind::Standard => self.get_standard(key),
        }
    }

    fn get_standard(&self, key: &str) -> Option<Value> {
        if key == "." || key == "this" {
            return self.self_value();
        }

        if let Some(rest) = key.strip_prefix("..") {
            let parent = self.parent()?;
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            return if rest.is_empty() {
                parent.self_value()
            } else {
                parent.get(rest)
            };
        }

        let segments = path::parse(key);
        let result = self.lookup(key, &segments);
        debug!(key, found = matches!(result, Lookup::Found(_)), "scope lookup");
        match result {
            Lookup::Found(value) => Some(value),
            // The absent marker never leaks past the public boundary.
            Lookup::FoundAbsent | Lookup::NotFound => None,
        }
    }

    /// The model's self-resolution: the resolver may unwrap wrapper-like
    /// hosts, otherwise the raw model stands.
    fn self_value(&self) -> Option<Value> {
        let model = self.model();
        let resolved =
            self.resolver().map_or(Resolved::Unresolved, |resolver| resolver.resolve_self(&model));
        let value = match resolved {
            Resolved::Value(value) => value,
            Resolved::Unresolved => model,
        };
        if value.is_null() {
            None
        } else {
            Some(value)
        }
    }

    /// Insert a named value into the extended frame.
    pub fn combine(&self, name: impl Into<String>, value: Value) -> &Self {
        if let Some(extended) = self.extended() {
            extended.insert_model_entry(name.into(), value);
        }
        self
    }

    /// Insert every entry of `entries` into the extended frame.
    pub fn combine_map(&self, entries: Map<String, Value>) -> &Self {
        if let Some(extended) = self.extended() {
            for (name, value) in entries {
                extended.insert_model_entry(name, value);
            }
        }
        self
    }

    /// Read an attribute from the shared data mapping.
    #[must_use]
    pub fn data_get(&self, name: &str) -> Option<Value> {
        self.data().and_then(|data| data.borrow().get(name).cloned())
    }

    /// Set an attribute in the shared data mapping; visible to every frame
    /// in the chain.
    pub fn data_set(&self, name: impl Into<String>, value: Value) -> &Self {
        if let Some(data) = self.data() {
            data.borrow_mut().insert(name.into(), value);
        }
        self
    }

    /// Merge every entry of `entries` into the shared data mapping.
    pub fn data_merge(&self, entries: Map<String, Value>) -> &Self {
        if let Some(data) = self.data() {
            data.borrow_mut().extend(entries);
        }
        self
    }

    /// The model this frame exposes as `this`/`.`.
    #[must_use]
    pub fn model(&self) -> Value {
        self.inner.model.borrow().clone()
    }

    /// The parent frame, or `None` on a root (or destroyed) scope.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.inner.parent.borrow().clone()
    }

    /// Enumerate the resolvable properties of the model, for iteration
    /// constructs.
    #[must_use]
    pub fn property_set(&self) -> Vec<(String, Value)> {
        self.property_set_of(&self.model())
    }

    /// Enumerate the resolvable properties of an arbitrary host value using
    /// this scope's resolver.
    #[must_use]
    pub fn property_set_of(&self, host: &Value) -> Vec<(String, Value)> {
        if host.is_null() {
            return Vec::new();
        }
        self.resolver().map_or_else(Vec::new, |resolver| resolver.property_set(host))
    }

    /// True when this frame is a block-parameter scope, for helpers that
    /// special-case block-param bindings.
    #[must_use]
    pub fn is_block_params(&self) -> bool {
        self.inner.kind == ScopeKind::BlockParam
    }

    /// Tear this frame down: drop the model, destroy the extended frame, and
    /// release the parent/resolver/data references. Only a root frame clears
    /// the shared data mapping - descendants hold a non-owning reference.
    pub fn destroy(&self) {
        *self.inner.model.borrow_mut() = Value::Null;
        if self.inner.owns_data {
            if let Some(data) = self.data() {
                data.borrow_mut().clear();
            }
        }
        let extended = self.inner.extended.borrow_mut().take();
        if let Some(extended) = extended {
            extended.destroy();
        }
        *self.inner.parent.borrow_mut() = None;
        *self.inner.resolver.borrow_mut() = None;
        *self.inner.data.borrow_mut() = None;
    }

    /// A frame with no wiring: no parent, extended frame, data or resolver.
    pub(crate) fn bare(kind: ScopeKind, model: Value, owns_data: bool) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                kind,
                owns_data,
                model: RefCell::new(model),
                parent: RefCell::new(None),
                extended: RefCell::new(None),
                data: RefCell::new(None),
                resolver: RefCell::new(None),
            }),
        }
    }

    /// A detached standalone scope for data-stack fallback lookups: same
    /// resolver, fresh extended frame, no data reference so the lookup does
    /// not extend further.
    pub(crate) fn detached(model: Value, resolver: Option<Rc<dyn ValueResolver>>) -> Self {
        let scope = Self::bare(ScopeKind::Standard, model, false);
        scope.set_extended(Self::bare(ScopeKind::Standard, Value::Object(Map::new()), false));
        if let Some(resolver) = resolver {
            scope.set_resolver(resolver);
        }
        scope
    }

    /// Variant of the children this frame spawns.
    pub(crate) fn child_kind(&self) -> ScopeKind {
        match self.inner.kind {
            ScopeKind::Standard => ScopeKind::Standard,
            // Block-param children prefer the nearer bindings transitively.
            ScopeKind::ParentFirst | ScopeKind::BlockParam => ScopeKind::ParentFirst,
        }
    }

    /// Set the resolver and mirror it onto the extended frame so both
    /// surfaces resolve consistently.
    pub(crate) fn set_resolver(&self, resolver: Rc<dyn ValueResolver>) {
        if let Some(extended) = self.extended() {
            *extended.inner.resolver.borrow_mut() = Some(Rc::clone(&resolver));
        }
        *self.inner.resolver.borrow_mut() = Some(resolver);
    }

    pub(crate) fn resolver(&self) -> Option<Rc<dyn ValueResolver>> {
        self.inner.resolver.borrow().clone()
    }

    pub(crate) fn extended(&self) -> Option<Self> {
        self.inner.extended.borrow().clone()
    }

    pub(crate) fn data(&self) -> Option<SharedData> {
        self.inner.data.borrow().clone()
    }

    pub(crate) fn set_parent(&self, parent: Self) {
        *self.inner.parent.borrow_mut() = Some(parent);
    }

    pub(crate) fn set_data(&self, data: Option<SharedData>) {
        *self.inner.data.borrow_mut() = data;
    }

    pub(crate) fn set_extended(&self, extended: Self) {
        *self.inner.extended.borrow_mut() = Some(extended);
    }

    fn insert_model_entry(&self, name: String, value: Value) {
        if let Value::Object(map) = &mut *self.inner.model.borrow_mut() {
            map.insert(name, value);
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.inner.kind)
            .field("model", &*self.inner.model.borrow())
            .field("has_parent", &self.inner.parent.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_dot_and_this_agree() {
        let scope = Scope::root(json!({"a": 1}));
        assert_eq!(scope.get("."), scope.get("this"));
        assert_eq!(scope.get("."), Some(json!({"a": 1})));
    }

    #[test]
    fn test_identity_of_null_model_is_none() {
        let scope = Scope::root(Value::Null);
        assert_eq!(scope.get("."), None);
        assert_eq!(scope.get("this"), None);
    }

    #[test]
    fn test_parent_jump_resolves_parent_model() {
        let root = Scope::root(json!({"title": "Home"}));
        let child = Scope::child(&root, json!({"title": "About"}));
        assert_eq!(child.get(".."), Some(json!({"title": "Home"})));
        assert_eq!(child.get("../title"), Some(json!("Home")));
    }

    #[test]
    fn test_parent_jump_without_parent_is_none() {
        let root = Scope::root(json!({"a": 1}));
        assert_eq!(root.get(".."), None);
        assert_eq!(root.get("../a"), None);
    }

    #[test]
    fn test_combine_feeds_extended_frame() {
        let scope = Scope::root(json!({"a": 1}));
        scope.combine("injected", json!("extra"));
        assert_eq!(scope.get("injected"), Some(json!("extra")));
        // Local model still wins over the extended frame.
        scope.combine("a", json!(99));
        assert_eq!(scope.get("a"), Some(json!(1)));
    }

    #[test]
    fn test_combine_map_inserts_all_entries() {
        let scope = Scope::root(json!({}));
        let mut entries = Map::new();
        entries.insert("x".to_string(), json!(1));
        entries.insert("y".to_string(), json!(2));
        scope.combine_map(entries);
        assert_eq!(scope.get("x"), Some(json!(1)));
        assert_eq!(scope.get("y"), Some(json!(2)));
    }

    #[test]
    fn test_data_shared_across_chain() {
        let root = Scope::root(json!({}));
        let child = Scope::child(&root, json!({}));
        let grandchild = Scope::child(&child, json!({}));

        root.data_set("flag", json!(true));
        assert_eq!(grandchild.data_get("flag"), Some(json!(true)));

        // Mutations from a descendant are visible at the root too.
        grandchild.data_set("flag", json!(false));
        assert_eq!(root.data_get("flag"), Some(json!(false)));
    }

    #[test]
    fn test_root_data_seeded_with_reserved_entries() {
        let root = Scope::root(json!({"a": 1}));
        assert_eq!(root.data_get(crate::constants::PARTIALS), Some(json!({})));
        assert_eq!(root.data_get(crate::constants::INLINE_PARTIALS), Some(json!({})));
        assert_eq!(root.data_get(crate::constants::INVOCATION_STACK), Some(json!([])));
        assert_eq!(root.data_get(crate::constants::ROOT), Some(json!({"a": 1})));
    }

    #[test]
    fn test_block_params_zips_bindings() {
        let parent = Scope::root(json!({"x": 1}));
        let scope =
            Scope::block_params(&parent, vec!["y".to_string()], vec![json!(2)]).unwrap();
        assert!(scope.is_block_params());
        assert_eq!(scope.get("y"), Some(json!(2)));
    }

    #[test]
    fn test_block_params_rejects_mismatched_lengths() {
        let parent = Scope::root(json!({}));
        let err = Scope::block_params(&parent, vec!["y".to_string()], vec![]).unwrap_err();
        assert_eq!(
            err,
            ScopeError::BlockParamMismatch {
                names: 1,
                values: 0
            }
        );
    }

    #[test]
    fn test_block_params_dotted_key_routes_to_parent() {
        let parent = Scope::root(json!({"x": 1}));
        let scope = Scope::block_params(
            &parent,
            vec!["x".to_string()],
            vec![json!("shadow")],
        )
        .unwrap();
        // Bare name hits the binding, pathed reference bypasses it.
        assert_eq!(scope.get("x"), Some(json!("shadow")));
        assert_eq!(scope.get(".x"), Some(json!(1)));
    }

    #[test]
    fn test_child_of_block_params_is_parent_first() {
        let parent = Scope::root(json!({}));
        let block = Scope::block_params(
            &parent,
            vec!["item".to_string()],
            vec![json!("bound")],
        )
        .unwrap();
        let inner = Scope::child(&block, json!({"item": "local"}));
        // The nearer block-param binding wins over the child's own model.
        assert_eq!(inner.get("item"), Some(json!("bound")));
    }

    #[test]
    fn test_parent_first_falls_back_to_local() {
        let parent = Scope::root(json!({}));
        let block = Scope::block_params(&parent, vec![], vec![]).unwrap();
        let inner = Scope::child(&block, json!({"only_local": 7}));
        assert_eq!(inner.get("only_local"), Some(json!(7)));
    }

    #[test]
    fn test_property_set_lists_model_entries() {
        let scope = Scope::root(json!({"a": 1, "b": 2}));
        let properties = scope.property_set();
        assert_eq!(properties.len(), 2);
        assert!(properties.contains(&("b".to_string(), json!(2))));
    }

    #[test]
    fn test_property_set_of_null_is_empty() {
        let scope = Scope::root(json!({}));
        assert!(scope.property_set_of(&Value::Null).is_empty());
    }

    #[test]
    fn test_destroy_root_clears_data() {
        let root = Scope::root(json!({"a": 1}));
        let data = root.data().expect("root owns a data mapping");
        root.destroy();
        assert!(data.borrow().is_empty(), "root teardown must clear the shared data mapping");
        assert_eq!(root.model(), Value::Null);
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_destroy_child_leaves_data_intact() {
        let root = Scope::root(json!({}));
        root.data_set("keep", json!("me"));
        let child = Scope::child(&root, json!({}));
        child.destroy();
        assert_eq!(root.data_get("keep"), Some(json!("me")));
    }

    #[test]
    fn test_lookup_after_destroy_is_none() {
        let scope = Scope::root(json!({"a": 1}));
        scope.destroy();
        assert_eq!(scope.get("a"), None);
        assert_eq!(scope.get("."), None);
    }
}

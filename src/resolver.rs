//! The pluggable value-resolver contract.
//!
//! A [`ValueResolver`] knows how to read a named property off a host value.
//! Resolvers compose: a [`CompositeResolver`] chains several of them and
//! short-circuits at the first that answers with anything other than
//! [`Resolved::Unresolved`]. This keeps the lookup algorithm independent of
//! host-value shapes - embedders register a resolver per shape they care
//! about and the scope chain consults the composite for every segment.
//!
//! The answer type is deliberately three-way at this layer:
//! `Resolved::Value(Value::Null)` means "the property exists and is null",
//! while `Resolved::Unresolved` means "this resolver has no opinion". The
//! distinction is what lets dotted-name precedence tell an absent leaf apart
//! from a present-but-null one.
//!
//! Record-like hosts do not need a dedicated resolver: serializing them with
//! `serde` produces a `Value::Object`, which [`MapResolver`] (the built-in
//! default) already handles.

use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;

/// Outcome of asking a resolver for a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The resolver has no opinion about this host/property pair, allowing
    /// the next resolver in a composite to answer.
    Unresolved,
    /// The resolver answered. `Value::Null` here means the property exists
    /// and is null - not that it is absent.
    Value(Value),
}

impl Resolved {
    /// True when the resolver declined to answer.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }
}

/// Capability of reading named properties off a host value.
pub trait ValueResolver {
    /// Attempt to read property `name` off `host`.
    fn resolve(&self, host: &Value, name: &str) -> Resolved;

    /// Resolve the identity/self value of `host`, used for `this`/`.` so
    /// wrapper-like hosts can unwrap themselves. Most resolvers decline and
    /// the scope falls back to the raw model.
    fn resolve_self(&self, _host: &Value) -> Resolved {
        Resolved::Unresolved
    }

    /// Enumerate the resolvable properties of `host` for iteration
    /// constructs. Not required to be exhaustive for opaque hosts.
    fn property_set(&self, _host: &Value) -> Vec<(String, Value)> {
        Vec::new()
    }
}

/// Resolver for string-keyed mappings (`Value::Object` hosts).
///
/// This is the workhorse: both JSON objects and serde-serialized records end
/// up as objects, so a chain built without explicit resolvers still resolves
/// everything a logic-less template can name.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapResolver;

impl ValueResolver for MapResolver {
    fn resolve(&self, host: &Value, name: &str) -> Resolved {
        match host {
            Value::Object(map) => {
                map.get(name).cloned().map_or(Resolved::Unresolved, Resolved::Value)
            }
            _ => Resolved::Unresolved,
        }
    }

    fn property_set(&self, host: &Value) -> Vec<(String, Value)> {
        match host {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Vec::new(),
        }
    }
}

/// Ordered chain of resolvers; the first non-[`Resolved::Unresolved`] answer
/// wins.
pub struct CompositeResolver {
    resolvers: Vec<Rc<dyn ValueResolver>>,
}

impl CompositeResolver {
    /// Create a composite from resolvers tried in the order given.
    #[must_use]
    pub fn new(resolvers: Vec<Rc<dyn ValueResolver>>) -> Self {
        Self {
            resolvers,
        }
    }
}

impl ValueResolver for CompositeResolver {
    fn resolve(&self, host: &Value, name: &str) -> Resolved {
        for resolver in &self.resolvers {
            let answer = resolver.resolve(host, name);
            if !answer.is_unresolved() {
                return answer;
            }
        }
        Resolved::Unresolved
    }

    fn resolve_self(&self, host: &Value) -> Resolved {
        for resolver in &self.resolvers {
            let answer = resolver.resolve_self(host);
            if !answer.is_unresolved() {
                return answer;
            }
        }
        Resolved::Unresolved
    }

    fn property_set(&self, host: &Value) -> Vec<(String, Value)> {
        let mut seen = HashSet::new();
        let mut properties = Vec::new();
        for resolver in &self.resolvers {
            for (name, value) in resolver.property_set(host) {
                // De-duplicate by name, keeping the first resolver's answer.
                if seen.insert(name.clone()) {
                    properties.push((name, value));
                }
            }
        }
        properties
    }
}

/// The built-in default composite used when a root scope is built without
/// explicit resolvers.
#[must_use]
pub fn default_resolver() -> Rc<dyn ValueResolver> {
    Rc::new(CompositeResolver::new(vec![Rc::new(MapResolver)]))
}

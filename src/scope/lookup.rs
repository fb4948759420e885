//! The tiered lookup algorithm behind [`Scope::get`].
//!
//! Lookups thread a three-valued result through the recursion:
//! found-with-value, found-but-absent, and not-found. The middle state
//! implements the dotted-name precedence rule - once a walk has descended
//! into a found sub-object, an absent leaf there is final and must stop the
//! remaining precedence tiers, including parent delegation. Only the public
//! boundary collapses the three states down to `Option<Value>`.

use serde_json::Value;
use tracing::trace;

use crate::path;
use crate::resolver::Resolved;

use super::{Scope, SharedData};

/// Result of a lookup against one scope's precedence tiers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lookup {
    /// The path resolved to a (non-null) value.
    Found(Value),
    /// The path descended into a found sub-scope whose leaf is absent or
    /// null. Final for this path: later tiers must not be consulted.
    FoundAbsent,
    /// Nothing in this tier claimed the path; keep searching.
    NotFound,
}

/// Resolution of a single path segment against an intermediate value.
enum SegmentValue {
    /// No resolver claimed the property.
    Missing,
    /// The property exists and is null.
    NullMarker,
    /// The property resolved to a concrete non-null value.
    Value(Value),
}

/// Outcome of integer-indexed access on a host.
enum IndexAccess {
    /// The element at the offset; may itself be null.
    Element(Value),
    /// The host is a sequence but the offset is outside it.
    OutOfRange,
    /// The host is not sequence-shaped; callers fall back to name-based
    /// resolution instead of failing outright.
    NotIndexable,
}

impl Scope {
    /// Run the precedence tiers for `key` against this frame: local model
    /// walk, extended frame, data mapping, then the parent chain.
    pub(crate) fn lookup(&self, key: &str, segments: &[String]) -> Lookup {
        match self.walk(segments) {
            Lookup::NotFound => {}
            hit => return hit,
        }

        if let Some(extended) = self.extended() {
            match extended.lookup(key, segments) {
                Lookup::NotFound => {}
                hit => {
                    trace!(key, "resolved in extended frame");
                    return hit;
                }
            }
        }

        if let Some(data) = self.data() {
            let name = key.strip_prefix('@').unwrap_or(key);
            let direct = data.borrow().get(name).filter(|value| !value.is_null()).cloned();
            if let Some(value) = direct {
                trace!(key, "resolved in data mapping");
                return Lookup::Found(value);
            }
            if segments.len() > 1 {
                match self.data_fallback(&data, name) {
                    Lookup::NotFound => {}
                    hit => return hit,
                }
            }
        }

        // A `this`-qualified path that failed locally must not accidentally
        // find the name somewhere up the chain.
        if segments.first().map(String::as_str) != Some("this") {
            if let Some(parent) = self.parent() {
                return parent.lookup(key, segments);
            }
        }

        Lookup::NotFound
    }

    /// Walk the segments against this frame's own model.
    fn walk(&self, segments: &[String]) -> Lookup {
        let Some((last, intermediates)) = segments.split_last() else {
            return Lookup::NotFound;
        };
        let start = usize::from(segments[0] == "this");

        let mut current = SegmentValue::Value(self.model());
        let mut descended = false;
        for segment in intermediates.iter().skip(start) {
            current = match current {
                SegmentValue::Value(ref value) => self.resolve_segment(value, segment),
                // Descending through a null node yields nothing.
                SegmentValue::NullMarker | SegmentValue::Missing => SegmentValue::Missing,
            };
            descended = true;
            if matches!(current, SegmentValue::Missing) {
                return Lookup::NotFound;
            }
        }

        match current {
            SegmentValue::Missing => Lookup::NotFound,
            // The walk ended on a present-but-null node: final here.
            SegmentValue::NullMarker => Lookup::FoundAbsent,
            SegmentValue::Value(value) => match self.resolve_segment(&value, last) {
                SegmentValue::Value(value) => Lookup::Found(value),
                SegmentValue::NullMarker => Lookup::FoundAbsent,
                SegmentValue::Missing => {
                    if descended {
                        // Inside a found sub-scope but the leaf is absent.
                        Lookup::FoundAbsent
                    } else {
                        Lookup::NotFound
                    }
                }
            },
        }
    }

    /// Compound data keys retry through a detached scope rooted at the data
    /// mapping; the temporary scope is destroyed regardless of outcome.
    fn data_fallback(&self, data: &SharedData, name: &str) -> Lookup {
        // Data can change between renders, so the detached scope is built
        // fresh per invocation from the mapping's current contents.
        let snapshot = Value::Object(data.borrow().clone());
        let detached = Scope::detached(snapshot, self.resolver());
        let segments = path::parse(name);
        let result = detached.lookup(name, &segments);
        detached.destroy();
        trace!(name, found = matches!(result, Lookup::Found(_)), "data fallback lookup");
        result
    }

    /// Resolve one segment against an intermediate value.
    fn resolve_segment(&self, current: &Value, segment: &str) -> SegmentValue {
        if current.is_null() {
            return SegmentValue::Missing;
        }

        match self.resolve_property(current, segment) {
            SegmentValue::Missing => {}
            answer => return answer,
        }

        // Sequence indexing and non-identifier property names wrapped in [].
        if let Some(inner) = bracket_inner(segment) {
            if is_digits(inner) {
                match index_access(current, inner) {
                    IndexAccess::Element(value) if !value.is_null() => {
                        return SegmentValue::Value(value);
                    }
                    IndexAccess::Element(_) | IndexAccess::OutOfRange => {
                        return SegmentValue::Missing;
                    }
                    IndexAccess::NotIndexable => {}
                }
            }
            // Not an index-based host: the unwrapped text is a property name.
            return self.resolve_property(current, inner);
        }

        if is_digits(segment) {
            match index_access(current, segment) {
                IndexAccess::Element(value) if !value.is_null() => {
                    return SegmentValue::Value(value);
                }
                IndexAccess::Element(_) | IndexAccess::OutOfRange => {
                    return SegmentValue::Missing;
                }
                IndexAccess::NotIndexable => {}
            }
        }

        SegmentValue::Missing
    }

    /// Ask the resolver for a named property and classify the answer.
    fn resolve_property(&self, host: &Value, name: &str) -> SegmentValue {
        let resolved =
            self.resolver().map_or(Resolved::Unresolved, |resolver| resolver.resolve(host, name));
        match resolved {
            Resolved::Value(Value::Null) => SegmentValue::NullMarker,
            Resolved::Value(value) => SegmentValue::Value(value),
            Resolved::Unresolved => SegmentValue::Missing,
        }
    }
}

/// The inner text of a `[...]`-wrapped segment.
fn bracket_inner(segment: &str) -> Option<&str> {
    if segment.len() >= 2 && segment.starts_with('[') && segment.ends_with(']') {
        Some(&segment[1..segment.len() - 1])
    } else {
        None
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Integer-indexed access for sequence-shaped hosts.
fn index_access(host: &Value, digits: &str) -> IndexAccess {
    match host {
        Value::Array(items) => match digits.parse::<usize>() {
            Ok(index) => {
                items.get(index).cloned().map_or(IndexAccess::OutOfRange, IndexAccess::Element)
            }
            // Larger than any addressable offset.
            Err(_) => IndexAccess::OutOfRange,
        },
        _ => IndexAccess::NotIndexable,
    }
}

//! Compiled lookup layer: a static exact-match table plus a bloom-gated
//! dynamic pattern list, built once at freeze time.
//!
//! A miss here is never authoritative — constraint-bearing and
//! conflict-sensitive routes are resolved definitively only by the radix
//! tree, so the dispatcher always falls through to tree traversal on a
//! compiled-layer miss.

pub mod bloom;

use crate::constraint::ConstraintSet;
use crate::handler::HandlerChain;
use crate::pattern::{Pattern, Segment};
use bloom::BloomFilter;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

/// A single compiled route, shared between the static table and the
/// dynamic list.
pub struct CompiledRoute {
    pub handlers: Arc<HandlerChain>,
    pub pattern: String,
    pub constraints: ConstraintSet,
}

/// One entry in the dynamic list: a parsed pattern paired with its
/// compiled route.
pub struct DynamicEntry {
    pub pattern: Pattern,
    pub route: CompiledRoute,
}

#[derive(Default)]
pub struct CompiledLookup {
    static_table: HashMap<(Method, String), CompiledRoute>,
    dynamic: Vec<(Method, DynamicEntry)>,
    bloom: BloomFilter,
}

impl CompiledLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the compiled layer from every pending registration. Static
    /// patterns go into the exact-match table; dynamic patterns populate
    /// the ordered list (most specific priority first) and seed the bloom
    /// filter with their first static prefix segment.
    pub fn build(entries: Vec<(Method, Pattern, CompiledRoute)>) -> Self {
        let mut lookup = Self::new();
        for (method, pattern, route) in entries {
            if pattern.is_static() {
                lookup
                    .static_table
                    .insert((method, pattern.source().to_string()), route);
            } else {
                lookup.bloom.insert(bloom_key(&method, &pattern).as_bytes());
                lookup.dynamic.push((method, DynamicEntry { pattern, route }));
            }
        }
        // Parameter patterns are tried before wildcard patterns at the same
        // depth, matching the radix tree's own tie-break order.
        lookup
            .dynamic
            .sort_by_key(|(_, entry)| std::cmp::Reverse(entry.pattern.priority()));
        lookup
    }

    pub fn lookup_static(&self, method: &Method, path: &str) -> Option<&CompiledRoute> {
        self.static_table.get(&(method.clone(), path.to_string()))
    }

    /// Consult the bloom filter first; a negative answer means no
    /// registered dynamic pattern could possibly match and the dynamic
    /// list scan is skipped entirely. A positive answer then scans the
    /// list in priority order, accepting the first candidate whose shape
    /// matches `segments` and whose constraints admit the captured values.
    pub fn lookup_dynamic(
        &self,
        method: &Method,
        path_prefix: &str,
        segments: &[&str],
    ) -> Option<(&CompiledRoute, Vec<(String, String)>)> {
        if !self.might_match_dynamic(method, path_prefix) {
            return None;
        }
        for entry in self.dynamic_entries(method) {
            let Some(params) = match_pattern(&entry.pattern, segments) else {
                continue;
            };
            let captured: Vec<(&str, &str)> =
                params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            if entry.route.constraints.check(&captured) {
                return Some((&entry.route, params));
            }
        }
        None
    }

    fn might_match_dynamic(&self, method: &Method, path_prefix: &str) -> bool {
        self.bloom
            .might_contain(bloom_key_raw(method, path_prefix).as_bytes())
    }

    fn dynamic_entries<'a, 'b>(
        &'a self,
        method: &'b Method,
    ) -> impl Iterator<Item = &'a DynamicEntry> + 'b
    where
        'a: 'b,
    {
        self.dynamic
            .iter()
            .filter(move |(m, _)| m == method)
            .map(|(_, entry)| entry)
    }
}

/// Match `segments` against `pattern`'s shape directly (no tree descent):
/// static segments must match literally, parameter segments capture
/// exactly one segment, and a trailing wildcard captures everything that
/// remains, including an empty remainder on an exact-prefix match.
fn match_pattern(pattern: &Pattern, segments: &[&str]) -> Option<Vec<(String, String)>> {
    let mut params = Vec::new();
    let mut si = 0;
    for seg in pattern.segments() {
        match seg {
            Segment::Static(literal) => {
                if segments.get(si) != Some(&literal.as_str()) {
                    return None;
                }
                si += 1;
            }
            Segment::Param(name) => {
                let value = segments.get(si)?;
                params.push((name.clone(), value.to_string()));
                si += 1;
            }
            Segment::Wildcard(name) => {
                params.push((name.clone(), segments[si..].join("/")));
                si = segments.len();
            }
        }
    }
    (si == segments.len()).then_some(params)
}

fn bloom_key(method: &Method, pattern: &Pattern) -> String {
    let first_static = pattern
        .segments()
        .iter()
        .find_map(|s| match s {
            crate::pattern::Segment::Static(s) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        })
        .unwrap_or("");
    bloom_key_raw(method, first_static)
}

fn bloom_key_raw(method: &Method, prefix: &str) -> String {
    format!("{method}:{prefix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintSet;

    fn route() -> CompiledRoute {
        CompiledRoute {
            handlers: Arc::new(HandlerChain::default()),
            pattern: "/x".into(),
            constraints: ConstraintSet::new(),
        }
    }

    #[test]
    fn static_patterns_land_in_the_exact_match_table() {
        let pattern = Pattern::parse("/users/me").unwrap();
        let lookup = CompiledLookup::build(vec![(Method::GET, pattern, route())]);
        assert!(lookup.lookup_static(&Method::GET, "/users/me").is_some());
        assert!(lookup.lookup_static(&Method::POST, "/users/me").is_none());
    }

    #[test]
    fn dynamic_patterns_are_excluded_from_the_static_table() {
        let pattern = Pattern::parse("/users/:id").unwrap();
        let lookup = CompiledLookup::build(vec![(Method::GET, pattern, route())]);
        assert!(lookup.lookup_static(&Method::GET, "/users/:id").is_none());
        assert_eq!(lookup.dynamic_entries(&Method::GET).count(), 1);
    }

    #[test]
    fn bloom_filter_rejects_an_unrelated_prefix() {
        let pattern = Pattern::parse("/orders/:id").unwrap();
        let lookup = CompiledLookup::build(vec![(Method::GET, pattern, route())]);
        assert!(lookup.might_match_dynamic(&Method::GET, "orders"));
        assert!(!lookup.might_match_dynamic(&Method::GET, "completely-unrelated"));
    }
}

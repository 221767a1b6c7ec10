//! Radix tree lookup: segment-by-segment descent with backtracking.
//!
//! Tie-break order at any branch point is static > parameter > wildcard,
//! matching the pattern parser's [`crate::pattern::Priority`] ordering.
//! Constraint rejection causes the traversal to back out and try the next
//! less-specific alternative rather than failing outright.

use crate::radix::node::{RadixNode, Terminal};

/// Result of a successful lookup: the terminal and the parameters captured
/// along the accepting path, in declaration order.
pub struct Match<'a> {
    pub terminal: &'a Terminal,
    pub params: Vec<(String, String)>,
}

impl RadixNode {
    /// Look up `path` (already split into segments) for `method`. Commits
    /// captured parameters to the returned `Match` only once every
    /// constraint on the accepting terminal has passed — rejected branches
    /// never leak partial captures.
    pub fn lookup<'a>(&'a self, segments: &[&str], method: &http::Method) -> Option<Match<'a>> {
        let mut params = Vec::new();
        let terminal = self.lookup_inner(segments, method, &mut params)?;
        Some(Match { terminal, params })
    }

    fn lookup_inner<'a>(
        &'a self,
        segments: &[&str],
        method: &http::Method,
        params: &mut Vec<(String, String)>,
    ) -> Option<&'a Terminal> {
        if segments.is_empty() {
            if let Some(terminal) = self.terminals.get(method) {
                let captured: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                if terminal.constraints.check(&captured) {
                    return Some(terminal);
                }
            }

            // An exact match on the path up to (but not past) a wildcard
            // child's mount point still satisfies that wildcard, with an
            // empty capture — e.g. a request for `/static` against a
            // registered `/static/*path`.
            if let (Some(name), Some(child)) = (&self.wildcard_name, &self.wildcard_child) {
                if let Some(terminal) = child.terminals.get(method) {
                    params.push((name.clone(), String::new()));
                    let captured: Vec<(&str, &str)> = params
                        .iter()
                        .map(|(k, v)| (k.as_str(), v.as_str()))
                        .collect();
                    if terminal.constraints.check(&captured) {
                        return Some(terminal);
                    }
                    params.pop();
                }
            }

            return None;
        }

        let head = segments[0];
        let rest = &segments[1..];

        // Static children win ties; try every same-byte-prefix match (there
        // is at most one per our insertion invariant, but scan defensively).
        for child in &self.children {
            if child.segment == head {
                if let Some(t) = child.lookup_inner(rest, method, params) {
                    return Some(t);
                }
            }
        }

        if let (Some(name), Some(child)) = (&self.param_name, &self.param_child) {
            params.push((name.clone(), head.to_string()));
            if let Some(t) = child.lookup_inner(rest, method, params) {
                return Some(t);
            }
            params.pop();
        }

        if let (Some(name), Some(child)) = (&self.wildcard_name, &self.wildcard_child) {
            let captured_rest = segments.join("/");
            params.push((name.clone(), captured_rest));
            if let Some(terminal) = child.terminals.get(method) {
                let captured: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                if terminal.constraints.check(&captured) {
                    return Some(terminal);
                }
            }
            params.pop();
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, ConstraintSet};
    use crate::handler::HandlerChain;
    use crate::pattern::Pattern;
    use http::Method;
    use std::sync::Arc;

    fn terminal(pattern: &str) -> Terminal {
        Terminal {
            handlers: Arc::new(HandlerChain::default()),
            pattern: pattern.to_string(),
            constraints: ConstraintSet::new(),
            param_names: Vec::new(),
        }
    }

    fn insert(root: &mut RadixNode, pattern: &str, method: Method, t: Terminal) {
        let parsed = Pattern::parse(pattern).unwrap();
        root.insert(parsed.segments(), method, t).unwrap();
    }

    #[test]
    fn static_beats_param_at_same_depth() {
        let mut root = RadixNode::new("");
        insert(&mut root, "/users/me", Method::GET, terminal("/users/me"));
        insert(&mut root, "/users/:id", Method::GET, terminal("/users/:id"));

        let m = root.lookup(&["users", "me"], &Method::GET).unwrap();
        assert_eq!(m.terminal.pattern, "/users/me");
        assert!(m.params.is_empty());
    }

    #[test]
    fn param_beats_wildcard_at_same_depth() {
        let mut root = RadixNode::new("");
        insert(&mut root, "/files/:name", Method::GET, terminal("/files/:name"));
        insert(&mut root, "/files/*rest", Method::GET, terminal("/files/*rest"));

        let m = root.lookup(&["files", "report.pdf"], &Method::GET).unwrap();
        assert_eq!(m.terminal.pattern, "/files/:name");
    }

    #[test]
    fn wildcard_captures_remaining_path_with_slashes() {
        let mut root = RadixNode::new("");
        insert(&mut root, "/static/*path", Method::GET, terminal("/static/*path"));

        let m = root
            .lookup(&["static", "css", "app.css"], &Method::GET)
            .unwrap();
        assert_eq!(m.params, vec![("path".to_string(), "css/app.css".to_string())]);
    }

    #[test]
    fn wildcard_matches_the_exact_mount_point_with_an_empty_capture() {
        let mut root = RadixNode::new("");
        insert(&mut root, "/static/*path", Method::GET, terminal("/static/*path"));

        let m = root.lookup(&["static"], &Method::GET).unwrap();
        assert_eq!(m.params, vec![("path".to_string(), String::new())]);
    }

    #[test]
    fn constraint_rejection_falls_back_to_wildcard() {
        let mut root = RadixNode::new("");
        let mut numeric = terminal("/items/:id");
        let mut set = ConstraintSet::new();
        set.push(Constraint::numeric("id"));
        numeric.constraints = set;
        insert(&mut root, "/items/:id", Method::GET, numeric);
        insert(&mut root, "/items/*rest", Method::GET, terminal("/items/*rest"));

        let m = root.lookup(&["items", "abc"], &Method::GET).unwrap();
        assert_eq!(m.terminal.pattern, "/items/*rest");

        let m2 = root.lookup(&["items", "42"], &Method::GET).unwrap();
        assert_eq!(m2.terminal.pattern, "/items/:id");
    }

    #[test]
    fn no_match_returns_none_without_leaking_params() {
        let mut root = RadixNode::new("");
        insert(&mut root, "/users/:id", Method::GET, terminal("/users/:id"));
        assert!(root.lookup(&["orders", "1"], &Method::GET).is_none());
    }

    #[test]
    fn backtracks_past_static_mismatch_into_param_branch() {
        let mut root = RadixNode::new("");
        insert(
            &mut root,
            "/users/:id/profile",
            Method::GET,
            terminal("/users/:id/profile"),
        );
        insert(
            &mut root,
            "/users/settings/theme",
            Method::GET,
            terminal("/users/settings/theme"),
        );

        let m = root
            .lookup(&["users", "settings", "profile"], &Method::GET)
            .unwrap();
        assert_eq!(m.terminal.pattern, "/users/:id/profile");
        assert_eq!(m.params, vec![("id".to_string(), "settings".to_string())]);
    }
}

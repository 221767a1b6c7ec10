//! Parameter constraints attached via the fluent `Where` family.
//!
//! A constraint compiles a regex once at registration time and is checked
//! against a captured parameter value during radix traversal. A value is
//! accepted only if it fully matches (`^...$` semantics); rejection causes
//! the lookup to back-track to a less specific alternative.

use regex::Regex;
use std::fmt;

/// A single named parameter constraint, compiled once and reused across
/// every request.
#[derive(Clone)]
pub struct Constraint {
    name: String,
    pattern: String,
    regex: Regex,
}

impl Constraint {
    /// Compile `regex` anchored as a full match against `name`.
    ///
    /// Anchors are added automatically; callers pass the inner pattern only
    /// (e.g. `\d+`, not `^\d+$`).
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)?;
        Ok(Self {
            name: name.into(),
            pattern,
            regex,
        })
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, r"\d+").expect("built-in constraint pattern is always valid")
    }

    pub fn alpha(name: impl Into<String>) -> Self {
        Self::new(name, r"[A-Za-z]+").expect("built-in constraint pattern is always valid")
    }

    pub fn alphanumeric(name: impl Into<String>) -> Self {
        Self::new(name, r"[A-Za-z0-9]+").expect("built-in constraint pattern is always valid")
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(
            name,
            r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
        )
        .expect("built-in constraint pattern is always valid")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether `value` satisfies this constraint.
    pub fn admits(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish()
    }
}

/// An ordered set of constraints attached to a single terminal node, keyed
/// by parameter name. A node is accepted only if every constraint on every
/// captured parameter admits its value.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Check `captured` (name, value pairs) against every constraint whose
    /// name has a match among them. Parameters with no constraint pass
    /// freely.
    pub fn check(&self, captured: &[(&str, &str)]) -> bool {
        self.constraints.iter().all(|c| {
            captured
                .iter()
                .filter(|(name, _)| *name == c.name)
                .all(|(_, value)| c.admits(value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_constraint_accepts_digits_only() {
        let c = Constraint::numeric("id");
        assert!(c.admits("12345"));
        assert!(!c.admits("12a45"));
        assert!(!c.admits(""));
    }

    #[test]
    fn full_match_semantics_reject_partial_matches() {
        let c = Constraint::new("id", r"\d+").unwrap();
        assert!(!c.admits("12a"));
        assert!(!c.admits("a12"));
        assert!(c.admits("12"));
    }

    #[test]
    fn uuid_constraint_matches_canonical_form_only() {
        let c = Constraint::uuid("id");
        assert!(c.admits("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!c.admits("550E8400-E29B-41D4-A716-446655440000"));
        assert!(!c.admits("550e8400e29b41d4a716446655440000"));
    }

    #[test]
    fn constraint_set_requires_all_constraints_on_a_param() {
        let mut set = ConstraintSet::new();
        set.push(Constraint::numeric("id"));
        assert!(set.check(&[("id", "42")]));
        assert!(!set.check(&[("id", "abc")]));
        assert!(set.check(&[("other", "abc")]));
    }

    #[test]
    fn empty_constraint_set_admits_everything() {
        let set = ConstraintSet::new();
        assert!(set.is_empty());
        assert!(set.check(&[("id", "anything")]));
    }
}

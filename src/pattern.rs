//! Route pattern parsing.
//!
//! A pattern is an ordered sequence of [`Segment`]s tokenised from a route
//! string such as `/users/:id/posts/*rest`.

use crate::error::PatternSyntaxError;
use std::fmt;

/// A single segment of a parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal path segment, matched byte-for-byte. May be empty (e.g.
    /// the middle segment of `/a//b`, or the trailing segment of `/a/`).
    Static(String),
    /// A named parameter occupying exactly one path segment (`:id`).
    Param(String),
    /// A terminal catch-all capturing the remainder of the path, including
    /// any `/` characters (`*rest`).
    Wildcard(String),
}

/// Tie-break priority class used when multiple candidate terminals match at
/// the same depth: static beats parameter beats wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Wildcard = 0,
    Param = 1,
    Static = 2,
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a pattern string, tokenising it into `:param` captures, a
    /// trailing `*wildcard` catch-all, and literal static segments. Returns
    /// a `PatternSyntaxError` for a missing leading slash, an empty `:`
    /// name, or a wildcard that isn't the final segment.
    pub fn parse(pattern: &str) -> Result<Self, PatternSyntaxError> {
        if !pattern.starts_with('/') {
            return Err(PatternSyntaxError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }

        // `/` alone parses as a single empty static segment, matching the
        // trailing-slash rule: "a trailing `/` creates a final empty segment."
        let raw_segments: Vec<&str> = pattern[1..].split('/').collect();
        let mut segments = Vec::with_capacity(raw_segments.len());
        let mut wildcard_seen = false;

        for (i, raw) in raw_segments.iter().enumerate() {
            if wildcard_seen {
                return Err(PatternSyntaxError::WildcardNotTerminal {
                    pattern: pattern.to_string(),
                });
            }

            if let Some(name) = raw.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternSyntaxError::EmptyParamName {
                        pattern: pattern.to_string(),
                    });
                }
                segments.push(Segment::Param(name.to_string()));
            } else if let Some(name) = raw.strip_prefix('*') {
                // Bare trailing `*` (no name) captures under the
                // conventional name `"*"`.
                let name = if name.is_empty() { "*" } else { name };
                segments.push(Segment::Wildcard(name.to_string()));
                wildcard_seen = true;
                if i != raw_segments.len() - 1 {
                    return Err(PatternSyntaxError::WildcardNotTerminal {
                        pattern: pattern.to_string(),
                    });
                }
            } else {
                segments.push(Segment::Static(raw.to_string()));
            }
        }

        if segments.is_empty() {
            segments.push(Segment::Static(String::new()));
        }

        Ok(Pattern {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// A pattern with no parameter and no wildcard segment is *static*.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    /// Overall priority class of this pattern, used for tie-breaking among
    /// candidate terminals: fully-static > parameterised > wildcard.
    pub fn priority(&self) -> Priority {
        if self.segments.iter().any(|s| matches!(s, Segment::Wildcard(_))) {
            Priority::Wildcard
        } else if self.is_static() {
            Priority::Static
        } else {
            Priority::Param
        }
    }

    /// Parameter and wildcard names in declaration order.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(n) | Segment::Wildcard(n) => Some(n.as_str()),
            Segment::Static(_) => None,
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            f.write_str("/")?;
            match seg {
                Segment::Static(s) => f.write_str(s)?,
                Segment::Param(name) => write!(f, ":{name}")?,
                Segment::Wildcard(name) if name == "*" => f.write_str("*")?,
                Segment::Wildcard(name) => write!(f, "*{name}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_leading_slash() {
        assert!(matches!(
            Pattern::parse("users/:id"),
            Err(PatternSyntaxError::MissingLeadingSlash { .. })
        ));
    }

    #[test]
    fn rejects_empty_param_name() {
        assert!(matches!(
            Pattern::parse("/users/:"),
            Err(PatternSyntaxError::EmptyParamName { .. })
        ));
    }

    #[test]
    fn rejects_non_terminal_wildcard() {
        assert!(matches!(
            Pattern::parse("/files/*rest/edit"),
            Err(PatternSyntaxError::WildcardNotTerminal { .. })
        ));
    }

    #[test]
    fn double_slash_preserves_empty_segment() {
        let p = Pattern::parse("/a//b").unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment::Static("a".into()),
                Segment::Static("".into()),
                Segment::Static("b".into()),
            ]
        );
    }

    #[test]
    fn trailing_slash_creates_final_empty_segment() {
        let p = Pattern::parse("/users/").unwrap();
        assert_eq!(
            p.segments(),
            &[Segment::Static("users".into()), Segment::Static("".into())]
        );
    }

    #[test]
    fn classifies_static_vs_dynamic() {
        assert!(Pattern::parse("/a/b").unwrap().is_static());
        assert!(!Pattern::parse("/a/:id").unwrap().is_static());
        assert!(!Pattern::parse("/a/*rest").unwrap().is_static());
    }

    #[test]
    fn priority_ordering() {
        assert!(Pattern::parse("/a/b").unwrap().priority() > Pattern::parse("/a/:id").unwrap().priority());
        assert!(
            Pattern::parse("/a/:id").unwrap().priority() > Pattern::parse("/a/*rest").unwrap().priority()
        );
    }

    #[test]
    fn parse_then_display_then_parse_round_trips() {
        for raw in ["/", "/users", "/users/:id", "/users/:id/posts/*rest", "/a//b", "/a/"] {
            let parsed = Pattern::parse(raw).unwrap();
            let rendered = parsed.to_string();
            let reparsed = Pattern::parse(&rendered).unwrap();
            assert_eq!(parsed.segments(), reparsed.segments());
        }
    }

    #[test]
    fn capture_names_in_order() {
        let p = Pattern::parse("/users/:id/posts/:postId").unwrap();
        assert_eq!(p.capture_names().collect::<Vec<_>>(), vec!["id", "postId"]);
    }
}

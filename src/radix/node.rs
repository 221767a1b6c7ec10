//! Radix tree node.
//!
//! Matching operates at segment granularity, following the donor router's
//! `RadixNode` shape: each node owns a set of static children keyed by
//! literal segment, at most one parameter child, and at most one wildcard
//! child. A node may additionally carry one terminal record per HTTP
//! method.

use crate::constraint::ConstraintSet;
use crate::error::{ConflictReason, ConflictingRouteError};
use crate::pattern::Segment;
use std::collections::HashMap;
use std::sync::Arc;

/// What a matched terminal carries back to the dispatcher.
#[derive(Clone)]
pub struct Terminal {
    pub handlers: Arc<crate::handler::HandlerChain>,
    pub pattern: String,
    pub constraints: ConstraintSet,
    pub param_names: Vec<String>,
}

#[derive(Default, Clone)]
pub struct RadixNode {
    pub(crate) segment: String,
    pub(crate) children: Vec<RadixNode>,
    pub(crate) param_child: Option<Box<RadixNode>>,
    pub(crate) param_name: Option<String>,
    pub(crate) wildcard_child: Option<Box<RadixNode>>,
    pub(crate) wildcard_name: Option<String>,
    pub(crate) terminals: HashMap<http::Method, Terminal>,
}

impl RadixNode {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            ..Default::default()
        }
    }

    /// Insert `segments` (the remainder of a pattern still to be consumed)
    /// under this node for `method`, attaching `terminal` at the resulting
    /// leaf. Returns a conflict error if an incompatible registration
    /// already occupies the target position.
    pub fn insert(
        &mut self,
        segments: &[Segment],
        method: http::Method,
        terminal: Terminal,
    ) -> Result<(), ConflictingRouteError> {
        let Some(head) = segments.first() else {
            return self.set_terminal(method, terminal);
        };
        let rest = &segments[1..];

        match head {
            Segment::Static(literal) => {
                if let Some(child) = self.children.iter_mut().find(|c| &c.segment == literal) {
                    return child.insert(rest, method, terminal);
                }
                let mut child = RadixNode::new(literal.clone());
                child.insert(rest, method, terminal)?;
                self.children.push(child);
                Ok(())
            }
            Segment::Param(name) => {
                if let Some(existing_name) = &self.param_name {
                    if existing_name != name {
                        return Err(ConflictingRouteError {
                            method,
                            pattern: terminal.pattern,
                            reason: ConflictReason::ParamNameMismatch {
                                existing: existing_name.clone(),
                                incoming: name.clone(),
                            },
                        });
                    }
                    return self
                        .param_child
                        .as_mut()
                        .expect("param_name implies param_child")
                        .insert(rest, method, terminal);
                }
                let mut child = RadixNode::new("");
                child.insert(rest, method, terminal)?;
                self.param_name = Some(name.clone());
                self.param_child = Some(Box::new(child));
                Ok(())
            }
            Segment::Wildcard(name) => {
                if let Some(existing_name) = &self.wildcard_name {
                    if existing_name != name {
                        return Err(ConflictingRouteError {
                            method,
                            pattern: terminal.pattern,
                            reason: ConflictReason::ParamNameMismatch {
                                existing: existing_name.clone(),
                                incoming: name.clone(),
                            },
                        });
                    }
                    return self
                        .wildcard_child
                        .as_mut()
                        .expect("wildcard_name implies wildcard_child")
                        .set_terminal(method, terminal);
                }
                let mut child = RadixNode::new("");
                child.set_terminal(method, terminal)?;
                self.wildcard_name = Some(name.clone());
                self.wildcard_child = Some(Box::new(child));
                Ok(())
            }
        }
    }

    fn set_terminal(
        &mut self,
        method: http::Method,
        terminal: Terminal,
    ) -> Result<(), ConflictingRouteError> {
        if self.terminals.contains_key(&method) {
            return Err(ConflictingRouteError {
                method,
                pattern: terminal.pattern,
                reason: ConflictReason::DuplicateTerminal,
            });
        }
        self.terminals.insert(method, terminal);
        Ok(())
    }
}

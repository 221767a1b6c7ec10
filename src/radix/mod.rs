//! Radix tree: node structure, insertion, and constraint-gated lookup.

pub mod node;
pub mod tree;

pub use node::{RadixNode, Terminal};
pub use tree::Match;

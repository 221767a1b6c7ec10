//! Method-tree registry: copy-on-write publication of the per-method radix
//! forests.
//!
//! Readers dereference an `ArcSwap` load once and hold the resulting
//! snapshot for the duration of a single lookup — no lock is ever taken on
//! the read path. Writers prepare a modified copy of the map and retry the
//! swap under compare-and-swap semantics if a concurrent writer raced them.

use crate::radix::RadixNode;
use arc_swap::ArcSwap;
use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

type Forest = HashMap<Method, Arc<RadixNode>>;

/// A `method -> *RadixNode` map published by atomic pointer swap.
#[derive(Default)]
pub struct TreeRegistry {
    forest: ArcSwap<Forest>,
}

impl TreeRegistry {
    pub fn new() -> Self {
        Self {
            forest: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Take a snapshot for a single lookup. The returned `Arc` keeps the
    /// forest alive even if a writer swaps in a newer one concurrently.
    pub fn snapshot(&self) -> Arc<Forest> {
        self.forest.load_full()
    }

    /// Apply `mutate` to a cloned copy of the current forest and publish
    /// the result, retrying if a concurrent writer published first.
    ///
    /// `HashMap::clone` copies the outer map's entries (cheap `Arc` clones
    /// of each method's root), not the trees themselves — the common case
    /// of inserting under one method pays only for that method's rebuild.
    /// `ArcSwap::rcu` performs exactly this read-copy-update retry loop.
    pub fn update(&self, mut mutate: impl FnMut(&mut Forest)) {
        self.forest.rcu(|current| {
            let mut next: Forest = (**current).clone();
            mutate(&mut next);
            next
        });
    }
}

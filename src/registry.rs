// Copyright (c) 2026 Kukui Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Reclamation bookkeeping for interned paths.
//!
//! Every minted key leaves behind a [`PathRecord`]: the nodes it walked
//! and the edges it took, held strongly so a later cleanup never touches
//! freed memory. The record is registered in the [`PruneRegistry`] under
//! the key's identity and under the identity of every object on the path.
//! Whichever of those is reclaimed first fires the record exactly once;
//! firing cancels the remaining registrations.
//!
//! A registered record also pins the `Weak` handles of its targets, which
//! keeps their allocation addresses from being recycled while the
//! registration is outstanding. Identity collisions between a registered
//! target and a newly allocated key or object are therefore impossible.

use std::sync::{Arc, Weak};

use fnv::FnvHashMap;
use tracing::trace;

use crate::key::KeyCore;
use crate::node::TrieNode;
use crate::value::{ObjectCore, Primitive};

/// One edge taken while interning a sequence.
#[derive(Debug)]
pub(crate) enum PathStep {
    /// A value-compared edge.
    Strong(Primitive),
    /// An identity-compared edge.
    Weak {
        ident: usize,
        handle: Weak<ObjectCore>,
    },
}

/// The cleanup payload for one minted key.
///
/// `nodes` runs from the root to the terminal, so it is always one longer
/// than `steps`; `steps[i]` is the edge from `nodes[i]` to `nodes[i + 1]`.
#[derive(Debug)]
pub(crate) struct PathRecord {
    /// Identity of the key minted at the terminal.
    key_ident: usize,
    /// Handle of that key, for the guarded slot clear.
    key_handle: Weak<KeyCore>,
    nodes: Vec<Arc<TrieNode>>,
    steps: Vec<PathStep>,
}

impl PathRecord {
    pub(crate) fn new(
        key_ident: usize,
        key_handle: Weak<KeyCore>,
        nodes: Vec<Arc<TrieNode>>,
        steps: Vec<PathStep>,
    ) -> Self {
        debug_assert_eq!(nodes.len(), steps.len() + 1);
        Self {
            key_ident,
            key_handle,
            nodes,
            steps,
        }
    }

    /// Every identity whose reclamation should fire this record.
    fn targets(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.key_ident).chain(self.steps.iter().filter_map(|step| match step {
            PathStep::Weak { ident, .. } => Some(*ident),
            PathStep::Strong(_) => None,
        }))
    }

    /// Remove everything this path contributed that is no longer
    /// observable. Runs under the space lock.
    ///
    /// Three passes over the recorded path:
    /// 1. clear the terminal's key slot, unless the slot has since been
    ///    re-minted for a different key;
    /// 2. sweep weak edges whose object is gone from every node;
    /// 3. walk terminal to root, unlinking each node that ended up empty
    ///    from its parent, stopping at the first non-empty node. The root
    ///    is never unlinked. Edges already gone, or re-created toward a
    ///    replacement child, are left alone.
    pub(crate) fn cleanup(&self) -> usize {
        let Some(terminal) = self.nodes.last() else {
            return 0;
        };
        if terminal.clear_key_if(&self.key_handle) {
            trace!("cleared key slot for {:#x}", self.key_ident);
        }

        for node in &self.nodes {
            node.remove_reclaimed_edges();
        }

        let mut unlinked = 0;
        for index in (1..self.nodes.len()).rev() {
            let node = &self.nodes[index];
            if !node.is_empty() {
                break;
            }
            let parent = &self.nodes[index - 1];
            let removed = match &self.steps[index - 1] {
                PathStep::Strong(value) => parent.unlink_strong(value, node),
                PathStep::Weak { ident, handle } => {
                    if handle.strong_count() == 0 {
                        // Already swept along with the reclaimed object.
                        false
                    } else {
                        parent.unlink_weak(*ident, node)
                    }
                }
            };
            if removed {
                unlinked += 1;
            }
        }
        unlinked
    }
}

/// Registrations waiting for a key or object to be reclaimed.
///
/// Lives behind the space mutex, which serializes interning, firing, and
/// inspection of the trie.
#[derive(Debug, Default)]
pub(crate) struct PruneRegistry {
    registrations: FnvHashMap<usize, Vec<Arc<PathRecord>>>,
}

impl PruneRegistry {
    /// File a record under each of its targets.
    pub(crate) fn register(&mut self, record: &Arc<PathRecord>) {
        for target in record.targets() {
            let entries = self.registrations.entry(target).or_default();
            if !entries.iter().any(|entry| Arc::ptr_eq(entry, record)) {
                entries.push(record.clone());
            }
        }
    }

    /// Withdraw a record from all of its targets. Called when one target
    /// fires so the others cannot fire it again.
    pub(crate) fn cancel(&mut self, record: &Arc<PathRecord>) {
        for target in record.targets() {
            if let Some(entries) = self.registrations.get_mut(&target) {
                entries.retain(|entry| !Arc::ptr_eq(entry, record));
                if entries.is_empty() {
                    self.registrations.remove(&target);
                }
            }
        }
    }

    /// Remove and return everything registered under one identity.
    pub(crate) fn take(&mut self, target: usize) -> Vec<Arc<PathRecord>> {
        self.registrations.remove(&target).unwrap_or_default()
    }

    /// Number of identities with outstanding registrations.
    #[cfg(test)]
    pub(crate) fn target_count(&self) -> usize {
        self.registrations.len()
    }
}

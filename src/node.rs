// Copyright (c) 2026 Kukui Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Node implementation for the Kukui key trie.
//!
//! Each node is one position in the trie; the path from the root to a node
//! spells a sequence prefix. Primitive continuations live in a strong edge
//! map keyed by value. Object continuations live in a weak edge map keyed
//! by identity, holding the child strongly but the object itself only
//! weakly, so the trie never keeps an object alive. A dead weak edge reads
//! as absent everywhere.
//!
//! Mutations are serialized by the owning space; the per-node lock keeps
//! individual reads and writes consistent on their own.

use std::sync::{Arc, Weak};

use fnv::FnvHashMap;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::key::KeyCore;
use crate::value::{ObjectCore, ObjectRef, Primitive};

/// A weak edge: the continuation for one object identity.
///
/// The child node is held strongly; `handle` only reports whether the
/// object is still alive.
#[derive(Debug)]
pub(crate) struct WeakEdge {
    handle: Weak<ObjectCore>,
    child: Arc<TrieNode>,
}

/// Mutable state of a node.
///
/// Edge maps are allocated on first use and dropped again when their last
/// edge is removed, so an empty node is recognizable without scanning.
#[derive(Debug, Default)]
struct NodeState {
    /// Weak slot for the key minted at this position, if any.
    key: Option<Weak<KeyCore>>,
    /// Value-compared continuations.
    strong_edges: Option<HashMap<Primitive, Arc<TrieNode>>>,
    /// Identity-compared continuations.
    weak_edges: Option<FnvHashMap<usize, WeakEdge>>,
}

impl NodeState {
    /// A node is empty when its key slot is absent or dead and it has no
    /// edge maps. Empty nodes are candidates for unlinking; the root is
    /// exempt.
    fn is_empty(&self) -> bool {
        self.key_is_dead() && self.strong_edges.is_none() && self.weak_edges.is_none()
    }

    fn key_is_dead(&self) -> bool {
        match &self.key {
            Some(slot) => slot.strong_count() == 0,
            None => true,
        }
    }
}

/// Traversal snapshot of one node, taken under its lock.
#[derive(Debug)]
pub(crate) struct NodeSummary {
    /// Whether the key slot holds a live key.
    pub(crate) live_key: bool,
    /// Whether the key slot holds a dead key that was never cleared.
    pub(crate) stale_key: bool,
    /// Children reachable from this node, through live and stale edges.
    pub(crate) children: Vec<Arc<TrieNode>>,
    /// Number of weak edges whose object has been reclaimed.
    pub(crate) stale_weak_edges: usize,
    /// Whether the node is empty as defined for pruning.
    pub(crate) is_empty: bool,
}

/// One position in the key trie.
#[derive(Debug)]
pub(crate) struct TrieNode {
    state: RwLock<NodeState>,
}

impl TrieNode {
    /// Creates a new node with no key and no edges.
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(NodeState::default()),
        }
    }

    /// The existing continuation for a primitive, if any.
    pub(crate) fn strong_child(&self, value: &Primitive) -> Option<Arc<TrieNode>> {
        let state = self.state.read();
        state.strong_edges.as_ref()?.get(value).cloned()
    }

    /// The continuation for a primitive, created and linked if absent.
    pub(crate) fn ensure_strong_child(&self, value: &Primitive, capacity: usize) -> Arc<TrieNode> {
        let mut state = self.state.write();
        let edges = state
            .strong_edges
            .get_or_insert_with(|| HashMap::with_capacity(capacity));
        edges
            .entry(value.clone())
            .or_insert_with(|| Arc::new(TrieNode::new()))
            .clone()
    }

    /// The existing continuation for a live object, if any. A dead edge
    /// reads as absent.
    pub(crate) fn weak_child(&self, ident: usize) -> Option<Arc<TrieNode>> {
        let state = self.state.read();
        let edge = state.weak_edges.as_ref()?.get(&ident)?;
        if edge.handle.strong_count() > 0 {
            Some(edge.child.clone())
        } else {
            None
        }
    }

    /// The continuation for an object, created and linked if absent. A
    /// dead edge at the same identity is replaced outright.
    pub(crate) fn ensure_weak_child(&self, object: &ObjectRef, capacity: usize) -> Arc<TrieNode> {
        let mut state = self.state.write();
        let edges = state
            .weak_edges
            .get_or_insert_with(|| FnvHashMap::with_capacity_and_hasher(capacity, Default::default()));
        let edge = edges.entry(object.ident()).or_insert_with(|| WeakEdge {
            handle: object.downgrade(),
            child: Arc::new(TrieNode::new()),
        });
        if edge.handle.strong_count() == 0 {
            *edge = WeakEdge {
                handle: object.downgrade(),
                child: Arc::new(TrieNode::new()),
            };
        }
        edge.child.clone()
    }

    /// Upgrade the key slot. The returned strong reference must be handed
    /// out of the space lock, never dropped under it.
    pub(crate) fn live_key(&self) -> Option<Arc<KeyCore>> {
        let state = self.state.read();
        state.key.as_ref()?.upgrade()
    }

    pub(crate) fn has_live_key(&self) -> bool {
        !self.state.read().key_is_dead()
    }

    /// Install a freshly minted key in the slot.
    pub(crate) fn set_key(&self, key: Weak<KeyCore>) {
        self.state.write().key = Some(key);
    }

    /// Clear the key slot if it is dead or holds the expected key. A slot
    /// re-minted for a different key is left alone, so a stale cleanup
    /// cannot clobber its successor. Returns whether the slot was
    /// cleared.
    pub(crate) fn clear_key_if(&self, expected: &Weak<KeyCore>) -> bool {
        let mut state = self.state.write();
        match &state.key {
            Some(slot) if slot.strong_count() == 0 || Weak::ptr_eq(slot, expected) => {
                state.key = None;
                true
            }
            _ => false,
        }
    }

    /// Drop weak edges whose object has been reclaimed. The map itself is
    /// dropped when this empties it.
    pub(crate) fn remove_reclaimed_edges(&self) {
        let mut state = self.state.write();
        if let Some(edges) = &mut state.weak_edges {
            edges.retain(|_, edge| edge.handle.strong_count() > 0);
            if edges.is_empty() {
                state.weak_edges = None;
            }
        }
    }

    /// Remove the strong edge for a primitive, but only while it still
    /// points at `child`. A missing edge, or one re-created toward a new
    /// child, is a silent no-op. Returns whether an edge was removed.
    pub(crate) fn unlink_strong(&self, value: &Primitive, child: &Arc<TrieNode>) -> bool {
        let mut state = self.state.write();
        let Some(edges) = &mut state.strong_edges else {
            return false;
        };
        match edges.get(value) {
            Some(current) if Arc::ptr_eq(current, child) => {
                edges.remove(value);
            }
            _ => return false,
        }
        if edges.is_empty() {
            state.strong_edges = None;
        }
        true
    }

    /// Remove the weak edge for an object identity, but only while it
    /// still points at `child`. A missing edge, or one re-created toward
    /// a new child, is a silent no-op. Returns whether an edge was
    /// removed.
    pub(crate) fn unlink_weak(&self, ident: usize, child: &Arc<TrieNode>) -> bool {
        let mut state = self.state.write();
        let Some(edges) = &mut state.weak_edges else {
            return false;
        };
        match edges.get(&ident) {
            Some(edge) if Arc::ptr_eq(&edge.child, child) => {
                edges.remove(&ident);
            }
            _ => return false,
        }
        if edges.is_empty() {
            state.weak_edges = None;
        }
        true
    }

    /// Whether the node is empty as defined for pruning.
    pub(crate) fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Snapshot the node for traversal.
    pub(crate) fn summarize(&self) -> NodeSummary {
        let state = self.state.read();
        let mut children = Vec::new();
        let mut stale_weak_edges = 0;
        if let Some(edges) = &state.strong_edges {
            children.extend(edges.values().cloned());
        }
        if let Some(edges) = &state.weak_edges {
            for edge in edges.values() {
                if edge.handle.strong_count() == 0 {
                    stale_weak_edges += 1;
                }
                children.push(edge.child.clone());
            }
        }
        NodeSummary {
            live_key: !state.key_is_dead(),
            stale_key: state.key.is_some() && state.key_is_dead(),
            children,
            stale_weak_edges,
            is_empty: state.is_empty(),
        }
    }

    /// Detach and hand over every child, clearing this node. Used for
    /// iterative teardown so deep tries never unwind recursively.
    pub(crate) fn take_children_into(&self, out: &mut Vec<Arc<TrieNode>>) {
        let mut state = self.state.write();
        state.key = None;
        if let Some(edges) = state.strong_edges.take() {
            out.extend(edges.into_values());
        }
        if let Some(edges) = state.weak_edges.take() {
            out.extend(edges.into_values().map(|edge| edge.child));
        }
    }
}

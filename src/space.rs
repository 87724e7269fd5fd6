// Copyright (c) 2026 Kukui Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Key spaces: the interning surface of the crate.
//!
//! A [`KeySpace`] owns a trie of sequence prefixes and a registry of
//! reclamation records. Interning walks the trie under the space mutex,
//! extends it where needed, and either reuses the live key at the terminal
//! node or mints a fresh one. Reclamation notifications from dropped keys
//! and objects run under the same mutex, so trie mutation always has a
//! single logical owner.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::KeySpaceConfig;
use crate::error::{KukuiError, KukuiResult};
use crate::key::SeqKey;
use crate::node::TrieNode;
use crate::registry::{PathRecord, PathStep, PruneRegistry};
use crate::value::Value;

/// State shared by every handle to one key space.
pub(crate) struct SpaceShared {
    /// Root of the trie. Spells the empty sequence; never unlinked.
    root: Arc<TrieNode>,
    /// Reclamation registrations, and the serialization point for every
    /// operation that touches the trie.
    registry: Mutex<PruneRegistry>,
    config: KeySpaceConfig,
}

impl SpaceShared {
    fn new(config: KeySpaceConfig) -> Arc<Self> {
        Arc::new(Self {
            root: Arc::new(TrieNode::new()),
            registry: Mutex::new(PruneRegistry::default()),
            config,
        })
    }

    /// A key or object with the given identity has been reclaimed. Fires
    /// every record registered under it.
    ///
    /// Runs on whichever thread dropped the last strong reference. The
    /// trie holds keys and objects only weakly, so that thread never
    /// already holds the space mutex here.
    pub(crate) fn notify_reclaimed(&self, ident: usize) {
        let mut registry = self.registry.lock();
        let records = registry.take(ident);
        if records.is_empty() {
            trace!("reclamation of {:#x}: nothing registered", ident);
            return;
        }
        debug!(
            "reclamation of {:#x} fires {} record(s)",
            ident,
            records.len()
        );
        for record in records {
            registry.cancel(&record);
            let unlinked = record.cleanup();
            if unlinked > 0 {
                trace!("pruned {} node(s)", unlinked);
            }
        }
    }

    fn try_intern(self: &Arc<Self>, values: Vec<Value>) -> KukuiResult<SeqKey> {
        if let Some(max_depth) = self.config.max_depth() {
            if values.len() > max_depth {
                return Err(KukuiError::DepthExceeded {
                    depth: values.len(),
                    max_depth,
                });
            }
        }

        let capacity = self.config.edge_capacity();
        let handle = Arc::downgrade(self);
        let mut registry = self.registry.lock();

        let mut nodes = Vec::with_capacity(values.len() + 1);
        let mut steps = Vec::with_capacity(values.len());
        nodes.push(self.root.clone());
        for value in &values {
            let current = nodes[nodes.len() - 1].clone();
            let next = match value {
                Value::Primitive(p) => {
                    steps.push(PathStep::Strong(p.clone()));
                    current.ensure_strong_child(p, capacity)
                }
                Value::Object(o) => {
                    steps.push(PathStep::Weak {
                        ident: o.ident(),
                        handle: o.downgrade(),
                    });
                    current.ensure_weak_child(o, capacity)
                }
            };
            nodes.push(next);
        }

        let terminal = &nodes[nodes.len() - 1];
        if let Some(existing) = terminal.live_key() {
            // The strong reference escapes the lock with the caller.
            trace!("reusing key at depth {}", values.len());
            return Ok(SeqKey::from_core(existing));
        }

        let key = SeqKey::mint(handle.clone());
        terminal.set_key(key.downgrade());
        let record = Arc::new(PathRecord::new(
            key.ident(),
            key.downgrade(),
            nodes,
            steps,
        ));
        registry.register(&record);
        let mut object_count = 0;
        for value in &values {
            if let Value::Object(o) = value {
                o.attach_watcher(&handle);
                object_count += 1;
            }
        }
        debug!(
            "minted key {:#x} at depth {} ({} object(s))",
            key.ident(),
            values.len(),
            object_count
        );
        Ok(key)
    }

    /// Traverse the whole trie under the space mutex. The trie is a tree,
    /// so no visited set is needed.
    fn traverse(&self) -> TrieAudit {
        let _registry = self.registry.lock();
        let mut audit = TrieAudit::default();
        let mut worklist = vec![self.root.clone()];
        let mut first = true;
        while let Some(node) = worklist.pop() {
            let summary = node.summarize();
            audit.node_count += 1;
            if summary.live_key {
                audit.live_keys += 1;
            }
            if summary.stale_key {
                audit.stale_key_slots += 1;
            }
            if summary.is_empty && !first {
                audit.empty_nonroot_nodes += 1;
            }
            audit.stale_weak_edges += summary.stale_weak_edges;
            worklist.extend(summary.children);
            first = false;
        }
        audit
    }
}

impl Drop for SpaceShared {
    fn drop(&mut self) {
        // Detach children before their parents drop so a deep trie is
        // reclaimed iteratively instead of by recursive unwinding.
        let mut worklist = vec![self.root.clone()];
        while let Some(node) = worklist.pop() {
            node.take_children_into(&mut worklist);
        }
    }
}

/// Diagnostic snapshot of a key space's trie.
///
/// Produced by [`KeySpace::audit`]. In a settled space every weak edge
/// points at a live object, every key slot at a live key, and no empty
/// node other than the root is reachable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrieAudit {
    /// Keys that are still externally held.
    pub live_keys: usize,
    /// Nodes reachable from the root, the root included.
    pub node_count: usize,
    /// Reachable non-root nodes that are empty and so awaiting pruning.
    pub empty_nonroot_nodes: usize,
    /// Weak edges whose object has been reclaimed but not yet swept.
    pub stale_weak_edges: usize,
    /// Key slots holding a dead key that has not yet been cleared.
    pub stale_key_slots: usize,
}

impl TrieAudit {
    /// Whether all reclamation side effects have been applied.
    pub fn is_settled(&self) -> bool {
        self.empty_nonroot_nodes == 0 && self.stale_weak_edges == 0 && self.stale_key_slots == 0
    }
}

/// An interning space for sequence keys.
///
/// Element-wise equal sequences interned in the same space yield the
/// identical [`SeqKey`]; distinct sequences yield distinct keys. The space
/// holds keys and object elements weakly. Once every clone of a key is
/// dropped, or any object in its sequence is reclaimed, the structure
/// backing that sequence is pruned automatically.
///
/// Cloning a `KeySpace` yields another handle to the same space. Spaces
/// are independent: the same sequence interned in two spaces yields two
/// unrelated keys.
///
/// # Examples
///
/// ```
/// use kukui_lib::KeySpace;
///
/// let space = KeySpace::new();
/// let a = space.intern([1i64, 2, 3]);
/// let b = space.intern([1i64, 2, 3]);
/// assert_eq!(a, b);
/// assert_ne!(a, space.intern([1i64, 2]));
/// ```
#[derive(Clone)]
pub struct KeySpace {
    shared: Arc<SpaceShared>,
}

static GLOBAL_SPACE: Lazy<KeySpace> = Lazy::new(KeySpace::new);

impl KeySpace {
    /// Create an empty space with the default configuration.
    pub fn new() -> Self {
        Self::with_config(KeySpaceConfig::default())
    }

    /// Create an empty space with the given configuration.
    pub fn with_config(config: KeySpaceConfig) -> Self {
        Self {
            shared: SpaceShared::new(config),
        }
    }

    /// The process-wide default space used by [`crate::intern`].
    pub fn global() -> &'static KeySpace {
        &GLOBAL_SPACE
    }

    /// Intern a sequence, returning its canonical key.
    ///
    /// Fails with [`KukuiError::DepthExceeded`] if the space was
    /// configured with a maximum depth and the sequence is longer.
    pub fn try_intern<I>(&self, values: I) -> KukuiResult<SeqKey>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.shared.try_intern(values)
    }

    /// Intern a sequence, returning its canonical key.
    ///
    /// # Panics
    ///
    /// Panics if the sequence exceeds the configured maximum depth. Use
    /// [`try_intern`](KeySpace::try_intern) on depth-limited spaces.
    pub fn intern<I>(&self, values: I) -> SeqKey
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        match self.try_intern(values) {
            Ok(key) => key,
            Err(err) => panic!("intern failed: {}", err),
        }
    }

    /// Number of live keys in the space.
    pub fn len(&self) -> usize {
        self.shared.traverse().live_keys
    }

    /// Whether the space holds no live keys and no structure beyond the
    /// root.
    pub fn is_empty(&self) -> bool {
        let audit = self.shared.traverse();
        audit.live_keys == 0 && audit.node_count == 1
    }

    /// Number of trie nodes currently reachable, the root included.
    pub fn node_count(&self) -> usize {
        self.shared.traverse().node_count
    }

    /// Take a diagnostic snapshot of the trie.
    pub fn audit(&self) -> TrieAudit {
        self.shared.traverse()
    }

    /// The configuration this space was created with.
    pub fn config(&self) -> &KeySpaceConfig {
        &self.shared.config
    }

    /// Whether two handles refer to the same space.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> std::sync::Weak<SpaceShared> {
        Arc::downgrade(&self.shared)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeySpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let audit = self.shared.traverse();
        f.debug_struct("KeySpace")
            .field("live_keys", &audit.live_keys)
            .field("nodes", &audit.node_count)
            .finish()
    }
}

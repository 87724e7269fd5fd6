// Copyright (c) 2026 Kukui Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Configuration for Kukui key spaces.

/// Configuration for a [`KeySpace`](crate::KeySpace).
///
/// This struct provides configuration options for tuning a key space,
/// including an optional depth limit and the initial capacity of the
/// per-node edge maps.
#[derive(Debug, Clone)]
pub struct KeySpaceConfig {
    /// Optional maximum sequence length accepted by the space.
    /// If None, sequences of any length are accepted.
    max_depth: Option<usize>,

    /// Initial capacity of a node's edge maps when the first edge is added.
    /// Zero defers sizing entirely to the map implementation.
    edge_capacity: usize,
}

impl KeySpaceConfig {
    /// Create a new default configuration.
    ///
    /// Default values:
    /// - max_depth: None (unbounded)
    /// - edge_capacity: 0 (allocate on first insert)
    pub fn new() -> Self {
        Self {
            max_depth: None,
            edge_capacity: 0,
        }
    }

    /// Set the maximum sequence length the space will intern.
    ///
    /// Sequences longer than this make `try_intern` fail with
    /// [`KukuiError::DepthExceeded`](crate::KukuiError::DepthExceeded).
    /// A limit of 0 admits only the empty sequence.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Set the initial capacity of newly allocated edge maps.
    ///
    /// Sequences with many distinct continuations at the same prefix can
    /// set this to reduce rehashing while the trie grows.
    pub fn with_edge_capacity(mut self, edge_capacity: usize) -> Self {
        self.edge_capacity = edge_capacity;
        self
    }

    /// Get the configured maximum depth, if any.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Get the initial edge map capacity.
    pub fn edge_capacity(&self) -> usize {
        self.edge_capacity
    }
}

impl Default for KeySpaceConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Test modules for the Kukui key trie.
//!
//! This module contains the crate-internal test suites:
//! - Interning semantics (determinism, injectivity, depth limits)
//! - Pruning behavior for dropped keys, dropped objects, and teardown
//! - Property-based tests using proptest
//! - Shared fixtures and value strategies
//!
//! Every pruning assertion here is deterministic: reclamation runs
//! synchronously when the last clone of a key or object is dropped, so
//! the suites assert effects immediately after `drop`.

pub mod property_tests;

// Re-export commonly used testing tools to simplify imports in test modules
pub use test_utils::{materialize, sequence_strategy, ElementSpec, ObjectPool};

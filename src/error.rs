//! Error types for the Kukui key trie.
//!
//! This module defines the error types that can occur during key space
//! operations.

/// Errors that can occur in Kukui key space operations.
#[derive(Debug, thiserror::Error)]
pub enum KukuiError {
    /// Error when a sequence is longer than the configured depth limit.
    #[error("Sequence of length {depth} exceeds maximum key depth of {max_depth}")]
    DepthExceeded {
        /// The length of the offending sequence.
        depth: usize,
        /// The configured maximum depth.
        max_depth: usize,
    },
}

/// Result type for Kukui key space operations.
pub type KukuiResult<T> = Result<T, KukuiError>;

// Display implementation is automatically provided by thiserror

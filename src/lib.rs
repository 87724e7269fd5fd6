//! Kukui Key Trie
//!
//! This library assigns a canonical, identity-compared key to any finite
//! sequence of values. Interning element-wise equal sequences yields the
//! identical [`SeqKey`]; differing sequences yield distinct keys. Keys
//! carry no data beyond their identity, which makes them cheap composite
//! map keys for caches, memoization tables, and deduplication.
//!
//! Sequences may mix [`Primitive`] values (compared by value) and
//! [`ObjectRef`] handles (compared by identity). The backing trie holds
//! objects and keys weakly: dropping the last clone of a key, or any
//! object a sequence contains, synchronously prunes the structure that
//! existed only for it. A long-lived space therefore does not grow into
//! a leak.
//!
//! # Architecture
//!
//! The crate is built around a few principles:
//! - One logical owner for all trie mutation: interning, reclamation,
//!   and inspection serialize on a per-space mutex
//! - Reclamation is deterministic: pruning effects are visible as soon
//!   as the relevant `drop` returns
//! - The trie never extends the lifetime of a key or an object
//! - No `unsafe` code
//!
//! # Examples
//!
//! ```
//! use kukui_lib::{KeySpace, ObjectRef};
//!
//! let space = KeySpace::new();
//!
//! // Equal sequences intern to the identical key.
//! let a = space.intern([1i64, 2, 3]);
//! let b = space.intern([1i64, 2, 3]);
//! assert_eq!(a, b);
//!
//! // Objects participate by identity, not by content.
//! let user = ObjectRef::new(String::from("user-7"));
//! let with_user = space.intern(kukui_lib::seq![1i64, user.clone()]);
//! assert_ne!(with_user, a);
//!
//! // Dropping every clone of a key releases its structure.
//! drop((a, b, with_user, user));
//! assert!(space.is_empty());
//! ```

// Re-export public modules
pub mod config;
pub mod error;
pub mod key;
pub mod space;
pub mod value;

// Internal modules that are not part of the public API
mod node;
mod registry;

#[cfg(test)]
pub(crate) mod tests;

// Feature-gated modules
#[cfg(feature = "benchmarking")]
pub mod bench;

pub use config::KeySpaceConfig;
pub use error::{KukuiError, KukuiResult};
pub use key::SeqKey;
pub use space::{KeySpace, TrieAudit};
pub use value::{FloatBits, ObjectRef, Primitive, Value};

/// Version information for the Kukui library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Intern a sequence in the process-wide default space.
///
/// Equivalent to `KeySpace::global().intern(values)`. Use a dedicated
/// [`KeySpace`] when key lifetimes should be scoped to a component or a
/// test.
///
/// ```
/// let a = kukui_lib::intern([1i64, 2]);
/// let b = kukui_lib::intern([1i64, 2]);
/// assert_eq!(a, b);
/// ```
pub fn intern<I>(values: I) -> SeqKey
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    KeySpace::global().intern(values)
}

/// Build a `Vec<Value>` from a mixed list of elements.
///
/// Every element must convert into a [`Value`]. Primitives are compared
/// by value, objects by identity.
///
/// ```
/// use kukui_lib::{seq, ObjectRef, Value};
///
/// let obj = ObjectRef::new(42u32);
/// let values = seq![1i64, "a", obj.clone()];
/// assert_eq!(values.len(), 3);
/// assert_eq!(values[2], Value::Object(obj));
/// ```
#[macro_export]
macro_rules! seq {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($element:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($element)),+]
    };
}

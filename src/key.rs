//! Opaque sequence keys.
//!
//! A [`SeqKey`] is the canonical identity of one interned sequence. It has
//! no observable attributes: all a caller can do is clone it, compare it,
//! and hash it. The trie keeps only a weak reference to the key, so once
//! every externally held clone is dropped the key's path becomes eligible
//! for pruning.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use crate::space::SpaceShared;

/// Shared state behind every clone of a [`SeqKey`].
///
/// The allocation address is the key's identity. Dropping the last clone
/// notifies the home space so the terminal slot and any nodes that exist
/// only for this key can be removed.
pub(crate) struct KeyCore {
    /// Home space. A dead reference makes the drop notification a no-op.
    shared: Weak<SpaceShared>,
}

impl Drop for KeyCore {
    fn drop(&mut self) {
        let ident = self as *const KeyCore as usize;
        if let Some(shared) = self.shared.upgrade() {
            shared.notify_reclaimed(ident);
        }
    }
}

/// The canonical key for an interned sequence.
///
/// Interning element-wise equal sequences in the same
/// [`KeySpace`](crate::KeySpace) yields equal keys for as long as at least
/// one clone of the key is held; differing sequences always yield unequal
/// keys. Keys are opaque and immutable. They are not serializable: a key's
/// meaning is its identity within the process.
#[derive(Clone)]
pub struct SeqKey(Arc<KeyCore>);

impl SeqKey {
    /// Mint a fresh key owned by `shared`.
    pub(crate) fn mint(shared: Weak<SpaceShared>) -> Self {
        Self(Arc::new(KeyCore { shared }))
    }

    /// Rewrap a core recovered from a terminal node's weak slot.
    pub(crate) fn from_core(core: Arc<KeyCore>) -> Self {
        Self(core)
    }

    /// The weak handle stored in the terminal node.
    pub(crate) fn downgrade(&self) -> Weak<KeyCore> {
        Arc::downgrade(&self.0)
    }

    /// The identity this key is registered under for pruning.
    pub(crate) fn ident(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for SeqKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SeqKey {}

impl Hash for SeqKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ident().hash(state);
    }
}

impl fmt::Debug for SeqKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqKey({:#x})", self.ident())
    }
}

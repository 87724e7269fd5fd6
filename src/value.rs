// Copyright (c) 2026 Kukui Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Value model for interned sequences.
//!
//! Sequences are made of two kinds of elements. [`Primitive`] values are
//! compared by value and are held strongly by the trie as edge map keys.
//! [`ObjectRef`] values are opaque heap allocations compared by identity;
//! the trie only ever holds weak references to them, so interning a
//! sequence never extends an object's lifetime.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::space::SpaceShared;

/// Canonical bit pattern used for every NaN.
const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// An `f64` canonicalized for use as a hash map key.
///
/// Equality follows SameValueZero semantics: every NaN compares equal to
/// every other NaN, and `-0.0` compares equal to `+0.0`. This matches how
/// the rest of the crate treats primitive equality and keeps `Float`
/// usable as an edge key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FloatBits(u64);

impl FloatBits {
    /// Canonicalize a float. NaNs collapse to a single bit pattern and
    /// negative zero collapses to positive zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(CANONICAL_NAN_BITS)
        } else if value == 0.0 {
            Self(0)
        } else {
            Self(value.to_bits())
        }
    }

    /// The canonicalized float value.
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl fmt::Debug for FloatBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value(), f)
    }
}

impl From<f64> for FloatBits {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// A value-compared sequence element.
///
/// Primitives are owned by the trie while an edge for them exists. Two
/// primitives are interchangeable as sequence elements exactly when they
/// compare equal here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// The absent value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A single character.
    Char(char),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A float with SameValueZero equality.
    Float(FloatBits),
    /// An immutable string.
    Str(Arc<str>),
    /// An immutable byte string.
    Bytes(Arc<[u8]>),
}

/// Shared state behind every clone of an [`ObjectRef`].
///
/// The allocation address of this struct is the object's identity. When
/// the last strong handle drops, every key space the object was interned
/// into is notified so the paths through it can be pruned.
pub(crate) struct ObjectCore {
    /// The caller's payload, type-erased.
    payload: Box<dyn Any + Send + Sync>,
    /// Payload type name, kept for diagnostics.
    type_name: &'static str,
    /// Key spaces to notify when the object is reclaimed.
    watchers: Mutex<Vec<Weak<SpaceShared>>>,
}

impl ObjectCore {
    /// Record a space to be notified on reclamation. Duplicate
    /// registrations and dead entries are swept here so the list stays
    /// proportional to the number of live interested spaces.
    pub(crate) fn attach_watcher(&self, space: &Weak<SpaceShared>) {
        let mut watchers = self.watchers.lock();
        watchers.retain(|w| w.strong_count() > 0);
        if !watchers.iter().any(|w| Weak::ptr_eq(w, space)) {
            watchers.push(space.clone());
        }
    }
}

impl Drop for ObjectCore {
    fn drop(&mut self) {
        let ident = self as *const ObjectCore as usize;
        // Exclusive access: no strong handle remains, so nobody can be
        // attaching a watcher concurrently.
        let watchers = std::mem::take(self.watchers.get_mut());
        for watcher in watchers {
            if let Some(shared) = watcher.upgrade() {
                shared.notify_reclaimed(ident);
            }
        }
    }
}

/// An identity-compared heap value.
///
/// `ObjectRef` wraps an arbitrary `Send + Sync` payload. Clones share the
/// same identity; two independently constructed objects are never equal,
/// even for equal payloads. The payload can be recovered with
/// [`downcast_ref`](ObjectRef::downcast_ref).
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCore>);

impl ObjectRef {
    /// Allocate a new object with a fresh identity.
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self(Arc::new(ObjectCore {
            payload: Box::new(payload),
            type_name: std::any::type_name::<T>(),
            watchers: Mutex::new(Vec::new()),
        }))
    }

    /// Borrow the payload if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.payload.downcast_ref::<T>()
    }

    /// Whether two handles designate the same object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The identity this object is keyed under in weak edge maps.
    pub(crate) fn ident(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// A liveness handle for weak edges and path records.
    pub(crate) fn downgrade(&self) -> Weak<ObjectCore> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn attach_watcher(&self, space: &Weak<SpaceShared>) {
        self.0.attach_watcher(space);
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ident().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type", &self.0.type_name)
            .field("ident", &format_args!("{:#x}", self.ident()))
            .finish()
    }
}

/// One element of an internable sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A value-compared element, held strongly by the trie.
    Primitive(Primitive),
    /// An identity-compared element, held weakly by the trie.
    Object(ObjectRef),
}

impl Value {
    /// Allocate a fresh object and wrap it as a sequence element.
    pub fn object<T: Any + Send + Sync>(payload: T) -> Self {
        Value::Object(ObjectRef::new(payload))
    }
}

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Value::Primitive(p)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

macro_rules! primitive_from {
    ($($ty:ty => $variant:ident($conv:expr)),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(v: $ty) -> Self {
                    Primitive::$variant($conv(v))
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Primitive(Primitive::from(v))
                }
            }
        )*
    };
}

primitive_from! {
    bool => Bool(std::convert::identity),
    char => Char(std::convert::identity),
    i8 => Int(i64::from),
    i16 => Int(i64::from),
    i32 => Int(i64::from),
    i64 => Int(std::convert::identity),
    u8 => Uint(u64::from),
    u16 => Uint(u64::from),
    u32 => Uint(u64::from),
    u64 => Uint(std::convert::identity),
    f32 => Float(|v: f32| FloatBits::new(f64::from(v))),
    f64 => Float(FloatBits::new),
    &str => Str(Arc::from),
    String => Str(Arc::from),
    Arc<str> => Str(std::convert::identity),
    &[u8] => Bytes(Arc::from),
    Vec<u8> => Bytes(Arc::from),
    Arc<[u8]> => Bytes(std::convert::identity),
}

impl From<()> for Primitive {
    fn from(_: ()) -> Self {
        Primitive::Null
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Primitive(Primitive::Null)
    }
}

//! Workload builders for the Kukui benchmarks.
//!
//! Compiled only with the `benchmarking` feature. The `kukui_benchmarks`
//! bench target uses these to build representative sequences without
//! timing the construction itself.

use crate::value::{ObjectRef, Value};

/// A primitive-only sequence of the given length.
pub fn primitive_sequence(len: usize) -> Vec<Value> {
    (0..len).map(|i| Value::from(i as i64)).collect()
}

/// A sequence alternating primitives and fresh objects.
///
/// The objects are returned alongside the sequence so the caller decides
/// how long they live.
pub fn mixed_sequence(len: usize) -> (Vec<Value>, Vec<ObjectRef>) {
    let mut values = Vec::with_capacity(len);
    let mut objects = Vec::new();
    for i in 0..len {
        if i % 2 == 0 {
            values.push(Value::from(i as i64));
        } else {
            let object = ObjectRef::new(i);
            objects.push(object.clone());
            values.push(Value::Object(object));
        }
    }
    (values, objects)
}

/// `count` distinct sequences of length `prefix_len + 1` sharing a common
/// primitive prefix, exercising the shared-prefix paths of the trie.
pub fn prefixed_sequences(count: usize, prefix_len: usize) -> Vec<Vec<Value>> {
    let prefix = primitive_sequence(prefix_len);
    (0..count)
        .map(|i| {
            let mut sequence = prefix.clone();
            sequence.push(Value::from(format!("leaf-{}", i)));
            sequence
        })
        .collect()
}

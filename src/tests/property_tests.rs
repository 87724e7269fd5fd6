//! Property-based tests for interning and pruning.
//!
//! Generated sequences mix every primitive kind with pooled identity
//! objects. Structural equality of the generated descriptions must match
//! key equality exactly, and arbitrary drop patterns must leave the trie
//! settled with precisely the surviving keys.

use std::collections::HashSet;

use proptest::prelude::*;

use super::{materialize, sequence_strategy, ElementSpec, ObjectPool};
use crate::{KeySpace, SeqKey};

const POOL_SIZE: usize = 4;

/// Rewrite object indices to their pool slots so structural equality of
/// specs coincides with element-wise equality of materialized sequences.
fn canonicalize(spec: &[ElementSpec], pool: &ObjectPool) -> Vec<ElementSpec> {
    spec.iter()
        .map(|element| match element {
            ElementSpec::Object(index) => ElementSpec::Object(pool.slot_of(*index)),
            other => other.clone(),
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Interning the same sequence twice yields the identical key.
    #[test]
    fn proptest_interning_is_deterministic(spec in sequence_strategy(8, POOL_SIZE)) {
        let pool = ObjectPool::new(POOL_SIZE);
        let space = KeySpace::new();

        let first = space.intern(materialize(&spec, &pool));
        let second = space.intern(materialize(&spec, &pool));
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(space.len(), 1);
        prop_assert!(space.audit().is_settled());
    }

    /// Key equality coincides with structural sequence equality.
    #[test]
    fn proptest_keys_are_injective(
        specs in proptest::collection::vec(sequence_strategy(5, POOL_SIZE), 1..10),
    ) {
        let pool = ObjectPool::new(POOL_SIZE);
        let space = KeySpace::new();

        let canonical: Vec<Vec<ElementSpec>> =
            specs.iter().map(|spec| canonicalize(spec, &pool)).collect();
        let keys: Vec<SeqKey> = specs
            .iter()
            .map(|spec| space.intern(materialize(spec, &pool)))
            .collect();

        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                if canonical[i] == canonical[j] {
                    prop_assert_eq!(&keys[i], &keys[j]);
                } else {
                    prop_assert_ne!(&keys[i], &keys[j]);
                }
            }
        }

        let distinct: HashSet<&Vec<ElementSpec>> = canonical.iter().collect();
        prop_assert_eq!(space.len(), distinct.len());
    }

    /// Dropping an arbitrary subset of keys never disturbs the kept ones,
    /// and dropping the rest empties the space.
    #[test]
    fn proptest_dropped_keys_spare_kept_keys(
        specs in proptest::collection::vec(sequence_strategy(5, POOL_SIZE), 1..10),
        keep_mask in proptest::collection::vec(any::<bool>(), 10),
    ) {
        let pool = ObjectPool::new(POOL_SIZE);
        let space = KeySpace::new();

        let mut kept: Vec<(Vec<ElementSpec>, SeqKey)> = Vec::new();
        for (i, spec) in specs.iter().enumerate() {
            let key = space.intern(materialize(spec, &pool));
            if keep_mask[i] {
                kept.push((canonicalize(spec, &pool), key));
            }
            // An unkept key drops here and is pruned on the spot.
        }

        prop_assert!(space.audit().is_settled());
        for (spec, key) in &kept {
            prop_assert_eq!(&space.intern(materialize(spec, &pool)), key);
        }
        let distinct: HashSet<&Vec<ElementSpec>> = kept.iter().map(|(spec, _)| spec).collect();
        prop_assert_eq!(space.len(), distinct.len());

        kept.clear();
        prop_assert!(space.is_empty());
    }

    /// Reclaiming objects prunes exactly the sequences containing them.
    #[test]
    fn proptest_object_reclaim_prunes_dependents(
        specs in proptest::collection::vec(sequence_strategy(5, POOL_SIZE), 1..10),
        reclaim_mask in proptest::collection::vec(any::<bool>(), POOL_SIZE),
    ) {
        let mut pool = ObjectPool::new(POOL_SIZE);
        let space = KeySpace::new();

        let entries: Vec<(Vec<ElementSpec>, SeqKey)> = specs
            .iter()
            .map(|spec| {
                (
                    canonicalize(spec, &pool),
                    space.intern(materialize(spec, &pool)),
                )
            })
            .collect();

        for slot in 0..pool.len() {
            if reclaim_mask[slot] {
                pool.reclaim(slot);
            }
        }

        prop_assert!(space.audit().is_settled());
        let survives = |spec: &Vec<ElementSpec>| {
            spec.iter().all(|element| match element {
                ElementSpec::Object(index) => pool.is_live(*index),
                _ => true,
            })
        };

        let mut surviving: HashSet<&Vec<ElementSpec>> = HashSet::new();
        for (spec, key) in &entries {
            if survives(spec) {
                prop_assert_eq!(&space.intern(materialize(spec, &pool)), key);
                surviving.insert(spec);
            }
        }
        prop_assert_eq!(space.len(), surviving.len());
    }

    /// SameValueZero equality of floats coincides with key equality.
    #[test]
    fn proptest_float_keys_follow_samevaluezero(a in any::<f64>(), b in any::<f64>()) {
        let space = KeySpace::new();
        let key_a = space.intern([a]);
        let key_b = space.intern([b]);
        let same = (a == b) || (a.is_nan() && b.is_nan());
        prop_assert_eq!(key_a == key_b, same);
    }
}

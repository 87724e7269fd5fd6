// Copyright (c) 2026 Kukui Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Integration tests for the key space.
//! Exercises the public API end to end: interning, key identity, and the
//! pruning that follows key and object reclamation, including under
//! concurrent access.

use std::sync::{Arc, Barrier};
use std::thread;

use kukui_lib::{seq, KeySpace, KeySpaceConfig, KukuiError, ObjectRef, SeqKey};

#[test]
fn test_key_space_basic() {
    let space = KeySpace::new();

    // Intern and re-intern
    let first = space.intern(seq![1i64, "a"]);
    let again = space.intern(seq![1i64, "a"]);
    let other = space.intern(seq![1i64, "b"]);

    assert_eq!(first, again);
    assert_ne!(first, other);
    assert_eq!(space.len(), 2);
}

#[test]
fn test_interning_lifecycle() {
    let space = KeySpace::new();
    assert!(space.is_empty());
    println!("Initial setup - created an empty key space");

    // The empty sequence keys the root itself; no extra node is built.
    let root_key = space.intern(seq![]);
    assert_eq!(space.node_count(), 1);
    assert_eq!(space.len(), 1);
    assert!(!space.is_empty());
    assert_eq!(root_key, space.intern(seq![]));

    println!("Interning primitive sequences");
    let a1 = space.intern(seq![1i64, "a"]);
    let a2 = space.intern(seq![1i64, "a"]);
    assert_eq!(a1, a2);
    assert_eq!(space.len(), 2);
    assert_eq!(space.node_count(), 3);

    // A sibling shares the prefix node for 1.
    let b = space.intern(seq![1i64, "b"]);
    assert_ne!(b, a1);
    assert_eq!(space.node_count(), 4);

    println!("Interning object-bearing sequences");
    let user = ObjectRef::new(String::from("user-7"));
    let only_user = space.intern(seq![user.clone()]);
    let user_and_2 = space.intern(seq![user.clone(), 2i64]);
    assert_ne!(only_user, user_and_2);
    assert_eq!(space.node_count(), 6);
    assert_eq!(space.len(), 5);

    // Dropping one clone changes nothing while another is held.
    drop(a2);
    assert_eq!(space.len(), 5, "a1 keeps the key for [1, \"a\"] alive");
    assert_eq!(space.node_count(), 6);

    // Dropping the last clone prunes the branch that existed only for it.
    println!("Dropping the only clone of the key for [1, \"b\"]");
    drop(b);
    assert_eq!(space.len(), 4, "b held the last clone of its key");
    assert_eq!(space.node_count(), 5, "the node for \"b\" is gone");

    // Reclaiming the object prunes every sequence that contained it, even
    // though the keys minted for those sequences are still held.
    println!("Reclaiming the shared object");
    drop(user);
    assert_eq!(space.node_count(), 3, "object-bearing branches are gone");
    assert_eq!(space.len(), 2, "the root key and [1, \"a\"] remain");

    // The orphaned keys are still valid, distinct identities.
    assert_ne!(only_user, user_and_2);

    // Dropping what remains returns the space to its initial state.
    println!("Dropping the remaining keys");
    drop((root_key, a1, only_user, user_and_2));
    assert!(space.is_empty());
    assert_eq!(space.node_count(), 1);

    let audit = space.audit();
    assert!(audit.is_settled(), "no stale structure may survive");
    assert_eq!(audit.live_keys, 0);
}

#[test]
fn test_concurrency() {
    let space = KeySpace::new();

    let thread_count = 8;
    let sequence_count = 100;
    let barrier = Arc::new(Barrier::new(thread_count + 1));
    let mut handles = Vec::with_capacity(thread_count);

    for _ in 0..thread_count {
        let space_clone = space.clone();
        let barrier_clone: Arc<Barrier> = Arc::clone(&barrier);

        let handle = thread::spawn(move || -> Vec<SeqKey> {
            // Wait for all threads to be ready
            barrier_clone.wait();

            // Every thread interns the same sequences in the same order.
            (0..sequence_count)
                .map(|i| space_clone.intern(seq![i as i64, "shared", (i * 2) as u64]))
                .collect()
        });

        handles.push(handle);
    }

    // Start the threads
    barrier.wait();

    let mut per_thread = Vec::with_capacity(thread_count);
    for handle in handles {
        per_thread.push(handle.join().unwrap());
    }

    // All threads must have converged on the same key per sequence.
    let reference = &per_thread[0];
    for keys in &per_thread[1..] {
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(*key, reference[i], "threads disagree on sequence {}", i);
        }
    }

    // The main thread agrees too.
    for (i, key) in reference.iter().enumerate() {
        let i = i as i64;
        assert_eq!(space.intern(seq![i, "shared", (i * 2) as u64]), *key);
    }

    assert_eq!(space.len(), sequence_count);

    drop(per_thread);
    assert!(space.is_empty());
}

#[test]
fn test_concurrent_intern_and_drop() {
    let space = KeySpace::new();

    let thread_count = 8;
    let rounds = 200;
    let barrier = Arc::new(Barrier::new(thread_count));
    let mut handles = Vec::with_capacity(thread_count);

    for t in 0..thread_count {
        let space_clone = space.clone();
        let barrier_clone: Arc<Barrier> = Arc::clone(&barrier);

        let handle = thread::spawn(move || {
            barrier_clone.wait();

            // Interleave minting and dropping over a small shared set of
            // sequences so threads race re-interning against pruning.
            let mut held = Vec::new();
            for round in 0..rounds {
                let key = space_clone.intern(seq![(round % 5) as i64, "churn", t as i64 % 2]);
                if round % 3 == 0 {
                    drop(key);
                } else {
                    held.push(key);
                    if held.len() > 8 {
                        held.remove(0);
                    }
                }
            }
            // held is dropped here, releasing the remaining keys.
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every key has been dropped, so the space must have settled back to
    // a bare root regardless of how the races interleaved.
    assert!(space.is_empty());
    assert!(space.audit().is_settled());

    // The space stays usable after the churn.
    let after = space.intern(seq![0i64, "churn", 0i64]);
    assert_eq!(after, space.intern(seq![0i64, "churn", 0i64]));
}

#[test]
fn test_depth_limit() {
    let config = KeySpaceConfig::new().with_max_depth(4);
    let space = KeySpace::with_config(config);
    assert_eq!(space.config().max_depth(), Some(4));

    // At the limit interning succeeds.
    let at_limit = space.try_intern([1i64, 2, 3, 4]).unwrap();

    // Past the limit it is rejected without touching the trie.
    let err = space.try_intern([1i64, 2, 3, 4, 5]).unwrap_err();
    match err {
        KukuiError::DepthExceeded { depth, max_depth } => {
            assert_eq!(depth, 5);
            assert_eq!(max_depth, 4);
        }
    }
    assert_eq!(space.node_count(), 5);

    drop(at_limit);
    assert!(space.is_empty());
}

#[test]
fn test_global_space() {
    // Install a subscriber so the prune and intern trace events in this
    // test have somewhere to go when RUST_LOG asks for them.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();

    let thread_count = 4;
    let barrier = Arc::new(Barrier::new(thread_count));
    let mut handles = Vec::with_capacity(thread_count);

    for _ in 0..thread_count {
        let barrier_clone: Arc<Barrier> = Arc::clone(&barrier);

        let handle = thread::spawn(move || -> SeqKey {
            assert!(KeySpace::global().ptr_eq(KeySpace::global()));
            barrier_clone.wait();
            kukui_lib::intern(seq!["global-convergence", 11i64])
        });

        handles.push(handle);
    }

    let mut keys = Vec::with_capacity(thread_count);
    for handle in handles {
        keys.push(handle.join().unwrap());
    }

    // Threads and the main thread all see one key for the sequence.
    let local = kukui_lib::intern(seq!["global-convergence", 11i64]);
    for key in &keys {
        assert_eq!(*key, local);
    }
}

//! Property-based tests for the ring invariants named in spec §8.

use proptest::prelude::*;
use ringkv_core::{NodeDescriptor, Ring};

fn node_strategy() -> impl Strategy<Value = (String, u16)> {
    ("[a-z]{3,8}", 1u16..60000)
}

proptest! {
    // Invariant 1: allNodes() order is independent of insertion order.
    #[test]
    fn ring_determinism(names in prop::collection::vec(node_strategy(), 1..20)) {
        let mut unique: Vec<(String, u16)> = Vec::new();
        for n in &names {
            if !unique.contains(n) {
                unique.push(n.clone());
            }
        }

        let forward = Ring::new();
        for (host, port) in &unique {
            forward.add(NodeDescriptor::new(host.clone(), *port)).unwrap();
        }

        let backward = Ring::new();
        for (host, port) in unique.iter().rev() {
            backward.add(NodeDescriptor::new(host.clone(), *port)).unwrap();
        }

        let a: Vec<String> = forward.all_nodes().into_iter().map(|n| n.node_id).collect();
        let b: Vec<String> = backward.all_nodes().into_iter().map(|n| n.node_id).collect();
        prop_assert_eq!(a, b);
    }

    // Invariant 2: ownerOf(k) always returns a node in a non-empty ring.
    #[test]
    fn placement_closure(names in prop::collection::vec(node_strategy(), 1..20), key in "\\PC{1,40}") {
        let ring = Ring::new();
        let mut ids = std::collections::HashSet::new();
        for (host, port) in &names {
            let n = NodeDescriptor::new(host.clone(), *port);
            ids.insert(n.node_id.clone());
            ring.add(n).unwrap();
        }
        if !key.is_empty() {
            let owner = ring.owner_of(key.as_bytes());
            prop_assert!(owner.is_some());
            prop_assert!(ids.contains(&owner.unwrap().node_id));
        }
    }

    // Invariant 3: predecessor(successor(n)) == n and successor(predecessor(n)) == n
    // for rings of size >= 2.
    #[test]
    fn successor_predecessor_symmetry(names in prop::collection::vec(node_strategy(), 2..20)) {
        let ring = Ring::new();
        let mut unique: Vec<(String, u16)> = Vec::new();
        for n in &names {
            if !unique.contains(n) {
                unique.push(n.clone());
            }
        }
        prop_assume!(unique.len() >= 2);
        for (host, port) in &unique {
            ring.add(NodeDescriptor::new(host.clone(), *port)).unwrap();
        }

        for n in ring.all_nodes() {
            let succ = ring.successor(&n.node_id).unwrap();
            let back = ring.predecessor(&succ.node_id).unwrap();
            prop_assert_eq!(back.node_id, n.node_id.clone());

            let pred = ring.predecessor(&n.node_id).unwrap();
            let fwd = ring.successor(&pred.node_id).unwrap();
            prop_assert_eq!(fwd.node_id, n.node_id);
        }
    }

    // Invariant 4: replicas(k, rf) has size min(rf, |R|) with pairwise-distinct ids.
    #[test]
    fn replica_set_size(names in prop::collection::vec(node_strategy(), 1..15), rf in 1usize..8, key in "\\PC{1,40}") {
        let ring = Ring::new();
        let mut unique: Vec<(String, u16)> = Vec::new();
        for n in &names {
            if !unique.contains(n) {
                unique.push(n.clone());
            }
        }
        for (host, port) in &unique {
            ring.add(NodeDescriptor::new(host.clone(), *port)).unwrap();
        }
        if !key.is_empty() {
            let replicas = ring.replicas(key.as_bytes(), rf);
            prop_assert_eq!(replicas.len(), rf.min(unique.len()));
            let distinct: std::collections::HashSet<_> = replicas.iter().map(|n| &n.node_id).collect();
            prop_assert_eq!(distinct.len(), replicas.len());
        }
    }
}

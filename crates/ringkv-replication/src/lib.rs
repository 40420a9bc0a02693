//! The successor-walk fan-out plan shared by the write, delete, and
//! rebalance paths (spec §4.4.1–§4.4.4).
//!
//! Generalized from the teacher's `replication::strategy::SimpleStrategy`
//! (which walked the ring clockwise from a key's primary to collect a
//! *static* replica set). Here the walk drives a *live* fan-out of RPCs
//! instead: each step both names the next peer to call and the replica
//! level to call it at, advancing from the last node actually visited.
//!
//! Spec open question #1 is the reason this is pulled out into its own,
//! independently testable function rather than inlined three times in
//! the Coordinator: the source's write path buggily re-derives "next"
//! from the owner's id every iteration (producing the same successor
//! forever), while its delete path correctly advances from the last
//! visited node. This crate has exactly one implementation, and it is
//! the correct one — every Coordinator fan-out (put, delete, rebalance's
//! bulk push) shares it, so the bug has nowhere to reappear.

use ringkv_core::node::NodeDescriptor;
use ringkv_core::ring::Ring;

/// One step of a replication fan-out: send to `node` at `level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanoutStep {
    pub node: NodeDescriptor,
    pub level: usize,
}

/// Computes the ordered fan-out plan starting just past `origin_node_id`
/// on the ring, for up to `max_levels` steps (typically `R - 1`).
///
/// Walks the ring forward: the first step is `successor(origin)` at
/// level 1, the second is `successor(previous step's node)` at level 2,
/// and so on — advancing from the *last visited* node every iteration,
/// not from `origin` again. Terminates early when the walk wraps back to
/// `origin_node_id`, when the ring has no successor at all (a
/// single-node ring with `origin` as that single node), or when
/// `max_levels` steps have been planned.
pub fn fanout_plan(ring: &Ring, origin_node_id: &str, max_levels: usize) -> Vec<FanoutStep> {
    let mut plan = Vec::with_capacity(max_levels);
    let mut cursor = origin_node_id.to_string();

    for level in 1..=max_levels {
        let Some(next) = ring.successor(&cursor) else {
            break;
        };
        if next.node_id == origin_node_id {
            break;
        }
        cursor = next.node_id.clone();
        plan.push(FanoutStep { node: next, level });
    }

    plan
}

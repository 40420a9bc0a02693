//! Ring topology introspection: ownership summaries and human-readable
//! descriptions, used by the `/api/nodes` surface and startup logging.
//!
//! This is a lightweight, read-only wrapper around `Ring` — it never
//! mutates the ring it was built from. Generalized from the teacher's
//! `Topology` (which grouped per-node vnode tokens); with no virtual
//! nodes there is exactly one position per node; `ownership()` reflects
//! that one-to-one mapping instead of grouping many tokens per node.

use crate::node::NodeDescriptor;
use crate::ring::Ring;

/// Read-only view over a `Ring` for inspection and monitoring.
#[derive(Clone)]
pub struct Topology {
    ring: Ring,
}

impl Topology {
    pub fn new(ring: Ring) -> Self {
        Self { ring }
    }

    /// Every node's ring position, sorted by hash ascending — the shape
    /// the `GET /api/nodes` endpoint returns (spec §6).
    pub fn nodes_by_hash(&self) -> Vec<(String, u32)> {
        let mut nodes: Vec<NodeDescriptor> = self.ring.all_nodes();
        nodes.sort_by_key(|n| n.hash_value);
        nodes.into_iter().map(|n| (n.node_id, n.hash_value)).collect()
    }

    /// Human-readable ring summary for startup/diagnostic logging.
    pub fn describe(&self) -> String {
        let nodes = self.nodes_by_hash();
        let mut out = format!("Ring Description:\n  Nodes: {}\n", nodes.len());
        for (node_id, hash) in &nodes {
            out.push_str(&format!("    {node_id} @ {hash:08x}\n"));
        }
        out
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }
}

impl From<Ring> for Topology {
    fn from(ring: Ring) -> Self {
        Self::new(ring)
    }
}

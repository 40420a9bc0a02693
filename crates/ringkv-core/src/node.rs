//! Node descriptor: a peer's identity and its cached ring position.

use crate::hash::hash_str;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A peer participating in the ring.
///
/// `node_id` is the canonical `host:port` string and is the hashing input
/// for ring placement (spec §3); `hash_value` is cached at insertion so
/// lookups never re-hash a node's identity. Two descriptors are equal iff
/// their `node_id` matches.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub node_id: String,
    pub host: String,
    pub port: u16,
    pub hash_value: u32,
    /// Reserved for future use; the core protocol never reads this to
    /// gate placement or replication decisions (spec §3).
    pub active: bool,
}

impl NodeDescriptor {
    /// Builds a descriptor from `host`/`port`, computing `node_id` and
    /// `hash_value` the same way every other node in the cluster would.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let node_id = format!("{host}:{port}");
        let hash_value = hash_str(&node_id);
        Self {
            node_id,
            host,
            port,
            hash_value,
            active: true,
        }
    }
}

impl PartialEq for NodeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.node_id == other.node_id
    }
}

impl Eq for NodeDescriptor {}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:08x}", self.node_id, self.hash_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_host_port() {
        let n = NodeDescriptor::new("10.0.0.1", 9000);
        assert_eq!(n.node_id, "10.0.0.1:9000");
    }

    #[test]
    fn equality_is_by_node_id_only() {
        let a = NodeDescriptor::new("10.0.0.1", 9000);
        let mut b = NodeDescriptor::new("10.0.0.1", 9000);
        b.active = false;
        assert_eq!(a, b);
    }

    #[test]
    fn hash_value_matches_hashing_node_id() {
        let n = NodeDescriptor::new("10.0.0.1", 9000);
        assert_eq!(n.hash_value, hash_str("10.0.0.1:9000"));
    }
}

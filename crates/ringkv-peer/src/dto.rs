//! Wire DTOs shared by the Peer Client and the HTTP surface (spec §6).
//!
//! Field names here are authoritative per spec §6's interface table.
//! Byte values travel as JSON arrays of octets rather than a packed
//! binary encoding — the exact wire encoding is explicitly out of scope
//! for the core (spec §1); only the field names and response shape are
//! load-bearing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wire representation of a key/value map.
///
/// `serde_json` requires object keys to be strings; an opaque `Vec<u8>`
/// key is neither a string nor a number, so maps keyed by raw bytes are
/// carried as a flat list of pairs on the wire instead of a JSON object.
/// `KvPairs::from`/`Into<HashMap<_,_>>` convert at the boundary so
/// everything above the DTO layer still works with `HashMap`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KvPairs(pub Vec<(Vec<u8>, Vec<u8>)>);

impl From<HashMap<Vec<u8>, Vec<u8>>> for KvPairs {
    fn from(map: HashMap<Vec<u8>, Vec<u8>>) -> Self {
        Self(map.into_iter().collect())
    }
}

impl From<KvPairs> for HashMap<Vec<u8>, Vec<u8>> {
    fn from(pairs: KvPairs) -> Self {
        pairs.0.into_iter().collect()
    }
}

/// `GET /api/nodes` response: `{"host:port": hash, ...}` sorted by hash
/// ascending (spec §6).
///
/// A `HashMap` would lose that order the moment it's serialized — Rust's
/// `HashMap` iteration order is unspecified and `serde_json` just walks
/// whatever order the table produces. This wraps the already-sorted
/// `Vec<(String, u32)>` `Topology::nodes_by_hash()` returns and serializes
/// it as a JSON object directly from that vec, so the sort survives onto
/// the wire.
#[derive(Debug, Clone, Default)]
pub struct NodesByHash(pub Vec<(String, u32)>);

impl Serialize for NodesByHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.0.iter().map(|(id, hash)| (id, hash)))
    }
}

impl From<Vec<(String, u32)>> for NodesByHash {
    fn from(nodes: Vec<(String, u32)>) -> Self {
        Self(nodes)
    }
}

/// Response to `put`/`get`/`delete` — `{value, found, message?}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataResponse {
    pub value: Option<Vec<u8>>,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DataResponse {
    pub fn found(value: Vec<u8>) -> Self {
        Self {
            value: Some(value),
            found: true,
            message: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            value: None,
            found: false,
            message: Some(message.into()),
        }
    }

    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::not_found(message)
    }
}

/// `POST /api/replica/bulk/{level}` body: `{data: {k:v, ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BulkReplicaRequest {
    pub data: KvPairs,
}

/// `POST /api/data` / `POST /api/replica/{level}` body: `{key, value}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// `GET /api/data/all` response: `{primary: {...}, replicas: {L: {...}}}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AllDataResponse {
    pub primary: KvPairs,
    pub replicas: HashMap<usize, KvPairs>,
}

/// `{operation, nodeId, startRange, endRange, replicaIndex}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceRequest {
    pub operation: String,
    pub node_id: String,
    pub start_range: u32,
    pub end_range: u32,
    pub replica_index: usize,
}

impl RebalanceRequest {
    pub const OP_ADD: &'static str = "ADD";

    pub fn add(node_id: impl Into<String>, start_range: u32, end_range: u32, replica_index: usize) -> Self {
        Self {
            operation: Self::OP_ADD.to_string(),
            node_id: node_id.into(),
            start_range,
            end_range,
            replica_index,
        }
    }
}

/// `{newNodePrimaryData, newNodeSecondaryData, success, message}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceResponse {
    #[serde(default)]
    pub new_node_primary_data: KvPairs,
    #[serde(default)]
    pub new_node_secondary_data: KvPairs,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RebalanceResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            new_node_primary_data: KvPairs::default(),
            new_node_secondary_data: KvPairs::default(),
            success: false,
            message: Some(message.into()),
        }
    }

    pub fn success(
        primary: HashMap<Vec<u8>, Vec<u8>>,
        secondary: HashMap<Vec<u8>, Vec<u8>>,
    ) -> Self {
        Self {
            new_node_primary_data: primary.into(),
            new_node_secondary_data: secondary.into(),
            success: true,
            message: None,
        }
    }
}

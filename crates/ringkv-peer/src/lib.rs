//! Outbound transport: a stateless point-to-point client that sends one
//! logical message to one named peer and synchronously returns the
//! peer's reply (spec §4.3).
//!
//! The trait exists so the Coordinator and Membership Watcher can be
//! exercised in tests against an in-memory fake instead of real HTTP —
//! the same "depend on the trait, swap the implementation at the
//! composition root" shape the teacher uses for `Partitioner` and
//! `ReplicationStrategy`.

pub mod dto;
pub mod http;

pub use dto::{DataResponse, RebalanceRequest, RebalanceResponse};

use async_trait::async_trait;
use std::collections::HashMap;

/// A peer address in `host:port` form, identical to a node's `node_id`.
pub type PeerAddr = str;

/// Sends one logical RPC to one peer. Implementations are expected to be
/// cheap to clone (an `Arc`-backed HTTP client, typically) and `Send +
/// Sync` so they can be shared across the Coordinator's async tasks.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// `POST /api/data` — client-facing forward. Transport errors
    /// surface as `DataResponse { found: false, message: Some(..) }`
    /// rather than propagating (spec §4.3, §7).
    async fn put(&self, peer: &PeerAddr, key: &[u8], value: &[u8]) -> DataResponse;

    /// `GET /api/data/{key}`.
    async fn get(&self, peer: &PeerAddr, key: &[u8]) -> DataResponse;

    /// `DELETE /api/data/{key}`.
    async fn delete(&self, peer: &PeerAddr, key: &[u8]) -> DataResponse;

    /// `POST /api/replica/{level}` — fire-and-forget best effort;
    /// transport errors are logged, not returned (spec §4.3, §7).
    async fn replicate(&self, peer: &PeerAddr, key: &[u8], value: &[u8], level: usize);

    /// `POST /api/replica/bulk/{level}` — fire-and-forget best effort.
    async fn replicate_bulk(&self, peer: &PeerAddr, data: HashMap<Vec<u8>, Vec<u8>>, level: usize);

    /// `DELETE /api/replica/{key}?replicaIndex=L` — fire-and-forget best
    /// effort.
    async fn delete_replica(&self, peer: &PeerAddr, key: &[u8], level: usize);

    /// `POST /api/rebalance`, or a synthetic failure response on
    /// transport error (spec §4.3).
    async fn rebalance(&self, peer: &PeerAddr, request: RebalanceRequest) -> RebalanceResponse;

    /// `GET /api/data/primary` on `peer` — the dedicated bulk fetch used
    /// by the "inherit from predecessor" rebalance step (spec §4.4.4).
    /// Best effort: returns an empty map on transport error.
    async fn get_all_primary(&self, peer: &PeerAddr) -> HashMap<Vec<u8>, Vec<u8>>;
}

//! The coordinator: the only component that knows the full protocol
//! (spec §4.4). Owns the rebalancing flag and drives the put/get/delete
//! request paths, membership event handling, and the rebalance
//! sequences that move data between nodes.

pub mod config;

use async_trait::async_trait;
use ringkv_core::node::NodeDescriptor;
use ringkv_core::ring::Ring;
use ringkv_membership::{MembershipEvent, MembershipEventSink};
use ringkv_peer::dto::{DataResponse, RebalanceRequest, RebalanceResponse};
use ringkv_peer::PeerClient;
use ringkv_replication::fanout_plan;
use ringkv_store::LocalStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The orchestrator for one node. Cheap to clone: every field is
/// already `Arc`-backed or `Copy`.
#[derive(Clone)]
pub struct Coordinator {
    self_node: NodeDescriptor,
    ring: Ring,
    store: Arc<LocalStore>,
    peer_client: Arc<dyn PeerClient>,
    replication_factor: usize,
    rebalancing: Arc<AtomicBool>,
}

impl Coordinator {
    pub fn new(
        self_node: NodeDescriptor,
        ring: Ring,
        store: Arc<LocalStore>,
        peer_client: Arc<dyn PeerClient>,
        replication_factor: usize,
        rebalancing: Arc<AtomicBool>,
    ) -> Self {
        Self {
            self_node,
            ring,
            store,
            peer_client,
            replication_factor,
            rebalancing,
        }
    }

    /// The shared flag the membership watcher also polls. Exposed so
    /// the composition root can hand the *same* `Arc` to both.
    pub fn rebalancing_flag(&self) -> Arc<AtomicBool> {
        self.rebalancing.clone()
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    fn try_acquire_rebalancing(&self) -> bool {
        self.rebalancing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn release_rebalancing(&self) {
        self.rebalancing.store(false, Ordering::SeqCst);
    }

    fn max_replica_level(&self) -> usize {
        self.replication_factor.saturating_sub(1)
    }

    // ---- Client request paths (spec §4.4.1-4.4.3) ----------------------

    pub async fn put(&self, key: Vec<u8>, value: Vec<u8>) -> DataResponse {
        if self.rebalancing.load(Ordering::SeqCst) {
            return DataResponse::not_found("System is rebalancing, please try again later");
        }
        let Some(owner) = self.ring.owner_of(&key) else {
            return DataResponse::not_found("No nodes available");
        };
        if owner.node_id != self.self_node.node_id {
            return self.peer_client.put(&owner.node_id, &key, &value).await;
        }

        self.store.put_primary(key.clone(), value.clone());
        for step in fanout_plan(&self.ring, &self.self_node.node_id, self.max_replica_level()) {
            self.peer_client
                .replicate(&step.node.node_id, &key, &value, step.level)
                .await;
        }
        DataResponse::found(value)
    }

    pub async fn get(&self, key: &[u8]) -> DataResponse {
        let Some(owner) = self.ring.owner_of(key) else {
            return DataResponse::not_found("No nodes available");
        };

        if owner.node_id == self.self_node.node_id {
            return self.get_local(key);
        }

        let response = self.peer_client.get(&owner.node_id, key).await;
        if response.found {
            return response;
        }

        // Probe the R-1 successors of the *original* owner (spec §4.4.2,
        // open question #2) rather than re-deriving "next" from whatever
        // the last forwarded call happened to return.
        for step in fanout_plan(&self.ring, &owner.node_id, self.max_replica_level()) {
            let probe = self.peer_client.get(&step.node.node_id, key).await;
            if probe.found {
                return probe;
            }
        }
        DataResponse::not_found("Key not found")
    }

    fn get_local(&self, key: &[u8]) -> DataResponse {
        if let Some(v) = self.store.get_primary(key) {
            return DataResponse::found(v);
        }
        for level in 1..self.replication_factor {
            if let Some(v) = self.store.get_replica(level, key) {
                return DataResponse::found(v);
            }
        }
        DataResponse::not_found("Key not found")
    }

    pub async fn delete(&self, key: &[u8]) -> DataResponse {
        if self.rebalancing.load(Ordering::SeqCst) {
            return DataResponse::not_found("System is rebalancing, please try again later");
        }
        let Some(owner) = self.ring.owner_of(key) else {
            return DataResponse::not_found("No nodes available");
        };
        if owner.node_id != self.self_node.node_id {
            return self.peer_client.delete(&owner.node_id, key).await;
        }

        let Some(value) = self.store.get_primary(key) else {
            return DataResponse::not_found("Key not found");
        };
        self.store.delete_primary(key);
        for step in fanout_plan(&self.ring, &self.self_node.node_id, self.max_replica_level()) {
            self.peer_client
                .delete_replica(&step.node.node_id, key, step.level)
                .await;
        }
        DataResponse::found(value)
    }

    // ---- Rebalance request endpoint (spec §4.4.5) -----------------------

    pub async fn handle_rebalance(&self, request: RebalanceRequest) -> RebalanceResponse {
        match request.operation.as_str() {
            RebalanceRequest::OP_ADD => {
                let primary = self.store.extract_range(request.start_range, request.end_range);
                let secondary = self.store.extract_replica(request.replica_index);
                self.store
                    .put_bulk_replica(request.replica_index, primary.clone());
                RebalanceResponse::success(primary, secondary)
            }
            other => {
                tracing::warn!(operation = other, "rebalance request with unknown operation");
                RebalanceResponse::failure("Unknown operation")
            }
        }
    }

    // ---- Membership event handling (spec §4.4.4) ------------------------

    async fn handle_joined(&self, node: NodeDescriptor) {
        if !self.try_acquire_rebalancing() {
            tracing::info!(node_id = %node.node_id, "rebalance in progress, join re-observed next tick");
            return;
        }
        if let Err(e) = self.ring.add(node.clone()) {
            tracing::error!(node_id = %node.node_id, error = %e, "failed to add joining peer to ring");
        }
        self.release_rebalancing();
    }

    async fn handle_left(&self, node: NodeDescriptor) {
        if !self.try_acquire_rebalancing() {
            tracing::info!(node_id = %node.node_id, "rebalance in progress, leave re-observed next tick");
            return;
        }
        let was_predecessor = self
            .ring
            .predecessor(&self.self_node.node_id)
            .map(|p| p.node_id == node.node_id)
            .unwrap_or(false);
        self.ring.remove(&node.node_id);
        if was_predecessor {
            self.inherit_from_predecessor().await;
        }
        self.release_rebalancing();
    }

    async fn handle_self_joined(&self) {
        self.pull_from_successor().await;
    }

    /// Triggered when the local node's immediate predecessor leaves:
    /// promotes replica level 1 to primary, fans the promoted entries
    /// back out to successors, and re-seeds replica level 1 from the new
    /// predecessor's primary tier (spec §4.4.4).
    async fn inherit_from_predecessor(&self) {
        let promoted = self.store.promote_replica_to_primary(1);
        if !promoted.is_empty() {
            for step in fanout_plan(&self.ring, &self.self_node.node_id, self.max_replica_level()) {
                self.peer_client
                    .replicate_bulk(&step.node.node_id, promoted.clone(), step.level)
                    .await;
            }
        }

        if let Some(predecessor) = self.ring.predecessor(&self.self_node.node_id) {
            let snapshot = self.peer_client.get_all_primary(&predecessor.node_id).await;
            self.store.put_bulk_replica(1, snapshot);
        }
    }

    /// Triggered when the local node has just joined: pulls its new
    /// ownership range and a matching replica copy from its successor
    /// (spec §4.4.4).
    async fn pull_from_successor(&self) {
        let Some(successor) = self.ring.successor(&self.self_node.node_id) else {
            return;
        };
        if successor.node_id == self.self_node.node_id {
            return;
        }
        if !self.try_acquire_rebalancing() {
            tracing::warn!("pull-from-successor deferred: rebalance already in progress");
            return;
        }

        let start_range = self
            .ring
            .predecessor(&self.self_node.node_id)
            .map(|p| p.hash_value.wrapping_add(1))
            .unwrap_or(0);
        let end_range = self.self_node.hash_value;
        let replica_index = self.max_replica_level();

        let request = RebalanceRequest::add(self.self_node.node_id.clone(), start_range, end_range, replica_index);
        let response = self.peer_client.rebalance(&successor.node_id, request).await;

        if response.success {
            self.store.put_all_primary(response.new_node_primary_data.into());
            self.store.put_bulk_replica(1, response.new_node_secondary_data.into());
        } else {
            tracing::warn!(
                successor = %successor.node_id,
                message = ?response.message,
                "pull-from-successor rebalance failed"
            );
        }

        self.release_rebalancing();
    }
}

#[async_trait]
impl MembershipEventSink for Coordinator {
    async fn dispatch(&self, event: MembershipEvent) {
        match event {
            MembershipEvent::Joined(node) => self.handle_joined(node).await,
            MembershipEvent::Left(node) => self.handle_left(node).await,
            MembershipEvent::SelfJoined(_) => self.handle_self_joined().await,
        }
    }
}

#[cfg(test)]
mod tests;

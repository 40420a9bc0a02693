//! The HTTP transport (spec §6): axum routes over the coordinator and
//! the local store, wired at the composition root in `main.rs`.
//!
//! This is explicitly the non-core part of the system (spec §1) — the
//! core protocol lives in `ringkv-coordinator`; everything here is JSON
//! (de)serialization and routing glue.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post};
use axum::Router;
use ringkv_core::ring::Ring;
use ringkv_core::topology::Topology;
use ringkv_peer::dto::{AllDataResponse, BulkReplicaRequest, DataResponse, KvPairs, NodesByHash, PutRequest, RebalanceRequest, RebalanceResponse};
use ringkv_store::LocalStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared state handed to every handler. Holds the same `Arc<LocalStore>`
/// and `Ring` the coordinator was built with, so introspection endpoints
/// (`/api/data/all`, `/api/nodes`) can read them directly without
/// widening the coordinator's own API with store/ring accessors it has
/// no protocol reason to expose.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ringkv_coordinator::Coordinator>,
    pub store: Arc<LocalStore>,
    pub ring: Ring,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", post(put_data))
        .route("/api/data/:key", get(get_data).delete(delete_data))
        .route("/api/replica/bulk/:level", post(replicate_bulk))
        // Same path shape serves two different rows of the spec §6
        // interface table: POST takes a replica level, DELETE takes a
        // key plus a `replicaIndex` query parameter.
        .route("/api/replica/:param", post(replicate).delete(delete_replica))
        .route("/api/data/all", get(get_all_data))
        .route("/api/data/primary", get(get_primary_data))
        .route("/api/nodes", get(get_nodes))
        .route("/api/rebalance", post(rebalance))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn put_data(State(state): State<AppState>, Json(req): Json<PutRequest>) -> Json<DataResponse> {
    Json(state.coordinator.put(req.key, req.value).await)
}

async fn get_data(State(state): State<AppState>, Path(key): Path<String>) -> Json<DataResponse> {
    Json(state.coordinator.get(key.as_bytes()).await)
}

async fn delete_data(State(state): State<AppState>, Path(key): Path<String>) -> Json<DataResponse> {
    Json(state.coordinator.delete(key.as_bytes()).await)
}

async fn replicate(
    State(state): State<AppState>,
    Path(level): Path<usize>,
    Json(req): Json<PutRequest>,
) -> Json<DataResponse> {
    state.store.put_replica(level, req.key, req.value.clone());
    Json(DataResponse::found(req.value))
}

async fn replicate_bulk(
    State(state): State<AppState>,
    Path(level): Path<usize>,
    Json(req): Json<BulkReplicaRequest>,
) -> Json<DataResponse> {
    state.store.put_bulk_replica(level, req.data.into());
    Json(DataResponse {
        value: None,
        found: true,
        message: Some("bulk replica applied".to_string()),
    })
}

#[derive(Debug, Deserialize)]
struct ReplicaQuery {
    #[serde(rename = "replicaIndex")]
    replica_index: usize,
}

async fn delete_replica(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ReplicaQuery>,
) -> StatusCode {
    if state.store.delete_replica(query.replica_index, key.as_bytes()) {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn get_all_data(State(state): State<AppState>) -> Json<AllDataResponse> {
    let primary = state.store.snapshot_primary();
    let mut replicas = HashMap::new();
    for level in 1..=state.store.replica_tier_count() {
        replicas.insert(level, state.store.snapshot_replica(level).into());
    }
    Json(AllDataResponse {
        primary: primary.into(),
        replicas,
    })
}

async fn get_primary_data(State(state): State<AppState>) -> Json<KvPairs> {
    Json(state.store.snapshot_primary().into())
}

async fn get_nodes(State(state): State<AppState>) -> Json<NodesByHash> {
    let topology = Topology::from(state.ring.clone());
    Json(topology.nodes_by_hash().into())
}

async fn rebalance(
    State(state): State<AppState>,
    Json(req): Json<RebalanceRequest>,
) -> Json<RebalanceResponse> {
    Json(state.coordinator.handle_rebalance(req).await)
}

async fn health() -> impl IntoResponse {
    "OK"
}

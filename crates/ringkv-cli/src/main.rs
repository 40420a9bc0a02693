//! Composition root: wires the ring, store, peer client, membership
//! watcher, and coordinator together behind an HTTP surface (spec §6).

mod config;
mod http;

use clap::Parser;
use config::CliConfig;
use ringkv_core::node::NodeDescriptor;
use ringkv_core::ring::Ring;
use ringkv_coordinator::config::validate_replication_factor;
use ringkv_coordinator::Coordinator;
use ringkv_membership::{MembershipWatcher, StaticPeerRegistry};
use ringkv_peer::http::HttpPeerClient;
use ringkv_peer::PeerClient;
use ringkv_store::LocalStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let config = CliConfig::parse();
    let replication_factor = validate_replication_factor(config.replication_factor);

    let self_node = NodeDescriptor::new(config.host.clone(), config.port);
    tracing::info!(
        node_id = %self_node.node_id,
        replication_factor,
        "starting node"
    );

    let ring = Ring::new();
    ring.add(self_node.clone())?;

    let store = Arc::new(LocalStore::new(replication_factor));
    let peer_client: Arc<dyn PeerClient> =
        Arc::new(HttpPeerClient::new(Duration::from_secs(config.peer_timeout_secs)));
    let rebalancing = Arc::new(AtomicBool::new(false));

    let coordinator = Arc::new(Coordinator::new(
        self_node.clone(),
        ring.clone(),
        store.clone(),
        peer_client,
        replication_factor,
        rebalancing.clone(),
    ));

    let registry = StaticPeerRegistry::new(config.peer_addrs());
    let watcher = Arc::new(MembershipWatcher::new(
        registry,
        (*coordinator).clone(),
        self_node.clone(),
        Duration::from_secs(config.watcher_interval_secs),
        rebalancing,
    ));
    tokio::spawn(async move { watcher.run().await });

    let app_state = http::AppState {
        coordinator,
        store,
        ring,
    };
    let router = http::router(app_state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}

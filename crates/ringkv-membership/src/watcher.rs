//! The membership watcher: a periodic task that diffs the peer
//! registry's current view against a cached `knownNodes` set and
//! dispatches join/leave/self-joined events to the coordinator.
//!
//! # Scheduling
//!
//! Ticks run fixed-delay: the watcher sleeps for `interval` only after
//! the previous tick has fully completed, so two ticks never overlap
//! even if a registry call or event dispatch is slow.
//!
//! # Rebalancing gate
//!
//! A tick is skipped entirely — not merely deferred — whenever the
//! shared `rebalancing` flag is set. The event that would have fired
//! this tick is simply re-observed (and re-dispatched) on a later tick,
//! since `knownNodes` was never updated for it.

use crate::registry::PeerRegistry;
use async_trait::async_trait;
use ringkv_core::node::NodeDescriptor;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One membership change observed on a tick.
#[derive(Debug, Clone)]
pub enum MembershipEvent {
    /// A peer other than the local node appeared.
    Joined(NodeDescriptor),
    /// A previously-known peer disappeared.
    Left(NodeDescriptor),
    /// The local node observed itself for the first time.
    SelfJoined(NodeDescriptor),
}

/// Receives membership events dispatched by the watcher.
///
/// The coordinator is the sole implementer in production; tests use a
/// recording fake.
#[async_trait]
pub trait MembershipEventSink: Send + Sync {
    async fn dispatch(&self, event: MembershipEvent);
}

/// Periodic membership poller.
pub struct MembershipWatcher<R: PeerRegistry, S: MembershipEventSink> {
    registry: R,
    sink: S,
    self_node: NodeDescriptor,
    interval: Duration,
    rebalancing: Arc<AtomicBool>,
    known: Mutex<HashSet<String>>,
}

impl<R: PeerRegistry, S: MembershipEventSink> MembershipWatcher<R, S> {
    /// Builds a watcher. `rebalancing` is the same flag the coordinator
    /// uses to gate client writes — ticking while it's set would race
    /// the coordinator's own rebalance sequence over the ring.
    pub fn new(
        registry: R,
        sink: S,
        self_node: NodeDescriptor,
        interval: Duration,
        rebalancing: Arc<AtomicBool>,
    ) -> Self {
        Self {
            registry,
            sink,
            self_node,
            interval,
            rebalancing,
            known: Mutex::new(HashSet::new()),
        }
    }

    /// Runs the fixed-delay poll loop forever. Intended to be spawned
    /// as its own task at startup; never call this from a request
    /// handler.
    pub async fn run(&self) {
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Runs exactly one poll cycle (spec §4.5). Exposed separately from
    /// `run` so tests can drive individual ticks deterministically.
    pub async fn tick(&self) {
        if self.rebalancing.load(Ordering::SeqCst) {
            tracing::debug!("membership tick skipped: rebalance in progress");
            return;
        }

        let live = self.registry.list_peers().await;
        let live_ids: HashSet<String> = live
            .iter()
            .map(|(h, p)| format!("{h}:{p}"))
            .collect();

        let mut known = self.known.lock().await;
        let mut self_joined = false;

        for (host, port) in &live {
            let node_id = format!("{host}:{port}");
            if known.contains(&node_id) {
                continue;
            }
            known.insert(node_id.clone());
            if node_id == self.self_node.node_id {
                self_joined = true;
            } else {
                let node = NodeDescriptor::new(host.clone(), *port);
                tracing::info!(node_id = %node.node_id, "peer joined");
                self.sink.dispatch(MembershipEvent::Joined(node)).await;
            }
        }

        let gone: Vec<String> = known.difference(&live_ids).cloned().collect();
        for node_id in gone {
            known.remove(&node_id);
            let (host, port) = split_node_id(&node_id);
            let node = NodeDescriptor::new(host, port);
            tracing::info!(node_id = %node.node_id, "peer left");
            self.sink.dispatch(MembershipEvent::Left(node)).await;
        }

        drop(known);

        if self_joined {
            tracing::info!(node_id = %self.self_node.node_id, "self joined");
            self.sink
                .dispatch(MembershipEvent::SelfJoined(self.self_node.clone()))
                .await;
        }
    }
}

fn split_node_id(node_id: &str) -> (String, u16) {
    let (host, port) = node_id.rsplit_once(':').expect("node_id is host:port");
    (host.to_string(), port.parse().expect("node_id port is numeric"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticPeerRegistry;
    use tokio::sync::Mutex as TokioMutex;

    struct RecordingSink {
        events: TokioMutex<Vec<MembershipEvent>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                events: TokioMutex::new(Vec::new()),
            }
        }

        async fn labels(&self) -> Vec<&'static str> {
            self.events
                .lock()
                .await
                .iter()
                .map(|e| match e {
                    MembershipEvent::Joined(_) => "joined",
                    MembershipEvent::Left(_) => "left",
                    MembershipEvent::SelfJoined(_) => "self_joined",
                })
                .collect()
        }
    }

    #[async_trait]
    impl MembershipEventSink for RecordingSink {
        async fn dispatch(&self, event: MembershipEvent) {
            self.events.lock().await.push(event);
        }
    }

    fn rebalancing_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[tokio::test]
    async fn first_tick_reports_self_joined_and_not_peer_joined_for_self() {
        let self_node = NodeDescriptor::new("self", 1);
        let registry = StaticPeerRegistry::new(vec![("self".into(), 1)]);
        let sink = RecordingSink::new();
        let watcher = MembershipWatcher::new(
            registry,
            sink,
            self_node,
            Duration::from_secs(10),
            rebalancing_flag(),
        );
        watcher.tick().await;
        assert_eq!(watcher.sink.labels().await, vec!["self_joined"]);
    }

    #[tokio::test]
    async fn new_peer_dispatches_joined() {
        let self_node = NodeDescriptor::new("self", 1);
        let registry = StaticPeerRegistry::new(vec![("self".into(), 1), ("peer".into(), 2)]);
        let sink = RecordingSink::new();
        let watcher = MembershipWatcher::new(
            registry,
            sink,
            self_node,
            Duration::from_secs(10),
            rebalancing_flag(),
        );
        watcher.tick().await;
        assert_eq!(watcher.sink.labels().await, vec!["joined", "self_joined"]);
    }

    #[tokio::test]
    async fn disappearing_peer_dispatches_left_on_a_later_tick() {
        let self_node = NodeDescriptor::new("self", 1);
        let registry = Arc::new(TokioMutex::new(vec![
            ("self".to_string(), 1u16),
            ("peer".to_string(), 2u16),
        ]));

        struct FlakyRegistry(Arc<TokioMutex<Vec<(String, u16)>>>);
        #[async_trait]
        impl PeerRegistry for FlakyRegistry {
            async fn list_peers(&self) -> Vec<(String, u16)> {
                self.0.lock().await.clone()
            }
        }

        let sink = RecordingSink::new();
        let watcher = MembershipWatcher::new(
            FlakyRegistry(registry.clone()),
            sink,
            self_node,
            Duration::from_secs(10),
            rebalancing_flag(),
        );
        watcher.tick().await;
        registry.lock().await.retain(|(h, _)| h != "peer");
        watcher.tick().await;

        assert_eq!(
            watcher.sink.labels().await,
            vec!["joined", "self_joined", "left"]
        );
    }

    #[tokio::test]
    async fn tick_is_skipped_entirely_while_rebalancing() {
        let self_node = NodeDescriptor::new("self", 1);
        let registry = StaticPeerRegistry::new(vec![("self".into(), 1), ("peer".into(), 2)]);
        let sink = RecordingSink::new();
        let flag = rebalancing_flag();
        flag.store(true, Ordering::SeqCst);
        let watcher = MembershipWatcher::new(registry, sink, self_node, Duration::from_secs(10), flag);
        watcher.tick().await;
        assert!(watcher.sink.labels().await.is_empty());
    }
}

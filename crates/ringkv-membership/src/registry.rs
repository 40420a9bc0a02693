//! The peer registry contract: an external collaborator that yields the
//! cluster's current membership. Any discovery backend — static config,
//! DNS SRV records, a gossip protocol, Consul, whatever — is acceptable
//! as long as it satisfies this trait; the watcher only needs eventual
//! consistency, never a snapshot guarantee.

use async_trait::async_trait;

/// Yields the set of peers currently believed to be live.
#[async_trait]
pub trait PeerRegistry: Send + Sync {
    /// Returns the current live peer set as `(host, port)` pairs.
    ///
    /// Implementations are free to block on network I/O; callers (the
    /// watcher) run this on its own scheduled task, never inline with a
    /// client request.
    async fn list_peers(&self) -> Vec<(String, u16)>;
}

/// A registry over a membership list supplied at construction time.
///
/// Useful for tests and for deployments where the peer set is fixed at
/// startup (no discovery backend at all — every listed peer is assumed
/// live forever).
pub struct StaticPeerRegistry {
    peers: Vec<(String, u16)>,
}

impl StaticPeerRegistry {
    pub fn new(peers: Vec<(String, u16)>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl PeerRegistry for StaticPeerRegistry {
    async fn list_peers(&self) -> Vec<(String, u16)> {
        self.peers.clone()
    }
}

/// One entry in an `HttpPeerRegistry` discovery response.
#[derive(serde::Deserialize)]
struct DiscoveredPeer {
    host: String,
    port: u16,
}

/// A registry backed by a polling GET against a discovery service.
///
/// Expects a JSON array body (`[{"host": "...", "port": ...}, ...]`).
/// Any transport failure or malformed body is logged and treated as "no
/// peers this tick" rather than propagated — a single bad discovery
/// response should never crash the watcher loop, only leave membership
/// unchanged until the next poll.
pub struct HttpPeerRegistry {
    client: reqwest::Client,
    discovery_url: String,
}

impl HttpPeerRegistry {
    pub fn new(discovery_url: String, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a bounded timeout");
        Self { client, discovery_url }
    }
}

#[async_trait]
impl PeerRegistry for HttpPeerRegistry {
    async fn list_peers(&self) -> Vec<(String, u16)> {
        match self.client.get(&self.discovery_url).send().await {
            Ok(resp) => match resp.json::<Vec<DiscoveredPeer>>().await {
                Ok(peers) => peers.into_iter().map(|p| (p.host, p.port)).collect(),
                Err(e) => {
                    tracing::warn!(url = %self.discovery_url, error = %e, "malformed discovery response, treating as empty");
                    Vec::new()
                }
            },
            Err(e) => {
                tracing::warn!(url = %self.discovery_url, error = %e, "discovery poll failed, treating as empty");
                Vec::new()
            }
        }
    }
}

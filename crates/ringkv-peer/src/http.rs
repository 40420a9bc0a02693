//! HTTP implementation of `PeerClient` over `reqwest`, wired to the
//! endpoint table in spec §6.

use crate::dto::{
    BulkReplicaRequest, DataResponse, PutRequest, RebalanceRequest, RebalanceResponse,
};
use crate::PeerClient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Production `PeerClient`: one shared `reqwest::Client` with a bounded
/// per-request timeout (spec §5 requires *some* bound; 5s is the
/// documented default — see DESIGN.md).
#[derive(Clone)]
pub struct HttpPeerClient {
    client: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a bounded timeout");
        Self { client }
    }

    fn base_url(peer: &str) -> String {
        format!("http://{peer}")
    }
}

impl Default for HttpPeerClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn put(&self, peer: &str, key: &[u8], value: &[u8]) -> DataResponse {
        let url = format!("{}/api/data", Self::base_url(peer));
        let body = PutRequest {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) => match resp.json::<DataResponse>().await {
                Ok(dr) => dr,
                Err(e) => DataResponse::transport_error(format!("bad response from {peer}: {e}")),
            },
            Err(e) => {
                tracing::warn!(peer, error = %e, "put forward failed");
                DataResponse::transport_error(format!("unreachable peer {peer}: {e}"))
            }
        }
    }

    async fn get(&self, peer: &str, key: &[u8]) -> DataResponse {
        let url = format!(
            "{}/api/data/{}",
            Self::base_url(peer),
            urlencode_key(key)
        );
        match self.client.get(&url).send().await {
            Ok(resp) => match resp.json::<DataResponse>().await {
                Ok(dr) => dr,
                Err(e) => DataResponse::transport_error(format!("bad response from {peer}: {e}")),
            },
            Err(e) => {
                tracing::warn!(peer, error = %e, "get forward failed");
                DataResponse::transport_error(format!("unreachable peer {peer}: {e}"))
            }
        }
    }

    async fn delete(&self, peer: &str, key: &[u8]) -> DataResponse {
        let url = format!(
            "{}/api/data/{}",
            Self::base_url(peer),
            urlencode_key(key)
        );
        match self.client.delete(&url).send().await {
            Ok(resp) => match resp.json::<DataResponse>().await {
                Ok(dr) => dr,
                Err(e) => DataResponse::transport_error(format!("bad response from {peer}: {e}")),
            },
            Err(e) => {
                tracing::warn!(peer, error = %e, "delete forward failed");
                DataResponse::transport_error(format!("unreachable peer {peer}: {e}"))
            }
        }
    }

    async fn replicate(&self, peer: &str, key: &[u8], value: &[u8], level: usize) {
        let url = format!("{}/api/replica/{}", Self::base_url(peer), level);
        let body = PutRequest {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        if let Err(e) = self.client.post(&url).json(&body).send().await {
            tracing::warn!(peer, level, error = %e, "replicate failed, swallowed (best effort)");
        }
    }

    async fn replicate_bulk(&self, peer: &str, data: HashMap<Vec<u8>, Vec<u8>>, level: usize) {
        let url = format!("{}/api/replica/bulk/{}", Self::base_url(peer), level);
        let body = BulkReplicaRequest { data: data.into() };
        if let Err(e) = self.client.post(&url).json(&body).send().await {
            tracing::warn!(peer, level, error = %e, "bulk replicate failed, swallowed (best effort)");
        }
    }

    async fn delete_replica(&self, peer: &str, key: &[u8], level: usize) {
        let url = format!(
            "{}/api/replica/{}?replicaIndex={}",
            Self::base_url(peer),
            urlencode_key(key),
            level
        );
        if let Err(e) = self.client.delete(&url).send().await {
            tracing::warn!(peer, level, error = %e, "delete_replica failed, swallowed (best effort)");
        }
    }

    async fn rebalance(&self, peer: &str, request: RebalanceRequest) -> RebalanceResponse {
        let url = format!("{}/api/rebalance", Self::base_url(peer));
        match self.client.post(&url).json(&request).send().await {
            Ok(resp) => match resp.json::<RebalanceResponse>().await {
                Ok(rr) => rr,
                Err(e) => RebalanceResponse::failure(format!("bad response from {peer}: {e}")),
            },
            Err(e) => {
                tracing::warn!(peer, error = %e, "rebalance call failed");
                RebalanceResponse::failure(format!("unreachable peer {peer}: {e}"))
            }
        }
    }

    async fn get_all_primary(&self, peer: &str) -> HashMap<Vec<u8>, Vec<u8>> {
        let url = format!("{}/api/data/primary", Self::base_url(peer));
        match self.client.get(&url).send().await {
            Ok(resp) => match resp.json::<crate::dto::KvPairs>().await {
                Ok(pairs) => pairs.into(),
                Err(e) => {
                    tracing::warn!(peer, error = %e, "bad get_all_primary response, treating as empty");
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!(peer, error = %e, "get_all_primary failed, treating as empty");
                HashMap::new()
            }
        }
    }
}

/// Keys are opaque bytes; percent-encode via hex so non-UTF8 keys still
/// round-trip through a URL path segment.
fn urlencode_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("%{b:02X}")).collect()
}

//! Startup configuration: `server.port` and `replication.factor` from
//! spec §6, plus the composition root's own concerns (bind host, the
//! static peer list standing in for a real discovery backend, and the
//! two bounded timeouts spec §5 calls for).

use clap::Parser;

/// One node's command-line configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "ringkv", about = "A replicated in-memory key/value store distributed over a consistent-hash ring")]
pub struct CliConfig {
    /// Address this node's HTTP surface binds to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// `server.port` (spec §6).
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// `replication.factor` (spec §6). Values below 1 are invalid and
    /// are coerced to 2 with a logged warning.
    #[arg(long, default_value_t = 2)]
    pub replication_factor: i64,

    /// Every peer in the cluster, `host:port`, comma-separated,
    /// including this node itself. Stands in for a real discovery
    /// backend (spec §1 explicitly treats discovery as an external,
    /// out-of-scope collaborator) — any process that can produce the
    /// same fixed set on every tick satisfies the peer registry
    /// contract.
    #[arg(long, value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Bounded timeout for outbound peer RPCs (spec §5).
    #[arg(long, default_value_t = 5)]
    pub peer_timeout_secs: u64,

    /// Membership watcher poll period (spec §4.5 fixes this at 10s;
    /// exposed here only to make tests and local experimentation
    /// faster).
    #[arg(long, default_value_t = 10)]
    pub watcher_interval_secs: u64,
}

impl CliConfig {
    pub fn self_node_id(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses `--peers` into `(host, port)` pairs, skipping any entry
    /// that isn't well-formed `host:port` rather than failing startup
    /// over one bad entry.
    pub fn peer_addrs(&self) -> Vec<(String, u16)> {
        self.peers
            .iter()
            .filter_map(|p| {
                let (host, port) = p.rsplit_once(':')?;
                let port: u16 = port.parse().ok()?;
                Some((host.to_string(), port))
            })
            .collect()
    }
}

//! Peer discovery and the periodic membership watcher (spec §4.5).

pub mod registry;
pub mod watcher;

pub use registry::{HttpPeerRegistry, PeerRegistry, StaticPeerRegistry};
pub use watcher::{MembershipEvent, MembershipEventSink, MembershipWatcher};

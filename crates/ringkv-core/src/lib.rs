//! Core abstractions for the consistent-hash ring that places keys on nodes.
//!
//! This crate provides the fundamental, transport-free building blocks:
//! - the hash function used to place both keys and nodes on the ring
//! - the `NodeDescriptor` identifying a peer
//! - the `Ring` itself: an ordered, thread-safe map from hash to node
//! - a `Topology` view for ring introspection (used by the `/api/nodes`
//!   surface and startup logging)

pub mod error;
pub mod hash;
pub mod node;
pub mod ring;
pub mod topology;

pub use error::{Error, Result};
pub use hash::hash_str;
pub use node::NodeDescriptor;
pub use ring::Ring;
pub use topology::Topology;

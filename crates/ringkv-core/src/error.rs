//! Error types for the core library.

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// These are programmer errors (bad arguments to ring mutations), not
/// client-visible failures — callers at the RPC boundary translate them
/// into response DTOs rather than propagating them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

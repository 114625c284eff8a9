//! Error types for connection management.

use thiserror::Error;

/// Errors surfaced by [`crate::ConnectionManager`] operations.
#[derive(Debug, Error)]
pub enum NetError {
    /// An operation required the host role.
    #[error("operation requires the host role")]
    NotHost,

    /// An operation required the member role.
    #[error("operation requires the member role")]
    NotMember,

    /// An operation required an active session.
    #[error("no active session")]
    NotConnected,

    /// The host did not answer within the configured timeout.
    #[error("connection attempt timed out")]
    ConnectTimeout,

    /// The named peer is not registered with this manager.
    #[error("unknown peer: {0}")]
    UnknownPeer(String),
}

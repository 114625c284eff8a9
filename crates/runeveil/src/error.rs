//! The unified error type for the façade.

use thiserror::Error;

/// Any error a [`crate::SessionCoordinator`] operation can produce.
#[derive(Debug, Error)]
pub enum RuneveilError {
    #[error(transparent)]
    Net(#[from] runeveil_netplay::NetError),

    #[error(transparent)]
    Protocol(#[from] runeveil_protocol::ProtocolError),

    /// The underlying transport failed; carries its own message.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport has no local identity yet; `open()` was not called
    /// or failed.
    #[error("transport not opened")]
    NotOpened,

    /// No host is listening on the requested room.
    #[error("room {0} not found")]
    RoomNotFound(String),

    /// The host rejected or dropped the session during establishment.
    #[error("connection refused: {0}")]
    Refused(String),

    /// The signaling layer could not allocate an identity.
    #[error("identity allocation failed: {0}")]
    OpenFailed(String),
}

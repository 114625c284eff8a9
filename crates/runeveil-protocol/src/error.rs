//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Binary (MessagePack) serialization failed.
    #[cfg(feature = "binary")]
    #[error("binary encode failed: {0}")]
    EncodeBinary(#[from] rmp_serde::encode::Error),

    /// Binary (MessagePack) deserialization failed.
    #[cfg(feature = "binary")]
    #[error("binary decode failed: {0}")]
    DecodeBinary(#[from] rmp_serde::decode::Error),

    /// Textual (JSON) serialization failed.
    #[cfg(feature = "json")]
    #[error("json encode failed: {0}")]
    EncodeJson(serde_json::Error),

    /// Textual (JSON) deserialization failed.
    #[cfg(feature = "json")]
    #[error("json decode failed: {0}")]
    DecodeJson(serde_json::Error),

    /// The payload passed deserialization but violates protocol rules -
    /// an empty buffer, an unknown kind, fields missing for the kind.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

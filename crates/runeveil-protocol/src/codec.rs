//! Codec backends: compact binary (MessagePack) and textual (JSON).
//!
//! The protocol layer never commits to one byte format. Everything above
//! it holds a [`Codec`] and stays agnostic; [`AnyCodec::negotiated`] picks
//! the compact binary backend when it is compiled in and falls back to the
//! textual one otherwise, mirroring the runtime fallback the browser build
//! performs when its binary encoder fails to load.
//!
//! # Trailing bytes
//!
//! Some transports hand the receiver a buffer with residue beyond one
//! complete message. Decoding here reads exactly one message and tolerates
//! the remainder with a diagnostic, rather than failing the whole payload.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so a codec can be shared freely with whatever
/// task structure the embedding game uses.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns an encode-side [`ProtocolError`] if the value cannot be
    /// represented in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one value from the front of `data`.
    ///
    /// Trailing bytes beyond the first complete message are tolerated
    /// and logged, not treated as corruption.
    ///
    /// # Errors
    /// Returns a decode-side [`ProtocolError`] if the bytes are
    /// malformed, truncated, or do not match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// BinaryCodec
// ---------------------------------------------------------------------------

/// The compact binary backend: MessagePack with named (map) struct
/// encoding, so field names survive on the wire exactly as the schema
/// requires.
#[cfg(feature = "binary")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

#[cfg(feature = "binary")]
impl Codec for BinaryCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec_named(value).map_err(ProtocolError::EncodeBinary)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        if data.is_empty() {
            return Err(ProtocolError::InvalidMessage("empty payload".into()));
        }
        // Read one message off the front; a slice-level decode would
        // reject buffers that carry residue from chunked delivery.
        let mut de = rmp_serde::Deserializer::new(std::io::Cursor::new(data));
        let value = T::deserialize(&mut de).map_err(ProtocolError::DecodeBinary)?;
        let consumed = de.position() as usize;
        if consumed < data.len() {
            tracing::warn!(
                consumed,
                total = data.len(),
                "binary payload had trailing bytes; decoded leading message"
            );
        }
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// The textual fallback backend. Larger on the wire, readable in logs
/// and browser devtools.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::EncodeJson)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        // A stream deserializer stops after the first complete value,
        // giving the same trailing-bytes tolerance as the binary path.
        let mut stream = serde_json::Deserializer::from_slice(data).into_iter::<T>();
        match stream.next() {
            Some(Ok(value)) => {
                let consumed = stream.byte_offset();
                if consumed < data.len() {
                    tracing::warn!(
                        consumed,
                        total = data.len(),
                        "json payload had trailing bytes; decoded leading message"
                    );
                }
                Ok(value)
            }
            Some(Err(e)) => Err(ProtocolError::DecodeJson(e)),
            None => Err(ProtocolError::InvalidMessage("empty payload".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// AnyCodec
// ---------------------------------------------------------------------------

/// A codec chosen at startup. Callers hold this and never learn which
/// backend is active.
#[derive(Debug, Clone, Copy)]
pub enum AnyCodec {
    /// Compact binary backend.
    #[cfg(feature = "binary")]
    Binary(BinaryCodec),
    /// Textual fallback backend.
    #[cfg(feature = "json")]
    Json(JsonCodec),
}

impl AnyCodec {
    /// Picks the preferred available backend: binary when compiled in,
    /// otherwise the textual fallback.
    pub fn negotiated() -> Self {
        #[cfg(feature = "binary")]
        {
            return Self::Binary(BinaryCodec);
        }
        #[cfg(all(not(feature = "binary"), feature = "json"))]
        {
            Self::Json(JsonCodec)
        }
    }

    /// Human-readable backend name for status lines and logs.
    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "binary")]
            Self::Binary(_) => "binary",
            #[cfg(feature = "json")]
            Self::Json(_) => "json",
        }
    }
}

impl Default for AnyCodec {
    fn default() -> Self {
        Self::negotiated()
    }
}

impl Codec for AnyCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        match self {
            #[cfg(feature = "binary")]
            Self::Binary(c) => c.encode(value),
            #[cfg(feature = "json")]
            Self::Json(c) => c.encode(value),
        }
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        match self {
            #[cfg(feature = "binary")]
            Self::Binary(c) => c.decode(data),
            #[cfg(feature = "json")]
            Self::Json(c) => c.decode(data),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

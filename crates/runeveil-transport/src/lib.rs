//! Peer session abstraction for Runeveil.
//!
//! A Runeveil game talks to its peers through one [`Session`] per remote
//! party. The session is an ordered, reliable, bidirectional message pipe -
//! the same guarantees a WebRTC data channel gives the browser build. How
//! those bytes actually cross the network (data channels, a relay, an
//! in-process pair of queues) is the [`Transport`]'s business; everything
//! above this crate is agnostic.
//!
//! The core runs on a single cooperative loop, so sessions are *polled*,
//! not awaited: each frame the connection manager drains
//! [`Session::poll_event`] until it returns `None`. The only async points
//! are [`Transport::open`] (identity allocation via signaling) and
//! [`Transport::connect`] (dialing a room), each a one-shot future.
//!
//! Ordering is guaranteed per session only. Messages from two different
//! peers may interleave arbitrarily.

#![allow(async_fn_in_trait)]

mod error;
mod memory;

pub use error::TransportError;
pub use memory::{MemoryHub, MemorySession, MemoryTransport};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a connected endpoint, assigned by the transport when
/// the local side opens (signaling allocates it). Unique for the lifetime
/// of a session and never reused within one.
///
/// Newtype over `String` because peer ids travel on the wire and key every
/// registry map in the layers above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    /// Generates a random 16-hex-char peer id (64 bits of entropy).
    pub fn random() -> Self {
        use rand::Rng;
        let bytes: [u8; 8] = rand::rng().random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Something a session reports when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An application message arrived from the remote peer.
    Data(Vec<u8>),
    /// The remote side closed the session (or the link dropped).
    /// Terminal: no `Data` follows a `Closed`.
    Closed,
    /// The session failed. Distinct from `Closed`; the layers above
    /// surface this as a connection error, not a disconnect.
    Error(String),
}

/// One end of a peer-to-peer connection: dials out to a room (member side)
/// or hands out inbound sessions (host side).
pub trait Transport {
    /// The session type produced by this transport.
    type Session: Session;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Allocates a local identity with the signaling layer.
    ///
    /// Must be called before [`connect`](Self::connect) or before
    /// accepting inbound sessions. The returned id doubles as the room id
    /// when this endpoint hosts.
    async fn open(&mut self) -> Result<PeerId, Self::Error>;

    /// Starts accepting inbound sessions under the local identity's room.
    ///
    /// Host side only. Requires a prior successful [`open`](Self::open).
    fn listen(&mut self) -> Result<(), Self::Error>;

    /// Dials the host of `room` and resolves once the session is open.
    async fn connect(&mut self, room: &str) -> Result<Self::Session, Self::Error>;

    /// Polls for the next inbound session (host side). Non-blocking;
    /// returns `None` when no peer is waiting.
    fn poll_accept(&mut self) -> Option<Self::Session>;
}

/// A live session to one remote peer.
///
/// Send is fire-and-forget: delivery is the transport's promise (reliable,
/// in order), and no confirmation is surfaced. Close is idempotent and
/// terminal.
pub trait Session {
    /// The remote peer's identity.
    fn peer_id(&self) -> &PeerId;

    /// Queues `data` for delivery to the remote peer. Silently drops the
    /// payload if the session is already closed.
    fn send(&self, data: &[u8]);

    /// Polls for the next event. Buffered data is always delivered before
    /// the terminal `Closed`, and nothing is reported after it.
    fn poll_event(&mut self) -> Option<SessionEvent>;

    /// Closes the session. Safe to call more than once.
    fn close(&mut self);

    /// Whether the local side still considers the session open.
    fn is_open(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_id_random_is_16_hex_chars() {
        let id = PeerId::random();
        assert_eq!(id.0.len(), 16);
        assert!(id.0.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_peer_id_random_ids_are_unique() {
        let a = PeerId::random();
        let b = PeerId::random();
        assert_ne!(a, b);
    }

    #[test]
    fn test_peer_id_display_is_raw_string() {
        let id = PeerId::from("abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_peer_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(PeerId::from("h"), "host");
        map.insert(PeerId::from("m"), "member");
        assert_eq!(map[&PeerId::from("h")], "host");
    }
}

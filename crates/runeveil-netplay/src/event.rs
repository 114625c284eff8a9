//! Events the manager reports back to the embedding game.

use runeveil_protocol::PlayerColor;
use runeveil_transport::PeerId;

/// Notification severity, for routing to the game's notification UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Something that happened on the network this frame.
///
/// Drained once per frame via [`crate::ConnectionManager::drain_events`];
/// the embedding game turns these into UI and gameplay effects.
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    /// A player joined the session.
    PeerJoined { peer: PeerId, color: PlayerColor },
    /// A player left the session (disconnect, kick, or departure).
    PeerLeft { peer: PeerId },
    /// The host greeted us after accepting the connection.
    Welcome { message: String },
    /// The host started (or had already started) the game.
    GameStarted,
    /// The host left; the session continues solo.
    HostLeft,
    /// The host removed us from the session.
    Kicked,
    /// A player dealt damage to an enemy.
    DamageDealt {
        /// The dealing peer, when attributable (host only).
        peer: Option<PeerId>,
        amount: f32,
        enemy_id: Option<String>,
    },
    /// Experience from a shared kill; `amount` is our local share.
    ExperienceShared { amount: f32 },
    /// An opaque enemy snapshot from the host, to hand to the game.
    EnemyState(Vec<u8>),
    /// A peer's session reported a transport error.
    SessionError { peer: PeerId, message: String },
}

//! Session-level network configuration.

use std::time::Duration;

use runeveil_protocol::PlayerColor;

/// Tunables for a [`crate::ConnectionManager`].
///
/// The defaults match the shipped game: a six-color palette, 10 Hz
/// state broadcast, and a ten second connect timeout.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Colors handed out to players in order, host first.
    pub palette: Vec<PlayerColor>,
    /// Minimum time between two full game-state broadcasts.
    pub broadcast_interval: Duration,
    /// How long a member waits for the host before giving up.
    pub connect_timeout: Duration,
    /// Greeting sent to every newly accepted member.
    pub welcome_message: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            palette: vec![
                PlayerColor(0x4caf50), // green (host)
                PlayerColor(0x2196f3), // blue
                PlayerColor(0xff9800), // orange
                PlayerColor(0x9c27b0), // purple
                PlayerColor(0xf44336), // red
                PlayerColor(0x00bcd4), // cyan
            ],
            broadcast_interval: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(10),
            welcome_message: "Welcome to the party!".to_string(),
        }
    }
}

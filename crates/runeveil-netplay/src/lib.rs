//! Connection management for a Runeveil session.
//!
//! One [`ConnectionManager`] runs per session and owns every peer
//! connection, in one of two roles:
//!
//! ```text
//!            host                              member
//!   +---------------------+          +---------------------+
//!   | ConnectionManager   |          | ConnectionManager   |
//!   |  sessions: m1,m2,.. | <------> |  sessions: host     |
//!   |  colors, inputs     |   wire   |                     |
//!   +---------------------+          +---------------------+
//! ```
//!
//! The host is the authority: it assigns colors, relays gameplay
//! messages between members, and broadcasts the full game state on a
//! throttle. A member holds exactly one session (to the host) and
//! mirrors whatever the host tells it.
//!
//! The manager is polled, not driven by callbacks: the frame loop calls
//! [`ConnectionManager::pump`] to drain incoming messages and then
//! [`ConnectionManager::drain_events`] to collect what happened.

mod colors;
mod config;
mod error;
mod event;
mod manager;

pub use colors::ColorTable;
pub use config::NetConfig;
pub use error::NetError;
pub use event::{NetEvent, Severity};
pub use manager::{ConnState, ConnectionManager};

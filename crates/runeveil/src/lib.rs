//! Runeveil: the multiplayer session layer for a co-op action RPG.
//!
//! The crate stitches the lower layers into one façade the game embeds:
//!
//! ```text
//!   +------------------------------------------------------+
//!   |                 SessionCoordinator                   |
//!   |                                                      |
//!   |  Transport        ConnectionManager       ProxySet   |
//!   |  (signaling,      (roles, relay,          (remote    |
//!   |   sessions)        broadcast)              players)  |
//!   +------------------------+-----------------------------+
//!                            |
//!                       GameHooks
//!                  (the game's callbacks)
//! ```
//!
//! The game calls [`SessionCoordinator::host_game`] or
//! [`SessionCoordinator::join_game`] once, then
//! [`SessionCoordinator::update`] every frame. Everything the network
//! needs from the game, and everything it feeds back, crosses the
//! [`GameHooks`] trait.
//!
//! # Example
//!
//! ```no_run
//! use runeveil::{GameHooks, SessionCoordinator};
//! use runeveil_transport::MemoryHub;
//!
//! # struct MyGame;
//! # impl GameHooks for MyGame {}
//! # async fn run() -> Result<(), runeveil::RuneveilError> {
//! let hub = MemoryHub::default();
//! let mut game = MyGame;
//! let mut session = SessionCoordinator::new(hub.transport());
//! let room = session.host_game().await?;
//! println!("share this code: {room}");
//! loop {
//!     session.update(1.0 / 60.0, &mut game);
//!     # break;
//! }
//! # Ok(())
//! # }
//! ```

mod coordinator;
mod error;
mod hooks;

pub use coordinator::SessionCoordinator;
pub use error::RuneveilError;
pub use hooks::GameHooks;

pub use runeveil_netplay::{ConnState, NetConfig, NetEvent, Severity};
pub use runeveil_protocol::{InputFrame, Message, PlayerColor, PlayerSnapshot};
pub use runeveil_replica::{ProxySet, RemotePlayerProxy};
pub use runeveil_transport::{PeerId, Session, Transport};

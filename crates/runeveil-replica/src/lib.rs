//! Remote entity reconciliation: one local proxy per remote player.
//!
//! Correctness here is deliberately simple; last write wins per peer.
//! Every received sample overwrites the proxy's target transform, and
//! [`ProxySet::tick`] eases the visible transform toward it so remote
//! players glide instead of teleporting between 10 Hz snapshots. The
//! smoothing is presentation only; the target is always exactly the
//! latest sample.
//!
//! The set is mutated by the connection manager in lockstep with its
//! connection registry, so a registered peer always has exactly one proxy
//! and a removed peer loses its proxy in the same handler invocation.

mod proxy;

pub use proxy::{ProxySet, RemotePlayerProxy};

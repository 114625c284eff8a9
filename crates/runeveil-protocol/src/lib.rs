//! Wire protocol for Runeveil's peer-to-peer multiplayer.
//!
//! This crate is the language peers speak:
//!
//! - **Catalogue**: [`Message`], [`PlayerSnapshot`], [`PlayerColor`], and
//!   [`InputFrame`] form the closed set of application messages and their
//!   payload types. On the wire each message is a `[tag, {fields}]` pair
//!   with a frozen integer tag per kind.
//! - **Codecs**: [`Codec`], [`BinaryCodec`], [`JsonCodec`], and
//!   [`AnyCodec`] turn the pair into bytes, compact MessagePack by
//!   preference with JSON as the fallback backend.
//! - **Errors**: [`ProtocolError`] covers what can go wrong on either
//!   path.
//!
//! The protocol layer sits between the transport (opaque byte pipes) and
//! the connection manager (roles, registry, dispatch). It knows nothing
//! about sessions or hosts; only how messages become bytes and back.

mod codec;
mod error;
mod types;

pub use codec::{AnyCodec, Codec};
#[cfg(feature = "binary")]
pub use codec::BinaryCodec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{InputFrame, Message, PlayerColor, PlayerSnapshot};

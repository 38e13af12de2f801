//! Wire-level vocabulary for the imposter game server.
//!
//! This crate defines the pieces every other layer agrees on:
//!
//! - **Identity** ([`GameId`], [`PlayerId`], [`ConnectionId`]): who and
//!   what a message is about.
//! - **Routing** ([`Recipient`]): whether an event goes to one
//!   connection or to everyone in a game.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how commands and
//!   events are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! ```text
//! Transport (frames) → Protocol (bytes ↔ types) → Gateway (commands → sessions)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ConnectionId, GameId, PlayerId, Recipient};

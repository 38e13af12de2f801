//! # Imposter
//!
//! Real-time server for a social-deduction party game. Players join a
//! game by its code, one or more are secretly dealt the imposter prompt,
//! everyone answers, everyone votes, and the round resets.
//!
//! The layers, bottom up:
//!
//! - `imposter-protocol`: ids, recipients, codecs
//! - `imposter-game`: the session state machine and role draw
//! - `imposter-directory`: session storage with per-game locking
//! - this crate: the [`Gateway`] that turns commands into events, and
//!   the WebSocket [`ImposterServer`] in front of it
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imposter::prelude::*;
//!
//! # async fn run() -> Result<(), ImposterError> {
//! let server = ImposterServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod event;
mod gateway;
mod handler;
mod router;
mod server;

pub use config::{ENV_BIND, ENV_CAPACITY, ENV_RETENTION_SECS, ServerConfig};
pub use error::ImposterError;
pub use event::{ClientCommand, ServerEvent};
pub use gateway::{Gateway, Outbound};
pub use router::EventSender;
pub use server::{ImposterServer, ImposterServerBuilder};

/// Everything needed to run a server or drive a gateway in tests.
pub mod prelude {
    pub use crate::{
        ClientCommand, EventSender, Gateway, ImposterError, ImposterServer,
        ImposterServerBuilder, Outbound, ServerConfig, ServerEvent,
    };
    pub use imposter_directory::{
        Directory, DirectoryConfig, DirectoryError, MemoryStore, SessionStore,
    };
    pub use imposter_game::{GameError, GameState, Player, Role, Session};
    pub use imposter_protocol::{
        Codec, ConnectionId, GameId, JsonCodec, PlayerId, Recipient,
    };
}

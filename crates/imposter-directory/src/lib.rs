//! Where game sessions live between commands.
//!
//! The [`Directory`] maps a [`GameId`](imposter_protocol::GameId) to a
//! [`Session`](imposter_game::Session). It hands out collision-free ids,
//! adds players, and runs every mutation as a get → mutate → put critical
//! section under a per-game [`SessionGuard`], so two commands on the same
//! game can never overwrite each other's changes.
//!
//! Storage itself sits behind the [`SessionStore`] trait. [`MemoryStore`]
//! is the in-process implementation on a `moka` cache: idle sessions
//! expire after a retention window and the least-recently-used one is
//! evicted once the store is full.
//!
//! ```text
//! Gateway (above)   ← resolves game ids, issues commands
//!     ↕
//! Directory (this crate)  ← ids, locking, persist-after-mutate
//!     ↕
//! SessionStore      ← expiry + capacity policy
//! ```

mod config;
mod directory;
mod error;
mod id;
mod store;

pub use config::DirectoryConfig;
pub use directory::{Directory, SessionGuard};
pub use error::DirectoryError;
pub use id::generate_game_id;
pub use store::{MemoryStore, SessionStore};

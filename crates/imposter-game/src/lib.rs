//! Game rules for the imposter party game.
//!
//! A [`Session`] is one game: a roster of [`Player`]s, the two prompts,
//! the imposter count, and a [`GameState`] that cycles
//!
//! ```text
//! Lobby → Question → Voting → Results → Lobby → ...
//! ```
//!
//! Nothing here does I/O or locking. The directory crate decides where
//! sessions live and serializes access to them; this crate only says what
//! a valid mutation looks like.
//!
//! # Key types
//!
//! - [`Session`]: roster, prompts, and the `advance` transition
//! - [`GameState`]: lifecycle state with its transition table
//! - [`Player`] / [`Role`]: one participant and their secret role
//! - [`assign_roles`]: the unbiased imposter draw

mod error;
mod player;
mod roles;
mod session;
mod state;

pub use error::GameError;
pub use player::{Player, Role, all_answered, all_voted};
pub use roles::assign_roles;
pub use session::{RoleAssignment, Session};
pub use state::GameState;

//! Error types for the directory layer.

use imposter_game::GameError;
use imposter_protocol::GameId;

/// Errors that can occur while resolving or mutating a session.
///
/// Either way the stored session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// No live session has this id. It was never created, or it expired
    /// or was evicted.
    #[error("game {0} not found")]
    SessionNotFound(GameId),

    /// The session exists but a game rule rejected the mutation.
    #[error(transparent)]
    Game(#[from] GameError),
}

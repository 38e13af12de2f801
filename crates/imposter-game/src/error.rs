//! Error types for game rules.

use imposter_protocol::PlayerId;

use crate::GameState;

/// A rule rejected the requested mutation. The session is unchanged.
///
/// An `advance` whose guard isn't met is *not* an error; it simply
/// returns the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// The player id is not on this session's roster.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The operation is not allowed in the session's current state,
    /// e.g. joining after the question has been shown.
    #[error("cannot {action} while game is in {state}")]
    InvalidState {
        action: &'static str,
        state: GameState,
    },
}

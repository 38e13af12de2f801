//! Session lifecycle state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of a game session.
///
/// The cycle has no terminal state; a session lives until the directory
/// expires it:
///
/// ```text
/// Lobby → Question → Voting → Results ─┐
///   ↑                                  │
///   └──────────── (round reset) ───────┘
/// ```
///
/// - **Lobby**: accepting players. Roles can be (re)dealt.
/// - **Question**: prompts are shown; players submit answers.
/// - **Voting**: players vote for who they think the imposter is.
/// - **Results**: the round is revealed. Advancing resets the round.
///
/// Serialized in upper case (`"LOBBY"`, `"QUESTION"`, ...), which is what
/// clients compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameState {
    #[default]
    Lobby,
    Question,
    Voting,
    Results,
}

impl GameState {
    /// The state that follows this one once its guard is satisfied.
    ///
    /// Guards are evaluated by [`Session::advance`](crate::Session::advance);
    /// this is only the edge table.
    pub fn next(self) -> Self {
        match self {
            Self::Lobby => Self::Question,
            Self::Question => Self::Voting,
            Self::Voting => Self::Results,
            Self::Results => Self::Lobby,
        }
    }

    /// Returns `true` if new players may join.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if a round is underway (prompts dealt, not yet reset).
    pub fn is_in_round(self) -> bool {
        !matches!(self, Self::Lobby)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "LOBBY"),
            Self::Question => write!(f, "QUESTION"),
            Self::Voting => write!(f, "VOTING"),
            Self::Results => write!(f, "RESULTS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_state_next_cycles_back_to_lobby() {
        assert_eq!(GameState::Lobby.next(), GameState::Question);
        assert_eq!(GameState::Question.next(), GameState::Voting);
        assert_eq!(GameState::Voting.next(), GameState::Results);
        assert_eq!(GameState::Results.next(), GameState::Lobby);
    }

    #[test]
    fn test_game_state_default_is_lobby() {
        assert_eq!(GameState::default(), GameState::Lobby);
    }

    #[test]
    fn test_game_state_is_joinable_only_in_lobby() {
        assert!(GameState::Lobby.is_joinable());
        assert!(!GameState::Question.is_joinable());
        assert!(!GameState::Voting.is_joinable());
        assert!(!GameState::Results.is_joinable());
    }

    #[test]
    fn test_game_state_serializes_upper_case() {
        let json = serde_json::to_string(&GameState::Question).unwrap();
        assert_eq!(json, "\"QUESTION\"");
        let state: GameState = serde_json::from_str("\"RESULTS\"").unwrap();
        assert_eq!(state, GameState::Results);
    }

    #[test]
    fn test_game_state_display_matches_wire_name() {
        assert_eq!(GameState::Voting.to_string(), "VOTING");
    }
}

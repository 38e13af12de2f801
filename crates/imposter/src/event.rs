//! Commands clients send and events the server sends back.
//!
//! Both directions use the same envelope:
//!
//! ```json
//! { "event": "join_game", "data": { "game_id": "abc-def-ghi", "name": "Alice" } }
//! ```

use imposter_game::{GameState, Role};
use imposter_protocol::{GameId, PlayerId};
use serde::{Deserialize, Serialize};

fn default_imposters() -> usize {
    1
}

fn default_name() -> String {
    "Player".to_owned()
}

/// A command from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Open a new game. The creator is subscribed to its broadcasts.
    CreateGame {
        #[serde(default = "default_imposters")]
        imposters: usize,
        #[serde(default)]
        innocent_question: String,
        #[serde(default)]
        imposter_question: String,
    },

    /// Join an existing game as a player.
    JoinGame {
        game_id: GameId,
        #[serde(default = "default_name")]
        name: String,
    },

    /// Deal roles and send each player their prompt.
    StartGame { game_id: GameId },

    /// Ask the game to move to its next state.
    PushGameState { game_id: GameId },

    /// Mark a player's answer as in.
    SubmitAnswer { game_id: GameId, player_id: PlayerId },

    /// Mark a player's vote as in.
    SubmitVote { game_id: GameId, player_id: PlayerId },
}

impl ClientCommand {
    /// The wire name of this command, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateGame { .. } => "create_game",
            Self::JoinGame { .. } => "join_game",
            Self::StartGame { .. } => "start_game",
            Self::PushGameState { .. } => "push_game_state",
            Self::SubmitAnswer { .. } => "submit_answer",
            Self::SubmitVote { .. } => "submit_vote",
        }
    }
}

/// An event pushed to one or more clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// To the creator: the new game's shareable id.
    GameCreated { game_id: GameId },

    /// To the joiner only: the id they'll use for later commands.
    JoinedGame { game_id: GameId, player_id: PlayerId },

    /// To the game: someone joined.
    PlayerJoined { player_id: PlayerId, name: String },

    /// To one player only: their secret role and prompt.
    RoleAssigned { role: Role, question: String },

    /// To the game: roles are out.
    GameStarted { imposters: usize },

    /// To the game: the state after an advance attempt, changed or not.
    GameStateUpdated { current_state: GameState },

    /// To the game: a player has answered.
    AnswerSubmitted { player_id: PlayerId },

    /// To the game: a player has voted.
    VoteSubmitted { player_id: PlayerId },

    /// To the requester only: their command failed.
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

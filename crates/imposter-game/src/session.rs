//! A single game session: roster, prompts, and lifecycle.

use std::collections::HashMap;

use imposter_protocol::{ConnectionId, GameId, PlayerId};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{GameError, GameState, Player, Role, all_answered, all_voted, assign_roles};

/// What one player is told when roles are dealt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub player_id: PlayerId,
    pub connection: ConnectionId,
    pub role: Role,
    pub question: String,
}

/// One game instance.
///
/// A session owns its roster outright; two sessions never share a player
/// map. `imposter_count` and both prompts are fixed at creation.
///
/// Sessions are plain values. Mutating one doesn't make the change
/// visible anywhere else until the caller writes it back to the
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: GameId,
    players: HashMap<PlayerId, Player>,
    imposter_count: usize,
    innocent_prompt: String,
    imposter_prompt: String,
    state: GameState,
}

impl Session {
    /// Creates an empty session in `Lobby`.
    ///
    /// `imposter_count` is not checked against the roster here; players
    /// haven't joined yet.
    pub fn new(
        id: GameId,
        imposter_count: usize,
        innocent_prompt: impl Into<String>,
        imposter_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id,
            players: HashMap::new(),
            imposter_count,
            innocent_prompt: innocent_prompt.into(),
            imposter_prompt: imposter_prompt.into(),
            state: GameState::Lobby,
        }
    }

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn imposter_count(&self) -> usize {
        self.imposter_count
    }

    pub fn innocent_prompt(&self) -> &str {
        &self.innocent_prompt
    }

    pub fn imposter_prompt(&self) -> &str {
        &self.imposter_prompt
    }

    /// The prompt shown to a player holding `role`.
    pub fn prompt_for(&self, role: Role) -> &str {
        match role {
            Role::Imposter => &self.imposter_prompt,
            Role::Innocent => &self.innocent_prompt,
        }
    }

    /// Iterates over the roster in no particular order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Adds a new player and returns their freshly minted id.
    ///
    /// # Errors
    /// [`GameError::InvalidState`] unless the session is in `Lobby`.
    pub fn add_player(
        &mut self,
        name: impl Into<String>,
        connection: ConnectionId,
    ) -> Result<PlayerId, GameError> {
        if !self.state.is_joinable() {
            return Err(GameError::InvalidState {
                action: "join",
                state: self.state,
            });
        }

        let player = Player::new(name, connection);
        let id = player.id;
        self.players.insert(id, player);
        Ok(id)
    }

    /// Shuffles the roster and marks `imposter_count` players as imposters.
    ///
    /// This is the raw draw with no state check; see [`Session::start`]
    /// for the guarded version used by the game flow.
    pub fn assign_roles<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        assign_roles(self.players.values_mut(), self.imposter_count, rng)
    }

    /// Deals roles for the next round and returns what each player should
    /// be shown.
    ///
    /// Only allowed in `Lobby`. Calling it again before the round begins
    /// reshuffles; once the question is out, roles are locked until the
    /// round resets. The lifecycle state is left unchanged.
    ///
    /// # Errors
    /// [`GameError::InvalidState`] outside `Lobby`.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Vec<RoleAssignment>, GameError> {
        if self.state.is_in_round() {
            return Err(GameError::InvalidState {
                action: "start",
                state: self.state,
            });
        }

        if self.imposter_count >= self.players.len() {
            tracing::warn!(
                game_id = %self.id,
                imposters = self.imposter_count,
                players = self.players.len(),
                "imposter count does not leave any innocents"
            );
        }

        self.assign_roles(rng);

        Ok(self
            .players
            .values()
            .map(|p| {
                let role = p.role();
                RoleAssignment {
                    player_id: p.id,
                    connection: p.connection,
                    role,
                    question: self.prompt_for(role).to_owned(),
                }
            })
            .collect())
    }

    /// Moves to the next state if the current state's guard allows it,
    /// and returns the resulting state.
    ///
    /// | from     | guard           | to       |
    /// |----------|-----------------|----------|
    /// | Lobby    | none            | Question |
    /// | Question | everyone answered | Voting |
    /// | Voting   | everyone voted  | Results  |
    /// | Results  | none, resets round | Lobby |
    ///
    /// A guard that isn't met leaves the state as it was. Callers must
    /// compare the result rather than assume a transition happened.
    pub fn advance(&mut self) -> GameState {
        let ready = match self.state {
            GameState::Lobby | GameState::Results => true,
            GameState::Question => all_answered(self.players.values()),
            GameState::Voting => all_voted(self.players.values()),
        };

        if !ready {
            tracing::debug!(
                game_id = %self.id,
                state = %self.state,
                "advance guard not met"
            );
            return self.state;
        }

        if self.state == GameState::Results {
            self.new_round();
        }
        self.state = self.state.next();
        self.state
    }

    /// Clears every player's role and submission flags. Players, prompts,
    /// and the imposter count are untouched.
    pub fn new_round(&mut self) {
        for player in self.players.values_mut() {
            player.reset_round();
        }
    }

    /// Records that `player_id` has answered. Repeats are harmless.
    ///
    /// # Errors
    /// - [`GameError::PlayerNotFound`] for an id not on the roster
    /// - [`GameError::InvalidState`] outside `Question`
    pub fn submit_answer(&mut self, player_id: PlayerId) -> Result<(), GameError> {
        let state = self.state;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;
        if state != GameState::Question {
            return Err(GameError::InvalidState { action: "answer", state });
        }
        player.answer_submitted = true;
        Ok(())
    }

    /// Records that `player_id` has voted. Repeats are harmless.
    ///
    /// # Errors
    /// - [`GameError::PlayerNotFound`] for an id not on the roster
    /// - [`GameError::InvalidState`] outside `Voting`
    pub fn submit_vote(&mut self, player_id: PlayerId) -> Result<(), GameError> {
        let state = self.state;
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(GameError::PlayerNotFound(player_id))?;
        if state != GameState::Voting {
            return Err(GameError::InvalidState { action: "vote", state });
        }
        player.vote_submitted = true;
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================

//! Player records and the group predicates evaluated over a roster.

use std::fmt;

use imposter_protocol::{ConnectionId, PlayerId};
use serde::{Deserialize, Serialize};

/// Which prompt a player sees this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Innocent,
    Imposter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Innocent => write!(f, "innocent"),
            Self::Imposter => write!(f, "imposter"),
        }
    }
}

/// One participant in a session.
///
/// `connection` is the transport's handle for this player's private
/// channel. The gateway owns the channel itself; the player just
/// remembers where to send role cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_imposter: bool,
    pub connection: ConnectionId,
    /// Only meaningful during `Question`.
    pub answer_submitted: bool,
    /// Only meaningful during `Voting`.
    pub vote_submitted: bool,
}

impl Player {
    /// A fresh innocent player with no submissions.
    pub fn new(name: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            is_imposter: false,
            connection,
            answer_submitted: false,
            vote_submitted: false,
        }
    }

    pub fn role(&self) -> Role {
        if self.is_imposter {
            Role::Imposter
        } else {
            Role::Innocent
        }
    }

    /// Clears the role and both submission flags.
    pub(crate) fn reset_round(&mut self) {
        self.is_imposter = false;
        self.answer_submitted = false;
        self.vote_submitted = false;
    }
}

/// Returns `true` if every player has submitted an answer.
///
/// Vacuously `true` for an empty roster.
pub fn all_answered<'a>(players: impl IntoIterator<Item = &'a Player>) -> bool {
    players.into_iter().all(|p| p.answer_submitted)
}

/// Returns `true` if every player has voted.
///
/// Vacuously `true` for an empty roster.
pub fn all_voted<'a>(players: impl IntoIterator<Item = &'a Player>) -> bool {
    players.into_iter().all(|p| p.vote_submitted)
}

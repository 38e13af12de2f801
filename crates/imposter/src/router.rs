//! Fan-out of outbound events to connections and game groups.

use std::collections::{HashMap, HashSet};

use imposter_protocol::{ConnectionId, GameId, Recipient};
use tokio::sync::mpsc;

use crate::ServerEvent;

/// Channel for delivering events to one connection's writer task.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Tracks live connections and which game groups each belongs to.
///
/// Not synchronized; the gateway keeps it behind a mutex.
#[derive(Default)]
pub(crate) struct Router {
    senders: HashMap<ConnectionId, EventSender>,
    groups: HashMap<GameId, HashSet<ConnectionId>>,
}

impl Router {
    pub(crate) fn register(&mut self, conn: ConnectionId, sender: EventSender) {
        self.senders.insert(conn, sender);
    }

    /// Forgets a connection and removes it from every group. Groups left
    /// empty are dropped.
    pub(crate) fn unregister(&mut self, conn: ConnectionId) {
        self.senders.remove(&conn);
        self.groups.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }

    pub(crate) fn join_group(&mut self, game_id: GameId, conn: ConnectionId) {
        self.groups.entry(game_id).or_default().insert(conn);
    }

    pub(crate) fn drop_group(&mut self, game_id: &GameId) {
        self.groups.remove(game_id);
    }

    pub(crate) fn group_size(&self, game_id: &GameId) -> usize {
        self.groups.get(game_id).map_or(0, HashSet::len)
    }

    pub(crate) fn connection_count(&self) -> usize {
        self.senders.len()
    }

    /// Delivers an event to its recipient(s).
    pub(crate) fn dispatch(&self, recipient: &Recipient, event: ServerEvent) {
        match recipient {
            Recipient::Connection(conn) => self.send_to(*conn, event),
            Recipient::Group(game_id) => {
                if let Some(members) = self.groups.get(game_id) {
                    for conn in members {
                        self.send_to(*conn, event.clone());
                    }
                }
            }
        }
    }

    /// Sends to a single connection. Silently drops if it's gone.
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(event);
        }
    }
}

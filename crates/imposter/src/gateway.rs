//! Transport-agnostic command handling.
//!
//! The [`Gateway`] turns a [`ClientCommand`] from a connection into
//! directory operations and routes the resulting [`ServerEvent`]s. The
//! WebSocket handler feeds it; tests drive it directly with channels.

use std::sync::Arc;

use imposter_directory::{Directory, DirectoryError, MemoryStore, SessionStore};
use imposter_protocol::{ConnectionId, GameId, Recipient};
use tokio::sync::Mutex;

use crate::router::{EventSender, Router};
use crate::{ClientCommand, ServerEvent};

/// Events produced by one command, each with its destination.
pub type Outbound = Vec<(Recipient, ServerEvent)>;

/// Resolves commands against the directory and fans out the results.
///
/// The directory is injected, so each server (or test) can own its own.
pub struct Gateway<S: SessionStore = MemoryStore> {
    directory: Arc<Directory<S>>,
    router: Mutex<Router>,
}

impl<S: SessionStore> Gateway<S> {
    pub fn new(directory: Arc<Directory<S>>) -> Self {
        Self {
            directory,
            router: Mutex::new(Router::default()),
        }
    }

    pub fn directory(&self) -> &Arc<Directory<S>> {
        &self.directory
    }

    /// Registers a connection's outbound channel.
    pub async fn connect(&self, conn: ConnectionId, sender: EventSender) {
        self.router.lock().await.register(conn, sender);
        tracing::debug!(%conn, "connection registered");
    }

    /// Forgets a connection. Any player it controlled stays on the roster.
    pub async fn disconnect(&self, conn: ConnectionId) {
        self.router.lock().await.unregister(conn);
        tracing::debug!(%conn, "connection unregistered");
    }

    /// Number of connections currently registered.
    pub async fn connection_count(&self) -> usize {
        self.router.lock().await.connection_count()
    }

    /// Number of connections subscribed to a game's broadcasts.
    pub async fn group_size(&self, game_id: &GameId) -> usize {
        self.router.lock().await.group_size(game_id)
    }

    /// Runs a command and delivers its events. Failures go back to `conn`
    /// as an `error` event and nowhere else.
    pub async fn handle(&self, conn: ConnectionId, cmd: ClientCommand) {
        let command = cmd.name();
        if let Err(e) = self.execute(conn, cmd).await {
            tracing::debug!(%conn, command, error = %e, "command rejected");
            self.reply_error(conn, e.to_string()).await;
        }
    }

    /// Sends an `error` event to one connection.
    pub async fn reply_error(&self, conn: ConnectionId, message: impl Into<String>) {
        self.deliver(vec![(Recipient::Connection(conn), ServerEvent::error(message))])
            .await;
    }

    /// Runs a command and delivers the events it produced.
    ///
    /// Commands on an existing game hold that game's guard until their
    /// events are queued, so every connection sees one game's events in
    /// the order its commands were applied.
    ///
    /// # Errors
    /// Whatever the directory reports; nothing was persisted or sent in
    /// that case.
    pub async fn execute(
        &self,
        conn: ConnectionId,
        cmd: ClientCommand,
    ) -> Result<(), DirectoryError> {
        match cmd {
            ClientCommand::CreateGame {
                imposters,
                innocent_question,
                imposter_question,
            } => {
                let game_id = self
                    .directory
                    .create(imposters, innocent_question, imposter_question)
                    .await;
                self.router.lock().await.join_group(game_id.clone(), conn);
                self.deliver(vec![(
                    Recipient::Connection(conn),
                    ServerEvent::GameCreated { game_id },
                )])
                .await;
            }

            ClientCommand::JoinGame { game_id, name } => {
                let mut game = self.directory.lock(&game_id).await?;
                let player_id = game.join(name.clone(), conn).await?;
                self.router.lock().await.join_group(game_id.clone(), conn);
                self.deliver(vec![
                    (
                        Recipient::Connection(conn),
                        ServerEvent::JoinedGame {
                            game_id: game_id.clone(),
                            player_id,
                        },
                    ),
                    (
                        Recipient::Group(game_id),
                        ServerEvent::PlayerJoined { player_id, name },
                    ),
                ])
                .await;
            }

            ClientCommand::StartGame { game_id } => {
                let mut game = self.directory.lock(&game_id).await?;
                let (cards, imposters) = game
                    .update(|session| {
                        let cards = session.start(&mut rand::rng())?;
                        Ok((cards, session.imposter_count()))
                    })
                    .await?;

                tracing::info!(
                    %game_id,
                    players = cards.len(),
                    imposters,
                    "roles assigned"
                );

                let mut outbound: Outbound = cards
                    .into_iter()
                    .map(|card| {
                        (
                            Recipient::Connection(card.connection),
                            ServerEvent::RoleAssigned {
                                role: card.role,
                                question: card.question,
                            },
                        )
                    })
                    .collect();
                outbound.push((
                    Recipient::Group(game_id),
                    ServerEvent::GameStarted { imposters },
                ));
                self.deliver(outbound).await;
            }

            ClientCommand::PushGameState { game_id } => {
                let mut game = self.directory.lock(&game_id).await?;
                let (from, to) = game
                    .update(|session| {
                        let from = session.state();
                        Ok((from, session.advance()))
                    })
                    .await?;

                if from != to {
                    tracing::info!(%game_id, %from, %to, "game state advanced");
                }
                self.deliver(vec![(
                    Recipient::Group(game_id),
                    ServerEvent::GameStateUpdated { current_state: to },
                )])
                .await;
            }

            ClientCommand::SubmitAnswer { game_id, player_id } => {
                let mut game = self.directory.lock(&game_id).await?;
                game.update(|session| session.submit_answer(player_id)).await?;
                self.deliver(vec![(
                    Recipient::Group(game_id),
                    ServerEvent::AnswerSubmitted { player_id },
                )])
                .await;
            }

            ClientCommand::SubmitVote { game_id, player_id } => {
                let mut game = self.directory.lock(&game_id).await?;
                game.update(|session| session.submit_vote(player_id)).await?;
                self.deliver(vec![(
                    Recipient::Group(game_id),
                    ServerEvent::VoteSubmitted { player_id },
                )])
                .await;
            }
        }
        Ok(())
    }

    /// Routes events to their recipients.
    pub async fn deliver(&self, outbound: Outbound) {
        let router = self.router.lock().await;
        for (recipient, event) in outbound {
            router.dispatch(&recipient, event);
        }
    }

    /// Purges games the directory dropped (expired or evicted) and drops
    /// their broadcast groups.
    pub async fn purge_expired(&self) -> Vec<GameId> {
        let expired = self.directory.purge_expired().await;
        if !expired.is_empty() {
            let mut router = self.router.lock().await;
            for game_id in &expired {
                router.drop_group(game_id);
            }
        }
        expired
    }
}

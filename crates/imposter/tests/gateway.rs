//! Scenario tests for the gateway, driven through in-memory channels.

use std::sync::Arc;
use std::time::Duration;

use imposter::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    conn: ConnectionId,
    rx: UnboundedReceiver<ServerEvent>,
}

impl Client {
    /// Everything delivered so far.
    fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

fn gateway() -> Gateway {
    Gateway::new(Arc::new(Directory::default()))
}

async fn client(gw: &Gateway, id: u64) -> Client {
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = ConnectionId::new(id);
    gw.connect(conn, tx).await;
    Client { conn, rx }
}

async fn create(gw: &Gateway, host: &mut Client, imposters: usize) -> GameId {
    gw.handle(
        host.conn,
        ClientCommand::CreateGame {
            imposters,
            innocent_question: "inn?".into(),
            imposter_question: "imp?".into(),
        },
    )
    .await;
    match host.drain().as_slice() {
        [ServerEvent::GameCreated { game_id }] => game_id.clone(),
        other => panic!("expected GameCreated, got {other:?}"),
    }
}

async fn join(gw: &Gateway, player: &mut Client, game_id: &GameId, name: &str) -> PlayerId {
    gw.handle(
        player.conn,
        ClientCommand::JoinGame {
            game_id: game_id.clone(),
            name: name.into(),
        },
    )
    .await;
    player
        .drain()
        .into_iter()
        .find_map(|e| match e {
            ServerEvent::JoinedGame { player_id, .. } => Some(player_id),
            _ => None,
        })
        .expect("joiner should receive JoinedGame")
}

async fn push(gw: &Gateway, conn: ConnectionId, game_id: &GameId) {
    gw.handle(
        conn,
        ClientCommand::PushGameState {
            game_id: game_id.clone(),
        },
    )
    .await;
}

fn role_card(events: &[ServerEvent]) -> (Role, String) {
    events
        .iter()
        .find_map(|e| match e {
            ServerEvent::RoleAssigned { role, question } => Some((*role, question.clone())),
            _ => None,
        })
        .expect("player should receive a role")
}

fn last_state(events: &[ServerEvent]) -> GameState {
    events
        .iter()
        .rev()
        .find_map(|e| match e {
            ServerEvent::GameStateUpdated { current_state } => Some(*current_state),
            _ => None,
        })
        .expect("expected a GameStateUpdated event")
}

fn is_error(events: &[ServerEvent]) -> bool {
    matches!(events, [ServerEvent::Error { .. }])
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_two_players_one_imposter_get_matching_questions() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut alice = client(&gw, 2).await;
    let mut bob = client(&gw, 3).await;

    let game = create(&gw, &mut host, 1).await;
    join(&gw, &mut alice, &game, "Alice").await;
    join(&gw, &mut bob, &game, "Bob").await;
    host.drain();
    alice.drain();

    gw.handle(host.conn, ClientCommand::StartGame { game_id: game.clone() })
        .await;

    let alice_events = alice.drain();
    let bob_events = bob.drain();
    let cards = [role_card(&alice_events), role_card(&bob_events)];

    let imposters: Vec<_> = cards.iter().filter(|(r, _)| *r == Role::Imposter).collect();
    let innocents: Vec<_> = cards.iter().filter(|(r, _)| *r == Role::Innocent).collect();
    assert_eq!(imposters.len(), 1);
    assert_eq!(innocents.len(), 1);
    assert_eq!(imposters[0].1, "imp?");
    assert_eq!(innocents[0].1, "inn?");

    for events in [&alice_events, &bob_events] {
        assert!(events.contains(&ServerEvent::GameStarted { imposters: 1 }));
    }
    // Role cards are private: the host sees the broadcast but no card.
    let host_events = host.drain();
    assert_eq!(host_events, vec![ServerEvent::GameStarted { imposters: 1 }]);
}

#[tokio::test]
async fn test_join_broadcasts_and_privately_returns_player_id() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut alice = client(&gw, 2).await;
    let game = create(&gw, &mut host, 1).await;

    gw.handle(
        alice.conn,
        ClientCommand::JoinGame {
            game_id: game.clone(),
            name: "Alice".into(),
        },
    )
    .await;

    let alice_events = alice.drain();
    let player_id = match alice_events.first() {
        Some(ServerEvent::JoinedGame { game_id, player_id }) => {
            assert_eq!(game_id, &game);
            *player_id
        }
        other => panic!("expected JoinedGame first, got {other:?}"),
    };
    let joined = ServerEvent::PlayerJoined {
        player_id,
        name: "Alice".into(),
    };
    assert!(alice_events.contains(&joined));
    assert_eq!(host.drain(), vec![joined]);
    assert_eq!(gw.group_size(&game).await, 2);
}

#[tokio::test]
async fn test_push_game_state_in_empty_lobby_advances_to_question() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let game = create(&gw, &mut host, 1).await;

    push(&gw, host.conn, &game).await;

    assert_eq!(last_state(&host.drain()), GameState::Question);
}

#[tokio::test]
async fn test_unknown_game_errors_only_to_requester() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut stranger = client(&gw, 2).await;
    let game = create(&gw, &mut host, 1).await;
    let before = gw.directory().get(&game).await.unwrap();
    let missing = GameId::new("not-a-game");

    for cmd in [
        ClientCommand::JoinGame { game_id: missing.clone(), name: "Eve".into() },
        ClientCommand::StartGame { game_id: missing.clone() },
        ClientCommand::PushGameState { game_id: missing.clone() },
    ] {
        gw.handle(stranger.conn, cmd).await;
        let events = stranger.drain();
        match events.as_slice() {
            [ServerEvent::Error { message }] => {
                assert!(message.contains("not found"), "message: {message}")
            }
            other => panic!("expected one error, got {other:?}"),
        }
    }

    assert!(host.drain().is_empty(), "errors must not be broadcast");
    assert_eq!(gw.directory().len().await, 1);
    assert_eq!(gw.directory().get(&game).await.unwrap(), before);
    assert!(!gw.directory().contains(&missing));
}

#[tokio::test]
async fn test_full_round_returns_to_lobby_with_cleared_roles() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut alice = client(&gw, 2).await;
    let mut bob = client(&gw, 3).await;
    let game = create(&gw, &mut host, 1).await;
    let a = join(&gw, &mut alice, &game, "Alice").await;
    let b = join(&gw, &mut bob, &game, "Bob").await;

    gw.handle(host.conn, ClientCommand::StartGame { game_id: game.clone() }).await;
    push(&gw, host.conn, &game).await;
    assert_eq!(last_state(&host.drain()), GameState::Question);

    // Only Alice answered: advancing is a no-op that still reports state.
    gw.handle(alice.conn, ClientCommand::SubmitAnswer { game_id: game.clone(), player_id: a }).await;
    push(&gw, host.conn, &game).await;
    let events = host.drain();
    assert!(events.contains(&ServerEvent::AnswerSubmitted { player_id: a }));
    assert_eq!(last_state(&events), GameState::Question);

    gw.handle(bob.conn, ClientCommand::SubmitAnswer { game_id: game.clone(), player_id: b }).await;
    push(&gw, host.conn, &game).await;
    assert_eq!(last_state(&host.drain()), GameState::Voting);

    for (conn, pid) in [(alice.conn, a), (bob.conn, b)] {
        gw.handle(conn, ClientCommand::SubmitVote { game_id: game.clone(), player_id: pid }).await;
    }
    push(&gw, host.conn, &game).await;
    assert_eq!(last_state(&host.drain()), GameState::Results);

    push(&gw, host.conn, &game).await;
    assert_eq!(last_state(&host.drain()), GameState::Lobby);

    let session = gw.directory().get(&game).await.unwrap();
    assert_eq!(session.player_count(), 2);
    for p in session.players() {
        assert!(!p.is_imposter && !p.answer_submitted && !p.vote_submitted);
    }
}

#[tokio::test]
async fn test_start_after_round_began_is_rejected() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut alice = client(&gw, 2).await;
    let mut bob = client(&gw, 3).await;
    let game = create(&gw, &mut host, 1).await;
    join(&gw, &mut alice, &game, "Alice").await;
    join(&gw, &mut bob, &game, "Bob").await;
    gw.handle(host.conn, ClientCommand::StartGame { game_id: game.clone() }).await;
    push(&gw, host.conn, &game).await;
    host.drain();
    alice.drain();
    bob.drain();
    let before = gw.directory().get(&game).await.unwrap();

    gw.handle(host.conn, ClientCommand::StartGame { game_id: game.clone() }).await;

    assert!(is_error(&host.drain()));
    assert!(alice.drain().is_empty(), "no new role cards");
    assert!(bob.drain().is_empty(), "no new role cards");
    assert_eq!(gw.directory().get(&game).await.unwrap(), before);
}

#[tokio::test]
async fn test_join_mid_round_is_rejected() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut late = client(&gw, 2).await;
    let game = create(&gw, &mut host, 1).await;
    push(&gw, host.conn, &game).await;
    host.drain();

    gw.handle(late.conn, ClientCommand::JoinGame { game_id: game.clone(), name: "Late".into() })
        .await;

    assert!(is_error(&late.drain()));
    assert!(host.drain().is_empty());
    assert_eq!(gw.group_size(&game).await, 1, "rejected joiner is not subscribed");
    assert_eq!(gw.directory().get(&game).await.unwrap().player_count(), 0);
}

#[tokio::test]
async fn test_submit_answer_unknown_player_is_error() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let game = create(&gw, &mut host, 1).await;
    push(&gw, host.conn, &game).await;
    host.drain();

    gw.handle(
        host.conn,
        ClientCommand::SubmitAnswer {
            game_id: game.clone(),
            player_id: PlayerId::new(),
        },
    )
    .await;

    assert!(is_error(&host.drain()));
}

#[tokio::test]
async fn test_disconnect_stops_group_delivery() {
    let gw = gateway();
    let mut host = client(&gw, 1).await;
    let mut alice = client(&gw, 2).await;
    let game = create(&gw, &mut host, 1).await;
    join(&gw, &mut alice, &game, "Alice").await;
    host.drain();

    gw.disconnect(alice.conn).await;
    push(&gw, host.conn, &game).await;

    assert_eq!(last_state(&host.drain()), GameState::Question);
    assert!(alice.drain().is_empty());
    assert_eq!(gw.connection_count().await, 1);
    // The player stays on the roster.
    assert_eq!(gw.directory().get(&game).await.unwrap().player_count(), 1);
}

#[tokio::test]
async fn test_purge_expired_forgets_game_and_group() {
    let gw = Gateway::new(Arc::new(Directory::new(DirectoryConfig {
        retention: Duration::ZERO,
        capacity: 0,
    })));
    let mut host = client(&gw, 1).await;
    let game = create(&gw, &mut host, 1).await;

    let purged = gw.purge_expired().await;

    assert_eq!(purged, vec![game.clone()]);
    assert_eq!(gw.group_size(&game).await, 0);
    push(&gw, host.conn, &game).await;
    assert!(is_error(&host.drain()));
}

#[tokio::test]
async fn test_purge_expired_drops_group_of_evicted_game() {
    let gw = Gateway::new(Arc::new(Directory::new(DirectoryConfig {
        retention: Duration::from_secs(3600),
        capacity: 1,
    })));
    let mut first_host = client(&gw, 1).await;
    let mut second_host = client(&gw, 2).await;
    let first = create(&gw, &mut first_host, 1).await;
    gw.directory().len().await;
    let second = create(&gw, &mut second_host, 1).await;

    let purged = gw.purge_expired().await;

    assert_eq!(purged, vec![first.clone()]);
    assert_eq!(gw.group_size(&first).await, 0);
    assert_eq!(gw.group_size(&second).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_pushes_broadcast_in_commit_order() {
    const PUSHES: usize = 8;

    for _ in 0..50 {
        let gw = Arc::new(gateway());
        let mut host = client(&gw, 1).await;
        let game = create(&gw, &mut host, 1).await;

        let mut tasks = Vec::new();
        for i in 0..PUSHES {
            let gw = Arc::clone(&gw);
            let game = game.clone();
            tasks.push(tokio::spawn(async move {
                push(&gw, ConnectionId::new(100 + i as u64), &game).await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let seen: Vec<GameState> = host
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::GameStateUpdated { current_state } => Some(current_state),
                _ => None,
            })
            .collect();

        // An empty roster passes every guard, so each push moves one step.
        let mut expected = Vec::new();
        let mut state = GameState::Lobby;
        for _ in 0..PUSHES {
            state = state.next();
            expected.push(state);
        }
        assert_eq!(seen, expected);

        let stored = gw.directory().get(&game).await.unwrap().state();
        assert_eq!(seen.last(), Some(&stored), "clients must end on the stored state");
    }
}

//! Tests for concurrent mutation of shared lobby and session documents.

use std::sync::Arc;
use std::thread;

use parlor::{
    DocumentStore, EngineRegistry, GamePlayer, GameState, GameType, LobbyError, LobbyService,
    Mark, MemoryStore, MoveInput, Session, SessionError, SessionService, StatsRepository,
    StatsService, StoreError, TicTacToeState, UserProfile,
};

fn profile(id: &str) -> UserProfile {
    UserProfile {
        user_id: id.to_string(),
        username: id.to_string(),
        display_name: id.to_string(),
        avatar_url: None,
    }
}

fn lobby_service(store: Arc<MemoryStore>) -> LobbyService {
    LobbyService::new(store, Arc::new(EngineRegistry::standard()))
}

#[test]
fn test_concurrent_joins_fill_exactly_one_slot() {
    let store = Arc::new(MemoryStore::new());
    let lobbies = lobby_service(store);
    let lobby = lobbies
        .create_lobby(&profile("alice"), "race".to_string(), GameType::TicTacToe, None)
        .expect("Create failed");

    // One free slot, two racing joiners.
    let handles: Vec<_> = ["bob", "carol"]
        .into_iter()
        .map(|user| {
            let lobbies = lobbies.clone();
            let lobby_id = lobby.id.clone();
            thread::spawn(move || lobbies.join_lobby(&lobby_id, &profile(user)))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, LobbyError::LobbyFull { .. })));

    let lobby = lobbies.get_lobby(&lobby.id).expect("Get failed");
    assert_eq!(lobby.players.len(), 2);
}

#[test]
fn test_concurrent_creates_by_same_user() {
    let store = Arc::new(MemoryStore::new());
    let lobbies = lobby_service(store);

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let lobbies = lobbies.clone();
            thread::spawn(move || {
                lobbies.create_lobby(
                    &profile("alice"),
                    format!("lobby-{i}"),
                    GameType::TicTacToe,
                    None,
                )
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    // The waiting-lobby index admits the user exactly once.
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, LobbyError::AlreadyInLobby { .. })));
    assert_eq!(lobbies.list_lobbies().expect("List failed").len(), 1);
}

#[test]
fn test_stale_version_write_conflicts() {
    let store = Arc::new(MemoryStore::new());
    let lobbies = lobby_service(store.clone());
    let lobby = lobbies
        .create_lobby(&profile("alice"), "cas".to_string(), GameType::TicTacToe, None)
        .expect("Create failed");

    let snapshot = store.get_lobby(&lobby.id).expect("Get failed");

    let mut first = snapshot.doc.clone();
    first.name = "first".to_string();
    store
        .update_lobby(snapshot.version, first)
        .expect("Update failed");

    // A second write against the same read must not clobber the first.
    let mut second = snapshot.doc;
    second.name = "second".to_string();
    let result = store.update_lobby(snapshot.version, second);
    assert_eq!(
        result.unwrap_err(),
        StoreError::Conflict {
            kind: "lobby",
            id: lobby.id.clone(),
        }
    );

    let current = store.get_lobby(&lobby.id).expect("Get failed");
    assert_eq!(current.doc.name, "first");
    assert_eq!(current.version, snapshot.version + 1);
}

#[test]
fn test_session_delete_requires_current_version() {
    let store = MemoryStore::new();
    let players = vec![
        GamePlayer {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            display_name: "alice".to_string(),
            mark: Mark::X,
        },
        GamePlayer {
            user_id: "bob".to_string(),
            username: "bob".to_string(),
            display_name: "bob".to_string(),
            mark: Mark::O,
        },
    ];
    let session = Session::start(
        "lobby-1".to_string(),
        GameType::TicTacToe,
        players,
        "alice".to_string(),
        GameState::TicTacToe(TicTacToeState::new()),
    );
    let created = store.create_session(session).expect("Create failed");

    let result = store.delete_session(&created.doc.id, created.version + 1);
    assert_eq!(
        result.unwrap_err(),
        StoreError::Conflict {
            kind: "session",
            id: created.doc.id.clone(),
        }
    );

    store
        .delete_session(&created.doc.id, created.version)
        .expect("Delete failed");
    assert!(matches!(
        store.get_session(&created.doc.id).unwrap_err(),
        StoreError::NotFound { .. }
    ));
    assert!(matches!(
        store.list_moves(&created.doc.id).unwrap_err(),
        StoreError::NotFound { .. }
    ));
}

#[test]
fn test_concurrent_starts_publish_one_session() {
    let store = Arc::new(MemoryStore::new());
    let lobbies = lobby_service(store);
    let lobby = lobbies
        .create_lobby(&profile("alice"), "race".to_string(), GameType::TicTacToe, None)
        .expect("Create failed");
    lobbies
        .join_lobby(&lobby.id, &profile("bob"))
        .expect("Join failed");
    lobbies
        .toggle_ready(&lobby.id, "bob")
        .expect("Toggle failed");

    // The owner double-clicks start.
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let lobbies = lobbies.clone();
            let lobby_id = lobby.id.clone();
            thread::spawn(move || lobbies.start_game(&lobby_id, "alice", None))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    let successes: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(successes.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, LobbyError::NotWaiting { .. })));

    // The lobby points at the one session that actually exists.
    let lobby = lobbies.get_lobby(&lobby.id).expect("Get failed");
    assert_eq!(lobby.active_session_id.as_deref(), Some(successes[0].id.as_str()));
}

#[test]
fn test_concurrent_moves_apply_exactly_once() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(EngineRegistry::standard());
    let lobbies = LobbyService::new(store.clone(), registry.clone());
    // Never reached: the racing moves are the game's first, far from terminal.
    let stats = StatsService::new(StatsRepository::new(":memory:".to_string()));
    let sessions = SessionService::new(store, registry, lobbies.clone(), stats);

    let lobby = lobbies
        .create_lobby(&profile("alice"), "race".to_string(), GameType::TicTacToe, None)
        .expect("Create failed");
    lobbies
        .join_lobby(&lobby.id, &profile("bob"))
        .expect("Join failed");
    lobbies
        .toggle_ready(&lobby.id, "bob")
        .expect("Toggle failed");
    let session = lobbies
        .start_game(&lobby.id, "alice", None)
        .expect("Start failed");

    // Alice double-submits her turn from two clients.
    let handles: Vec<_> = [0usize, 1]
        .into_iter()
        .map(|position| {
            let sessions = sessions.clone();
            let session_id = session.id.clone();
            thread::spawn(move || {
                sessions.make_move(&session_id, "alice", MoveInput::Position { position })
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, SessionError::NotYourTurn { .. })));

    let session = sessions.get_session(&session.id).expect("Get failed");
    assert_eq!(session.move_count, 1);
    assert_eq!(session.current_player_id, "bob");
    assert_eq!(
        sessions.list_moves(&session.id).expect("List failed").len(),
        1
    );
}

//! In-memory document store with versioned compare-and-swap writes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, instrument};

use crate::lobby::{Lobby, LobbyStatus};
use crate::session::{MoveRecord, Session};

use super::{DocumentStore, StoreError, Versioned};

/// Everything guarded by one lock: the two document collections, the move
/// log, and the waiting-lobby index.
#[derive(Debug, Default)]
struct Inner {
    lobbies: HashMap<String, Versioned<Lobby>>,
    sessions: HashMap<String, Versioned<Session>>,
    moves: HashMap<String, Vec<MoveRecord>>,
    /// user id -> id of the Waiting lobby they belong to.
    waiting_index: HashMap<String, String>,
}

impl Inner {
    /// Rewrites the waiting-lobby index entries for one lobby.
    ///
    /// Members are indexed only while the lobby is Waiting; entries pointing
    /// at the lobby are dropped otherwise.
    fn reindex_lobby(&mut self, lobby: &Lobby) {
        self.waiting_index.retain(|_, v| *v != lobby.id);
        if lobby.status == LobbyStatus::Waiting {
            for player in &lobby.players {
                self.waiting_index
                    .insert(player.user_id.clone(), lobby.id.clone());
            }
        }
    }

    /// Rejects a write that would index a member who is already in a
    /// different Waiting lobby.
    fn check_index(&self, lobby: &Lobby) -> Result<(), StoreError> {
        if lobby.status != LobbyStatus::Waiting {
            return Ok(());
        }
        for player in &lobby.players {
            if let Some(other) = self.waiting_index.get(&player.user_id) {
                if *other != lobby.id {
                    return Err(StoreError::Conflict {
                        kind: "lobby",
                        id: lobby.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// In-memory [`DocumentStore`]. Per-document version counters provide the
/// compare-and-swap primitive; one mutex makes every write atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory document store");
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Mutex poisoning only happens if a holder panicked; propagate.
        self.inner.lock().expect("document store lock poisoned")
    }
}

impl DocumentStore for MemoryStore {
    fn create_lobby(&self, lobby: Lobby) -> Result<Versioned<Lobby>, StoreError> {
        let mut inner = self.lock();
        if inner.lobbies.contains_key(&lobby.id) {
            return Err(StoreError::AlreadyExists {
                kind: "lobby",
                id: lobby.id,
            });
        }
        inner.check_index(&lobby)?;
        inner.reindex_lobby(&lobby);
        let versioned = Versioned {
            version: 1,
            doc: lobby,
        };
        inner
            .lobbies
            .insert(versioned.doc.id.clone(), versioned.clone());
        debug!(lobby_id = %versioned.doc.id, "Lobby document created");
        Ok(versioned)
    }

    fn get_lobby(&self, id: &str) -> Result<Versioned<Lobby>, StoreError> {
        self.lock()
            .lobbies
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "lobby",
                id: id.to_string(),
            })
    }

    fn list_lobbies(&self) -> Result<Vec<Versioned<Lobby>>, StoreError> {
        let inner = self.lock();
        let mut lobbies: Vec<_> = inner.lobbies.values().cloned().collect();
        lobbies.sort_by_key(|v| v.doc.created_at);
        Ok(lobbies)
    }

    fn update_lobby(
        &self,
        expected_version: u64,
        lobby: Lobby,
    ) -> Result<Versioned<Lobby>, StoreError> {
        let mut inner = self.lock();
        let current = inner
            .lobbies
            .get(&lobby.id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "lobby",
                id: lobby.id.clone(),
            })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "lobby",
                id: lobby.id,
            });
        }
        inner.check_index(&lobby)?;
        inner.reindex_lobby(&lobby);
        let versioned = Versioned {
            version: expected_version + 1,
            doc: lobby,
        };
        inner
            .lobbies
            .insert(versioned.doc.id.clone(), versioned.clone());
        debug!(lobby_id = %versioned.doc.id, version = versioned.version, "Lobby document updated");
        Ok(versioned)
    }

    fn delete_lobby(&self, id: &str, expected_version: u64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let current = inner.lobbies.get(id).ok_or_else(|| StoreError::NotFound {
            kind: "lobby",
            id: id.to_string(),
        })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "lobby",
                id: id.to_string(),
            });
        }
        inner.lobbies.remove(id);
        inner.waiting_index.retain(|_, v| v != id);
        debug!(lobby_id = id, "Lobby document deleted");
        Ok(())
    }

    fn waiting_lobby_for_user(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().waiting_index.get(user_id).cloned())
    }

    fn create_session(&self, session: Session) -> Result<Versioned<Session>, StoreError> {
        let mut inner = self.lock();
        if inner.sessions.contains_key(&session.id) {
            return Err(StoreError::AlreadyExists {
                kind: "session",
                id: session.id,
            });
        }
        let versioned = Versioned {
            version: 1,
            doc: session,
        };
        inner
            .sessions
            .insert(versioned.doc.id.clone(), versioned.clone());
        inner.moves.insert(versioned.doc.id.clone(), Vec::new());
        debug!(session_id = %versioned.doc.id, "Session document created");
        Ok(versioned)
    }

    fn get_session(&self, id: &str) -> Result<Versioned<Session>, StoreError> {
        self.lock()
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "session",
                id: id.to_string(),
            })
    }

    fn update_session(
        &self,
        expected_version: u64,
        session: Session,
    ) -> Result<Versioned<Session>, StoreError> {
        let mut inner = self.lock();
        let current = inner
            .sessions
            .get(&session.id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "session",
                id: session.id.clone(),
            })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "session",
                id: session.id,
            });
        }
        let versioned = Versioned {
            version: expected_version + 1,
            doc: session,
        };
        inner
            .sessions
            .insert(versioned.doc.id.clone(), versioned.clone());
        debug!(
            session_id = %versioned.doc.id,
            version = versioned.version,
            "Session document updated"
        );
        Ok(versioned)
    }

    fn delete_session(&self, id: &str, expected_version: u64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let current = inner.sessions.get(id).ok_or_else(|| StoreError::NotFound {
            kind: "session",
            id: id.to_string(),
        })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "session",
                id: id.to_string(),
            });
        }
        inner.sessions.remove(id);
        inner.moves.remove(id);
        debug!(session_id = id, "Session document deleted");
        Ok(())
    }

    fn update_session_with_move(
        &self,
        expected_version: u64,
        session: Session,
        record: MoveRecord,
    ) -> Result<Versioned<Session>, StoreError> {
        let mut inner = self.lock();
        let current = inner
            .sessions
            .get(&session.id)
            .ok_or_else(|| StoreError::NotFound {
                kind: "session",
                id: session.id.clone(),
            })?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                kind: "session",
                id: session.id,
            });
        }
        let versioned = Versioned {
            version: expected_version + 1,
            doc: session,
        };
        inner
            .sessions
            .insert(versioned.doc.id.clone(), versioned.clone());
        inner
            .moves
            .entry(versioned.doc.id.clone())
            .or_default()
            .push(record);
        debug!(
            session_id = %versioned.doc.id,
            version = versioned.version,
            "Session document updated with move"
        );
        Ok(versioned)
    }

    fn list_moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, StoreError> {
        self.lock()
            .moves
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "session",
                id: session_id.to_string(),
            })
    }
}

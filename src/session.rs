//! Session state machine: one active or concluded match instance.
//!
//! A session is created atomically from a lobby's frozen roster, mutated
//! exactly once per accepted move, and terminated either by the rules engine
//! declaring a win or draw or by a participant abandoning. Two concurrent
//! move requests never both apply against the same pre-move state: the
//! versioned write serializes them, and the loser re-reads and fails the
//! turn check.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::games::{
    EngineRegistry, GameError, GamePlayer, GameState, GameType, MoveInput, UserId,
};
use crate::lobby::{LobbyError, LobbyId, LobbyService};
use crate::stats::StatsService;
use crate::store::{DocumentStore, StoreError, Versioned, MAX_TXN_RETRIES};

/// Unique identifier for a session.
pub type SessionId = String;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting moves.
    InProgress,
    /// Terminal: the engine declared a win or draw.
    Completed,
    /// Terminal: a participant abandoned.
    Abandoned,
}

/// One recorded move, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Session the move belongs to.
    pub session_id: SessionId,
    /// 1-based sequence number, gapless within the session.
    pub sequence: u32,
    /// Acting user.
    pub user_id: UserId,
    /// Game-specific payload.
    pub input: MoveInput,
    /// When the move was accepted.
    pub played_at: DateTime<Utc>,
}

/// A match instance derived from a lobby's frozen roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique id.
    pub id: SessionId,
    /// The lobby this session was started from.
    pub lobby_id: LobbyId,
    /// Game being played.
    pub game_type: GameType,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Frozen roster with role markers, in join order.
    pub players: Vec<GamePlayer>,
    /// The user whose turn it is. Meaningful only while InProgress.
    pub current_player_id: UserId,
    /// Engine-owned game state.
    pub state: GameState,
    /// Winning user, or `None` for a draw or abandonment.
    pub winner_id: Option<UserId>,
    /// Number of accepted moves; the next move takes `move_count + 1`.
    pub move_count: u32,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// Termination time, once terminal.
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Builds a fresh InProgress session. Called from the lobby start path.
    pub fn start(
        lobby_id: LobbyId,
        game_type: GameType,
        players: Vec<GamePlayer>,
        current_player_id: UserId,
        state: GameState,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lobby_id,
            game_type,
            status: SessionStatus::InProgress,
            players,
            current_player_id,
            state,
            winner_id: None,
            move_count: 0,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Returns the roster entry for a user, if present.
    pub fn player(&self, user_id: &str) -> Option<&GamePlayer> {
        self.players.iter().find(|p| p.user_id == user_id)
    }
}

/// Session operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum SessionError {
    /// No session exists under the given id.
    #[display("session '{session_id}' not found")]
    NotFound {
        /// The missing id.
        session_id: SessionId,
    },
    /// The session already reached a terminal outcome.
    #[display("session '{session_id}' is not in progress")]
    NotInProgress {
        /// The session id.
        session_id: SessionId,
    },
    /// It is another player's turn.
    #[display("not your turn; waiting for '{current_player_id}'")]
    NotYourTurn {
        /// The user whose move it is.
        current_player_id: UserId,
    },
    /// The caller has no roster entry in the session.
    #[display("user '{user_id}' is not a participant")]
    NotAParticipant {
        /// The caller.
        user_id: UserId,
    },
    /// The rules engine rejected the move.
    #[display("engine error: {_0}")]
    Engine(GameError),
    /// A storage failure, including exhausted optimistic retries.
    #[display("storage error: {_0}")]
    Store(StoreError),
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        Self::Engine(err)
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Service driving session mutations and terminal bookkeeping.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<EngineRegistry>,
    lobbies: LobbyService,
    stats: StatsService,
}

impl SessionService {
    /// Creates a session service.
    #[instrument(skip(store, registry, lobbies, stats))]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<EngineRegistry>,
        lobbies: LobbyService,
        stats: StatsService,
    ) -> Self {
        info!("Creating SessionService");
        Self {
            store,
            registry,
            lobbies,
            stats,
        }
    }

    /// Reads a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn get_session(&self, session_id: &str) -> Result<Session, SessionError> {
        Ok(self.read(session_id)?.doc)
    }

    /// Reads a session's move log in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn list_moves(&self, session_id: &str) -> Result<Vec<MoveRecord>, SessionError> {
        match self.store.list_moves(session_id) {
            Ok(moves) => Ok(moves),
            Err(StoreError::NotFound { .. }) => Err(SessionError::NotFound {
                session_id: session_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Applies one move for the acting user.
    ///
    /// Turn order is enforced against the freshest session snapshot; the
    /// engine validates the payload against its board; the move record is
    /// appended atomically with the session update. If the engine reports a
    /// terminal outcome the session completes, stats are recorded, and the
    /// originating lobby resets to Waiting.
    ///
    /// # Errors
    ///
    /// Returns the failed precondition or the engine's rejection; nothing is
    /// mutated on failure.
    #[instrument(skip(self))]
    pub fn make_move(
        &self,
        session_id: &str,
        user_id: &str,
        input: MoveInput,
    ) -> Result<Session, SessionError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned {
                version,
                doc: mut session,
            } = self.read(session_id)?;

            if session.status != SessionStatus::InProgress {
                return Err(SessionError::NotInProgress {
                    session_id: session_id.to_string(),
                });
            }
            if session.player(user_id).is_none() {
                return Err(SessionError::NotAParticipant {
                    user_id: user_id.to_string(),
                });
            }
            if session.current_player_id != user_id {
                return Err(SessionError::NotYourTurn {
                    current_player_id: session.current_player_id.clone(),
                });
            }

            let engine = self.registry.engine(session.game_type)?;
            let next_state = engine.validate_and_apply_move(
                &session.state,
                &input,
                user_id,
                &session.players,
            )?;

            session.move_count += 1;
            let record = MoveRecord {
                session_id: session.id.clone(),
                sequence: session.move_count,
                user_id: user_id.to_string(),
                input,
                played_at: Utc::now(),
            };

            let terminal = next_state.game_over();
            if terminal {
                session.status = SessionStatus::Completed;
                session.winner_id = next_state.winner().and_then(|mark| {
                    session
                        .players
                        .iter()
                        .find(|p| p.mark == mark)
                        .map(|p| p.user_id.clone())
                });
                session.ended_at = Some(Utc::now());
            } else {
                session.current_player_id = engine.next_player_id(user_id, &session.players)?;
            }
            session.state = next_state;

            match self.store.update_session_with_move(version, session, record) {
                Ok(v) => {
                    info!(
                        session_id,
                        user_id,
                        sequence = v.doc.move_count,
                        terminal,
                        "Move applied"
                    );
                    if terminal {
                        self.finish(&v.doc);
                    }
                    return Ok(v.doc);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(session_id, attempt, "Move conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(session_id))
    }

    /// Abandons the session on behalf of a participant. Immediate, not
    /// time-delayed.
    ///
    /// Every roster member, including the abandoning user, gets only a
    /// played increment; nobody is charged a loss. The originating lobby
    /// resets to Waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotInProgress`] for a concluded session or
    /// [`SessionError::NotAParticipant`] for outsiders.
    #[instrument(skip(self))]
    pub fn abandon(&self, session_id: &str, user_id: &str) -> Result<Session, SessionError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned {
                version,
                doc: mut session,
            } = self.read(session_id)?;

            if session.status != SessionStatus::InProgress {
                return Err(SessionError::NotInProgress {
                    session_id: session_id.to_string(),
                });
            }
            if session.player(user_id).is_none() {
                return Err(SessionError::NotAParticipant {
                    user_id: user_id.to_string(),
                });
            }

            session.status = SessionStatus::Abandoned;
            session.winner_id = None;
            session.ended_at = Some(Utc::now());

            match self.store.update_session(version, session) {
                Ok(v) => {
                    info!(session_id, user_id, "Session abandoned");
                    if let Err(e) = self
                        .stats
                        .record_abandonment(&v.doc.players, v.doc.game_type)
                    {
                        warn!(session_id, error = %e, "Failed to record abandonment stats");
                    }
                    self.reset_lobby(&v.doc.lobby_id);
                    return Ok(v.doc);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(session_id, attempt, "Abandon conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(session_id))
    }

    /// Terminal bookkeeping after a completed session: stats, lobby reset.
    ///
    /// Failures here are logged, never rolled back; the terminal transition
    /// has already committed.
    fn finish(&self, session: &Session) {
        if let Err(e) = self.stats.record_completion(
            &session.players,
            session.winner_id.as_deref(),
            session.game_type,
        ) {
            warn!(session_id = %session.id, error = %e, "Failed to record completion stats");
        }
        self.reset_lobby(&session.lobby_id);
    }

    /// Signals the originating lobby to return to Waiting.
    fn reset_lobby(&self, lobby_id: &str) {
        match self.lobbies.reset_after_session(lobby_id) {
            Ok(_) => {}
            Err(LobbyError::NotFound { .. }) => {
                warn!(lobby_id, "Originating lobby no longer exists");
            }
            Err(e) => warn!(lobby_id, error = %e, "Failed to reset lobby"),
        }
    }

    /// Reads a versioned session, mapping a missing id to
    /// [`SessionError::NotFound`].
    fn read(&self, session_id: &str) -> Result<Versioned<Session>, SessionError> {
        match self.store.get_session(session_id) {
            Ok(v) => Ok(v),
            Err(StoreError::NotFound { .. }) => Err(SessionError::NotFound {
                session_id: session_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Error surfaced when optimistic retries run out.
    fn exhausted(&self, session_id: &str) -> SessionError {
        warn!(
            session_id,
            retries = MAX_TXN_RETRIES,
            "Session transaction retries exhausted"
        );
        SessionError::Store(StoreError::Conflict {
            kind: "session",
            id: session_id.to_string(),
        })
    }
}

//! Lobby state machine: pre-game player assembly.
//!
//! A lobby moves Waiting → InGame when a session starts, returns to Waiting
//! when the session terminates (enabling rematches with the same roster), and
//! ceases to exist when its owner or last player leaves. Every mutation runs
//! as an optimistic read-modify-write transaction against the document store
//! so concurrent requests never interleave partial updates of the player
//! list.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::games::{
    EngineRegistry, GameError, GameType, RosterEntry, UserId,
};
use crate::identity::UserProfile;
use crate::session::{Session, SessionId};
use crate::store::{DocumentStore, StoreError, Versioned, MAX_TXN_RETRIES};

/// Unique identifier for a lobby.
pub type LobbyId = String;

/// Lifecycle status of a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyStatus {
    /// Assembling players; the player set may change.
    Waiting,
    /// A session is running; the player set is frozen.
    InGame,
    /// Retired; kept only for completeness, never mutated.
    Finished,
}

/// One member of a lobby, ordered by join time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyPlayer {
    /// Stable user id.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Display name shown to other players.
    pub display_name: String,
    /// Whether the player has readied up.
    pub ready: bool,
    /// When the player joined.
    pub joined_at: DateTime<Utc>,
}

/// A pre-game assembly of players under one game type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    /// Opaque unique id.
    pub id: LobbyId,
    /// Display name.
    pub name: String,
    /// The creating user; always a member.
    pub owner_id: UserId,
    /// Game the lobby will play.
    pub game_type: GameType,
    /// Configured player capacity.
    pub max_players: usize,
    /// Lifecycle status.
    pub status: LobbyStatus,
    /// Members in join order.
    pub players: Vec<LobbyPlayer>,
    /// Session currently running from this lobby, if any.
    pub active_session_id: Option<SessionId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Lobby {
    /// Returns the member entry for a user, if present.
    pub fn player(&self, user_id: &str) -> Option<&LobbyPlayer> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    /// Whether the user has a player entry in this lobby.
    pub fn has_player(&self, user_id: &str) -> bool {
        self.player(user_id).is_some()
    }

    /// The frozen roster handed to a rules engine at session start.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.players
            .iter()
            .map(|p| RosterEntry {
                user_id: p.user_id.clone(),
                username: p.username.clone(),
                display_name: p.display_name.clone(),
            })
            .collect()
    }
}

/// Start predicate a game type may substitute for the default policy.
pub type StartPredicate = fn(&Lobby) -> Result<(), LobbyError>;

/// Per-game-type lobby policy.
///
/// Both shipped games use the defaults: two players, ready system on, owner
/// auto-ready, no custom start predicate.
#[derive(Clone, Copy)]
pub struct GameTypeConfig {
    /// Minimum roster size to start.
    pub min_players: usize,
    /// Largest capacity a lobby for this game may configure.
    pub max_players: usize,
    /// Whether the game uses the ready system at all.
    pub uses_ready: bool,
    /// Whether the owner counts as ready without toggling.
    pub owner_auto_ready: bool,
    /// Custom start predicate overriding the default policy.
    pub start_override: Option<StartPredicate>,
}

impl GameTypeConfig {
    /// Returns the lobby policy for a game type.
    pub fn for_game(game_type: GameType) -> Self {
        match game_type {
            GameType::TicTacToe | GameType::ConnectFour => Self {
                min_players: 2,
                max_players: 2,
                uses_ready: true,
                owner_auto_ready: true,
                start_override: None,
            },
        }
    }

    /// Evaluates the start preconditions against a lobby snapshot.
    ///
    /// Default policy: roster size at least `min_players` and every
    /// non-exempt player ready. The owner is exempt when `owner_auto_ready`
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns the precondition that failed.
    pub fn can_start(&self, lobby: &Lobby) -> Result<(), LobbyError> {
        if let Some(predicate) = self.start_override {
            return predicate(lobby);
        }
        if lobby.players.len() < self.min_players {
            return Err(LobbyError::NotEnoughPlayers {
                minimum: self.min_players,
                actual: lobby.players.len(),
            });
        }
        if self.uses_ready {
            let all_ready = lobby.players.iter().all(|p| {
                p.ready || (self.owner_auto_ready && p.user_id == lobby.owner_id)
            });
            if !all_ready {
                return Err(LobbyError::PlayersNotReady);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GameTypeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameTypeConfig")
            .field("min_players", &self.min_players)
            .field("max_players", &self.max_players)
            .field("uses_ready", &self.uses_ready)
            .field("owner_auto_ready", &self.owner_auto_ready)
            .field("start_override", &self.start_override.is_some())
            .finish()
    }
}

/// Lobby operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum LobbyError {
    /// No lobby exists under the given id.
    #[display("lobby '{lobby_id}' not found")]
    NotFound {
        /// The missing id.
        lobby_id: LobbyId,
    },
    /// The lobby is not accepting mutations of its player set.
    #[display("lobby '{lobby_id}' is not waiting for players")]
    NotWaiting {
        /// The lobby id.
        lobby_id: LobbyId,
    },
    /// The lobby is at configured capacity.
    #[display("lobby '{lobby_id}' is full ({max_players} players)")]
    LobbyFull {
        /// The lobby id.
        lobby_id: LobbyId,
        /// Configured capacity.
        max_players: usize,
    },
    /// The user already has a player entry in this or another Waiting lobby.
    #[display("user '{user_id}' is already in a waiting lobby")]
    AlreadyInLobby {
        /// The user.
        user_id: UserId,
    },
    /// The user has no player entry in the lobby.
    #[display("user '{user_id}' is not a member of this lobby")]
    NotAMember {
        /// The user.
        user_id: UserId,
    },
    /// The action is gated on lobby ownership.
    #[display("user '{user_id}' is not the lobby owner")]
    NotOwner {
        /// The user.
        user_id: UserId,
    },
    /// The game type has no ready system.
    #[display("game '{game_type}' does not use a ready system")]
    ReadyNotSupported {
        /// The lobby's game type.
        game_type: GameType,
    },
    /// The owner is always ready under this game's configuration.
    #[display("the lobby owner is always ready and cannot toggle")]
    OwnerAlwaysReady,
    /// Too few players to start.
    #[display("need at least {minimum} players to start, have {actual}")]
    NotEnoughPlayers {
        /// Required minimum.
        minimum: usize,
        /// Current roster size.
        actual: usize,
    },
    /// A non-exempt player has not readied up.
    #[display("not all players are ready")]
    PlayersNotReady,
    /// Requested capacity is outside the game's allowed range.
    #[display("max players {requested} outside allowed range {minimum}..={maximum}")]
    InvalidMaxPlayers {
        /// Requested capacity.
        requested: usize,
        /// Smallest allowed capacity.
        minimum: usize,
        /// Largest allowed capacity.
        maximum: usize,
    },
    /// A rules-engine failure during session creation.
    #[display("engine error: {_0}")]
    Engine(GameError),
    /// A storage failure, including exhausted optimistic retries.
    #[display("storage error: {_0}")]
    Store(StoreError),
}

impl From<GameError> for LobbyError {
    fn from(err: GameError) -> Self {
        Self::Engine(err)
    }
}

impl From<StoreError> for LobbyError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Result of an operation that removes players and may delete the lobby.
#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    /// The owner or every player departed; the lobby was deleted.
    Deleted,
    /// Departed player entries were removed; the lobby persists.
    Left(Lobby),
}

/// Service driving every lobby mutation as an atomic read-modify-write.
#[derive(Clone)]
pub struct LobbyService {
    store: Arc<dyn DocumentStore>,
    registry: Arc<EngineRegistry>,
}

impl LobbyService {
    /// Creates a lobby service over the given store and engine registry.
    #[instrument(skip(store, registry))]
    pub fn new(store: Arc<dyn DocumentStore>, registry: Arc<EngineRegistry>) -> Self {
        info!("Creating LobbyService");
        Self { store, registry }
    }

    /// Reads a lobby.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::NotFound`] for an unknown id.
    #[instrument(skip(self))]
    pub fn get_lobby(&self, lobby_id: &str) -> Result<Lobby, LobbyError> {
        Ok(self.read(lobby_id)?.doc)
    }

    /// Lists every lobby, ordered by creation time.
    ///
    /// # Errors
    ///
    /// Returns a [`LobbyError::Store`] on a storage failure.
    #[instrument(skip(self))]
    pub fn list_lobbies(&self) -> Result<Vec<Lobby>, LobbyError> {
        let lobbies = self.store.list_lobbies()?;
        debug!(count = lobbies.len(), "Lobbies listed");
        Ok(lobbies.into_iter().map(|v| v.doc).collect())
    }

    /// Creates a lobby with the caller as owner and sole initial player.
    ///
    /// The owner starts ready when the game's configuration marks the owner
    /// auto-ready.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::AlreadyInLobby`] if the caller is already in a
    /// Waiting lobby, or [`LobbyError::InvalidMaxPlayers`] for a capacity
    /// outside the game's allowed range.
    #[instrument(skip(self, owner), fields(owner_id = %owner.user_id, game_type = %game_type))]
    pub fn create_lobby(
        &self,
        owner: &UserProfile,
        name: String,
        game_type: GameType,
        max_players: Option<usize>,
    ) -> Result<Lobby, LobbyError> {
        let config = GameTypeConfig::for_game(game_type);
        let max_players = max_players.unwrap_or(config.max_players);
        if max_players < config.min_players || max_players > config.max_players {
            return Err(LobbyError::InvalidMaxPlayers {
                requested: max_players,
                minimum: config.min_players,
                maximum: config.max_players,
            });
        }

        if self.store.waiting_lobby_for_user(&owner.user_id)?.is_some() {
            warn!(user_id = %owner.user_id, "User already in a waiting lobby");
            return Err(LobbyError::AlreadyInLobby {
                user_id: owner.user_id.clone(),
            });
        }

        let now = Utc::now();
        let lobby = Lobby {
            id: Uuid::new_v4().to_string(),
            name,
            owner_id: owner.user_id.clone(),
            game_type,
            max_players,
            status: LobbyStatus::Waiting,
            players: vec![LobbyPlayer {
                user_id: owner.user_id.clone(),
                username: owner.username.clone(),
                display_name: owner.display_name.clone(),
                ready: config.owner_auto_ready,
                joined_at: now,
            }],
            active_session_id: None,
            created_at: now,
        };

        let created = match self.store.create_lobby(lobby) {
            Ok(v) => v,
            // The index rejected the owner: they joined another lobby between
            // our check and the write.
            Err(StoreError::Conflict { .. }) => {
                return Err(LobbyError::AlreadyInLobby {
                    user_id: owner.user_id.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        info!(lobby_id = %created.doc.id, "Lobby created");
        Ok(created.doc)
    }

    /// Adds the caller to a Waiting lobby, un-ready.
    ///
    /// # Errors
    ///
    /// Returns the precondition that failed: not Waiting, at capacity, or the
    /// user already in this or another Waiting lobby.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub fn join_lobby(&self, lobby_id: &str, user: &UserProfile) -> Result<Lobby, LobbyError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned { version, doc: mut lobby } = self.read(lobby_id)?;

            if lobby.status != LobbyStatus::Waiting {
                return Err(LobbyError::NotWaiting {
                    lobby_id: lobby_id.to_string(),
                });
            }
            if lobby.has_player(&user.user_id) {
                return Err(LobbyError::AlreadyInLobby {
                    user_id: user.user_id.clone(),
                });
            }
            if lobby.players.len() >= lobby.max_players {
                return Err(LobbyError::LobbyFull {
                    lobby_id: lobby_id.to_string(),
                    max_players: lobby.max_players,
                });
            }
            if self.store.waiting_lobby_for_user(&user.user_id)?.is_some() {
                return Err(LobbyError::AlreadyInLobby {
                    user_id: user.user_id.clone(),
                });
            }

            lobby.players.push(LobbyPlayer {
                user_id: user.user_id.clone(),
                username: user.username.clone(),
                display_name: user.display_name.clone(),
                ready: false,
                joined_at: Utc::now(),
            });

            match self.store.update_lobby(version, lobby) {
                Ok(v) => {
                    info!(lobby_id, user_id = %user.user_id, "Player joined lobby");
                    return Ok(v.doc);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(lobby_id, attempt, "Join conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(lobby_id))
    }

    /// Removes the caller from a Waiting lobby.
    ///
    /// If the caller owns the lobby or is the last remaining player, the
    /// lobby is deleted in its entirety.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::NotWaiting`] while a session runs, or
    /// [`LobbyError::NotAMember`] if the caller has no entry.
    #[instrument(skip(self))]
    pub fn leave_lobby(&self, lobby_id: &str, user_id: &str) -> Result<LeaveOutcome, LobbyError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned { version, doc: mut lobby } = self.read(lobby_id)?;

            if lobby.status != LobbyStatus::Waiting {
                return Err(LobbyError::NotWaiting {
                    lobby_id: lobby_id.to_string(),
                });
            }
            if !lobby.has_player(user_id) {
                return Err(LobbyError::NotAMember {
                    user_id: user_id.to_string(),
                });
            }

            if user_id == lobby.owner_id || lobby.players.len() == 1 {
                match self.store.delete_lobby(lobby_id, version) {
                    Ok(()) => {
                        info!(lobby_id, user_id, "Lobby deleted on leave");
                        return Ok(LeaveOutcome::Deleted);
                    }
                    Err(StoreError::Conflict { .. }) => {
                        debug!(lobby_id, attempt, "Delete conflicted, retrying");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            lobby.players.retain(|p| p.user_id != user_id);
            match self.store.update_lobby(version, lobby) {
                Ok(v) => {
                    info!(lobby_id, user_id, "Player left lobby");
                    return Ok(LeaveOutcome::Left(v.doc));
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(lobby_id, attempt, "Leave conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(lobby_id))
    }

    /// Flips the caller's ready flag.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::ReadyNotSupported`] if the game has no ready
    /// system, or [`LobbyError::OwnerAlwaysReady`] when the owner is exempt
    /// from toggling.
    #[instrument(skip(self))]
    pub fn toggle_ready(&self, lobby_id: &str, user_id: &str) -> Result<Lobby, LobbyError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned { version, doc: mut lobby } = self.read(lobby_id)?;

            if lobby.status != LobbyStatus::Waiting {
                return Err(LobbyError::NotWaiting {
                    lobby_id: lobby_id.to_string(),
                });
            }
            let config = GameTypeConfig::for_game(lobby.game_type);
            if !config.uses_ready {
                return Err(LobbyError::ReadyNotSupported {
                    game_type: lobby.game_type,
                });
            }
            if user_id == lobby.owner_id && config.owner_auto_ready {
                return Err(LobbyError::OwnerAlwaysReady);
            }
            let Some(player) = lobby.players.iter_mut().find(|p| p.user_id == user_id) else {
                return Err(LobbyError::NotAMember {
                    user_id: user_id.to_string(),
                });
            };
            player.ready = !player.ready;
            let ready = player.ready;

            match self.store.update_lobby(version, lobby) {
                Ok(v) => {
                    info!(lobby_id, user_id, ready, "Ready flag toggled");
                    return Ok(v.doc);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(lobby_id, attempt, "Toggle conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(lobby_id))
    }

    /// Switches a Waiting lobby to another game type. Owner only.
    ///
    /// Non-owner ready flags reset because readiness was given for a
    /// different game; capacity resets to the new game's maximum.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::NotOwner`] for non-owners, or
    /// [`LobbyError::LobbyFull`] if the current roster exceeds the new
    /// game's capacity.
    #[instrument(skip(self))]
    pub fn change_game_type(
        &self,
        lobby_id: &str,
        user_id: &str,
        game_type: GameType,
    ) -> Result<Lobby, LobbyError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned { version, doc: mut lobby } = self.read(lobby_id)?;

            if lobby.status != LobbyStatus::Waiting {
                return Err(LobbyError::NotWaiting {
                    lobby_id: lobby_id.to_string(),
                });
            }
            if user_id != lobby.owner_id {
                return Err(LobbyError::NotOwner {
                    user_id: user_id.to_string(),
                });
            }
            let config = GameTypeConfig::for_game(game_type);
            if lobby.players.len() > config.max_players {
                return Err(LobbyError::LobbyFull {
                    lobby_id: lobby_id.to_string(),
                    max_players: config.max_players,
                });
            }

            lobby.game_type = game_type;
            lobby.max_players = config.max_players;
            for player in &mut lobby.players {
                player.ready = player.user_id == lobby.owner_id && config.owner_auto_ready;
            }

            match self.store.update_lobby(version, lobby) {
                Ok(v) => {
                    info!(lobby_id, game_type = %game_type, "Game type changed");
                    return Ok(v.doc);
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(lobby_id, attempt, "Game-type change conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(lobby_id))
    }

    /// Starts a session from the lobby's frozen roster. Owner only.
    ///
    /// On success the lobby transitions to InGame and keeps existing so it
    /// can reset to Waiting for a rematch when the session ends.
    ///
    /// # Errors
    ///
    /// Returns the failed start precondition, or an engine error if the
    /// roster does not satisfy the game's requirements.
    #[instrument(skip(self), fields(lobby_id, user_id))]
    pub fn start_game(
        &self,
        lobby_id: &str,
        user_id: &str,
        starting_player: Option<&str>,
    ) -> Result<Session, LobbyError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned { version, doc: mut lobby } = self.read(lobby_id)?;

            if user_id != lobby.owner_id {
                return Err(LobbyError::NotOwner {
                    user_id: user_id.to_string(),
                });
            }
            if lobby.status != LobbyStatus::Waiting {
                return Err(LobbyError::NotWaiting {
                    lobby_id: lobby_id.to_string(),
                });
            }
            let config = GameTypeConfig::for_game(lobby.game_type);
            config.can_start(&lobby)?;

            let engine = self.registry.engine(lobby.game_type)?;
            let game_players = engine.create_game_players(&lobby.roster())?;
            let state = engine.create_initial_state(&game_players)?;

            let current_player_id = match starting_player {
                Some(id) => {
                    if !game_players.iter().any(|p| p.user_id == id) {
                        return Err(LobbyError::NotAMember {
                            user_id: id.to_string(),
                        });
                    }
                    id.to_string()
                }
                None => game_players[0].user_id.clone(),
            };

            let session = Session::start(
                lobby.id.clone(),
                lobby.game_type,
                game_players,
                current_player_id,
                state,
            );

            // The session document goes in first so the lobby never points
            // at an id that does not resolve. Its id is unpublished until
            // the lobby write lands, so it can be deleted on a conflict.
            let created = self.store.create_session(session)?;

            lobby.status = LobbyStatus::InGame;
            lobby.active_session_id = Some(created.doc.id.clone());

            match self.store.update_lobby(version, lobby) {
                Ok(_) => {
                    info!(
                        lobby_id,
                        session_id = %created.doc.id,
                        "Session started from lobby"
                    );
                    return Ok(created.doc);
                }
                Err(StoreError::Conflict { .. }) => {
                    self.store.delete_session(&created.doc.id, created.version)?;
                    debug!(lobby_id, attempt, "Start conflicted, retrying");
                    continue;
                }
                Err(e) => {
                    self.store.delete_session(&created.doc.id, created.version)?;
                    return Err(e.into());
                }
            }
        }
        Err(self.exhausted(lobby_id))
    }

    /// Resets a lobby to Waiting after its session terminated.
    ///
    /// Members who joined another Waiting lobby while the game ran are
    /// dropped from the roster rather than pulled back; they hold their new
    /// membership. If the owner moved on, or everyone did, the lobby is
    /// deleted instead of reset. Remaining non-owner ready flags clear so a
    /// rematch requires fresh readiness.
    ///
    /// # Errors
    ///
    /// Returns [`LobbyError::NotFound`] if the lobby vanished, or a storage
    /// error after exhausted retries.
    #[instrument(skip(self))]
    pub fn reset_after_session(&self, lobby_id: &str) -> Result<LeaveOutcome, LobbyError> {
        for attempt in 0..MAX_TXN_RETRIES {
            let Versioned { version, doc: mut lobby } = self.read(lobby_id)?;

            let mut departed = Vec::new();
            for player in &lobby.players {
                if let Some(other) = self.store.waiting_lobby_for_user(&player.user_id)? {
                    if other != lobby.id {
                        departed.push(player.user_id.clone());
                    }
                }
            }

            if departed.contains(&lobby.owner_id) || departed.len() == lobby.players.len() {
                match self.store.delete_lobby(lobby_id, version) {
                    Ok(()) => {
                        info!(lobby_id, "Lobby deleted on reset, roster moved on");
                        return Ok(LeaveOutcome::Deleted);
                    }
                    Err(StoreError::Conflict { .. }) => {
                        debug!(lobby_id, attempt, "Reset delete conflicted, retrying");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            lobby.players.retain(|p| !departed.contains(&p.user_id));
            let config = GameTypeConfig::for_game(lobby.game_type);
            lobby.status = LobbyStatus::Waiting;
            lobby.active_session_id = None;
            for player in &mut lobby.players {
                player.ready = player.user_id == lobby.owner_id && config.owner_auto_ready;
            }

            match self.store.update_lobby(version, lobby) {
                Ok(v) => {
                    info!(lobby_id, dropped = departed.len(), "Lobby reset to waiting");
                    return Ok(LeaveOutcome::Left(v.doc));
                }
                Err(StoreError::Conflict { .. }) => {
                    debug!(lobby_id, attempt, "Reset conflicted, retrying");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(self.exhausted(lobby_id))
    }

    /// Reads a versioned lobby, mapping a missing id to [`LobbyError::NotFound`].
    fn read(&self, lobby_id: &str) -> Result<Versioned<Lobby>, LobbyError> {
        match self.store.get_lobby(lobby_id) {
            Ok(v) => Ok(v),
            Err(StoreError::NotFound { .. }) => Err(LobbyError::NotFound {
                lobby_id: lobby_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Error surfaced when optimistic retries run out.
    fn exhausted(&self, lobby_id: &str) -> LobbyError {
        warn!(lobby_id, retries = MAX_TXN_RETRIES, "Lobby transaction retries exhausted");
        LobbyError::Store(StoreError::Conflict {
            kind: "lobby",
            id: lobby_id.to_string(),
        })
    }
}

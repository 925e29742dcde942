//! Parlor library - turn-based multiplayer match management.
//!
//! # Architecture
//!
//! - **Games**: pure, pluggable rules engines (tic-tac-toe, connect four)
//!   behind the [`RulesEngine`] trait, wired up once in [`EngineRegistry`]
//! - **Lobby**: pre-game player assembly with owner-gated start
//! - **Session**: an active match with turn-ordered move validation
//! - **Stats**: per-user, per-game-type counters over SQLite
//! - **Store**: versioned document storage with compare-and-swap writes
//! - **Http**: thin axum surface over the services
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use parlor::{
//!     EngineRegistry, LobbyService, MemoryStore, SessionService, StatsRepository, StatsService,
//! };
//!
//! let registry = Arc::new(EngineRegistry::standard());
//! let store = Arc::new(MemoryStore::new());
//! let stats = StatsService::new(StatsRepository::new(":memory:".to_string()));
//! let lobbies = LobbyService::new(store.clone(), registry.clone());
//! let sessions = SessionService::new(store, registry, lobbies.clone(), stats);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod db;
mod games;
mod http;
mod identity;
mod lobby;
mod session;
mod stats;
mod store;

// Crate-level exports - Rules engines
pub use games::{
    ConnectFourEngine, ConnectFourState, EngineRegistry, GameError, GamePlayer, GameState,
    GameType, Mark, MoveInput, RosterEntry, RulesEngine, TicTacToeEngine, TicTacToeState, UserId,
    COLS, ROWS,
};

// Crate-level exports - Lobby state machine
pub use lobby::{
    GameTypeConfig, LeaveOutcome, Lobby, LobbyError, LobbyId, LobbyPlayer, LobbyService,
    LobbyStatus, StartPredicate,
};

// Crate-level exports - Session state machine
pub use session::{
    MoveRecord, Session, SessionError, SessionId, SessionService, SessionStatus,
};

// Crate-level exports - Stats aggregation
pub use stats::{StatsService, StatsSummary};

// Crate-level exports - Stats store
pub use db::{DbError, NewPlayerStat, PlayerStat, StatDelta, StatsRepository};

// Crate-level exports - Document store
pub use store::{DocumentStore, MemoryStore, StoreError, Versioned, MAX_TXN_RETRIES};

// Crate-level exports - Identity
pub use identity::{AuthError, DevIdentity, IdentityProvider, UserProfile};

// Crate-level exports - HTTP surface
pub use http::{
    router, ApiError, AppState, ChangeGameTypeRequest, CreateLobbyRequest, PlayerStatView,
    StartGameRequest,
};

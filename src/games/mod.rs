//! Game-type abstraction: pluggable rules engines and their shared types.
//!
//! A [`RulesEngine`] is a pure function set over its arguments: it holds no
//! state between calls and never touches lobbies or storage. New games plug
//! in by implementing the trait and registering in [`EngineRegistry`].

mod connect_four;
mod registry;
mod tictactoe;

pub use connect_four::{ConnectFourEngine, ConnectFourState, COLS, ROWS};
pub use registry::EngineRegistry;
pub use tictactoe::{TicTacToeEngine, TicTacToeState};

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Unique identifier for a user, resolved by the identity provider.
pub type UserId = String;

/// Tag identifying which rules engine governs a lobby or session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameType {
    /// 3×3 tic-tac-toe.
    TicTacToe,
    /// 7×6 connect four.
    ConnectFour,
}

/// Role marker bound to a roster entry. The first joiner always receives
/// [`Mark::X`] and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// First-mover marker.
    X,
    /// Second-mover marker.
    O,
}

/// Display info for one lobby member handed to an engine at session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Stable user id.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Display name shown to other players.
    pub display_name: String,
}

/// A session participant with their game-specific role marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamePlayer {
    /// Stable user id.
    pub user_id: UserId,
    /// Account username.
    pub username: String,
    /// Display name shown to other players.
    pub display_name: String,
    /// Role marker assigned in join order.
    pub mark: Mark,
}

/// Game-specific move payload supplied by the acting player.
///
/// The two shipped games use disjoint field names, so the payload is
/// self-describing without a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MoveInput {
    /// Cell index for grid placement games (tic-tac-toe).
    Position {
        /// Flat board index, 0-based row-major.
        position: usize,
    },
    /// Column index for drop games (connect four).
    Column {
        /// Column index, 0-based left to right.
        column: usize,
    },
}

/// Game state tagged by game type.
///
/// Consumers outside an engine only read the terminal flags; narrowing to a
/// concrete variant fails loudly on a tag mismatch rather than duck-typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameState {
    /// Tic-tac-toe board and terminal flags.
    TicTacToe(TicTacToeState),
    /// Connect-four board and terminal flags.
    ConnectFour(ConnectFourState),
}

impl GameState {
    /// Returns the game-type tag of this state.
    pub fn game_type(&self) -> GameType {
        match self {
            Self::TicTacToe(_) => GameType::TicTacToe,
            Self::ConnectFour(_) => GameType::ConnectFour,
        }
    }

    /// Whether the game has reached a terminal outcome.
    pub fn game_over(&self) -> bool {
        match self {
            Self::TicTacToe(s) => s.game_over,
            Self::ConnectFour(s) => s.game_over,
        }
    }

    /// The winning role marker, if any.
    pub fn winner(&self) -> Option<Mark> {
        match self {
            Self::TicTacToe(s) => s.winner,
            Self::ConnectFour(s) => s.winner,
        }
    }

    /// Whether the game ended with every cell filled and no winner.
    pub fn is_draw(&self) -> bool {
        match self {
            Self::TicTacToe(s) => s.is_draw,
            Self::ConnectFour(s) => s.is_draw,
        }
    }

    /// Narrows to the tic-tac-toe variant.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StateMismatch`] if the state belongs to a
    /// different game.
    pub fn as_tictactoe(&self) -> Result<&TicTacToeState, GameError> {
        match self {
            Self::TicTacToe(s) => Ok(s),
            other => Err(GameError::StateMismatch {
                expected: GameType::TicTacToe,
                actual: other.game_type(),
            }),
        }
    }

    /// Narrows to the connect-four variant.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::StateMismatch`] if the state belongs to a
    /// different game.
    pub fn as_connect_four(&self) -> Result<&ConnectFourState, GameError> {
        match self {
            Self::ConnectFour(s) => Ok(s),
            other => Err(GameError::StateMismatch {
                expected: GameType::ConnectFour,
                actual: other.game_type(),
            }),
        }
    }
}

/// Errors produced by rules engines and the engine registry.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// Roster size does not match the game's fixed player count.
    #[display("game requires exactly {expected} players, got {actual}")]
    InvalidPlayerCount {
        /// Required player count.
        expected: usize,
        /// Supplied player count.
        actual: usize,
    },
    /// No engine is registered for the requested game type.
    #[display("unsupported game type '{game_type}'")]
    UnsupportedGameType {
        /// The unregistered tag.
        game_type: GameType,
    },
    /// Move payload shape does not match the game.
    #[display("move payload does not match game '{game_type}'")]
    MalformedMove {
        /// Game the payload was submitted to.
        game_type: GameType,
    },
    /// Target index lies outside the legal range.
    #[display("index {index} out of range (limit {limit})")]
    OutOfRange {
        /// Supplied index.
        index: usize,
        /// Exclusive upper bound.
        limit: usize,
    },
    /// Target cell is already occupied.
    #[display("position {position} is already taken")]
    PositionTaken {
        /// The occupied cell index.
        position: usize,
    },
    /// Every row slot in the target column is occupied.
    #[display("column {column} is full")]
    ColumnFull {
        /// The full column index.
        column: usize,
    },
    /// The state already carries a terminal outcome.
    #[display("game is already over")]
    GameOver,
    /// Acting user has no role marker in the roster.
    #[display("user '{user_id}' is not a player in this game")]
    NotAPlayer {
        /// The acting user.
        user_id: UserId,
    },
    /// A state value was narrowed to the wrong game variant.
    #[display("expected {expected} state, got {actual}")]
    StateMismatch {
        /// Variant the caller asked for.
        expected: GameType,
        /// Variant actually held.
        actual: GameType,
    },
}

/// Pure rule set for one game type.
///
/// Engines are deterministic: identical `(state, input, players)` arguments
/// produce identical results, and no call mutates its inputs.
pub trait RulesEngine: Send + Sync {
    /// The tag this engine is registered under.
    fn game_type(&self) -> GameType;

    /// Fixed roster size the game requires.
    fn required_player_count(&self) -> usize;

    /// Assigns role markers to roster entries in join order.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPlayerCount`] if the roster size does not
    /// match [`Self::required_player_count`].
    fn create_game_players(&self, roster: &[RosterEntry]) -> Result<Vec<GamePlayer>, GameError> {
        assign_marks(roster, self.required_player_count())
    }

    /// Builds the empty starting state for the given players.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidPlayerCount`] if the player count is wrong.
    fn create_initial_state(&self, players: &[GamePlayer]) -> Result<GameState, GameError>;

    /// Validates a move against the current state and, if legal, returns the
    /// new state after applying it and scanning for a terminal outcome.
    ///
    /// Never mutates `state`; a rejected move leaves everything untouched.
    ///
    /// # Errors
    ///
    /// Returns a validation or precondition [`GameError`] describing why the
    /// move was rejected.
    fn validate_and_apply_move(
        &self,
        state: &GameState,
        input: &MoveInput,
        acting_user: &str,
        players: &[GamePlayer],
    ) -> Result<GameState, GameError>;

    /// Returns the user whose turn follows `current_user`.
    ///
    /// The default is strict round-robin over the roster in join order. An
    /// engine may override this with other turn-order logic.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::NotAPlayer`] if `current_user` has no roster
    /// entry.
    fn next_player_id(
        &self,
        current_user: &str,
        players: &[GamePlayer],
    ) -> Result<UserId, GameError> {
        let position = players
            .iter()
            .position(|p| p.user_id == current_user)
            .ok_or_else(|| GameError::NotAPlayer {
                user_id: current_user.to_string(),
            })?;
        Ok(players[(position + 1) % players.len()].user_id.clone())
    }
}

/// Assigns marks in join order: first entry X, second entry O.
///
/// Both shipped games are two-player, so two marks suffice.
fn assign_marks(roster: &[RosterEntry], required: usize) -> Result<Vec<GamePlayer>, GameError> {
    if roster.len() != required {
        return Err(GameError::InvalidPlayerCount {
            expected: required,
            actual: roster.len(),
        });
    }
    Ok(roster
        .iter()
        .zip([Mark::X, Mark::O])
        .map(|(entry, mark)| GamePlayer {
            user_id: entry.user_id.clone(),
            username: entry.username.clone(),
            display_name: entry.display_name.clone(),
            mark,
        })
        .collect())
}

/// Looks up the mark held by `user_id`, rejecting non-members.
fn mark_of(players: &[GamePlayer], user_id: &str) -> Result<Mark, GameError> {
    players
        .iter()
        .find(|p| p.user_id == user_id)
        .map(|p| p.mark)
        .ok_or_else(|| GameError::NotAPlayer {
            user_id: user_id.to_string(),
        })
}

//! Tic-tac-toe rules engine: 3×3 board, eight canonical winning lines.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{mark_of, GameError, GamePlayer, GameState, GameType, Mark, MoveInput, RulesEngine};

/// Number of cells on the board.
const CELLS: usize = 9;

/// The eight canonical lines: three rows, three columns, two diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-tac-toe board and terminal flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicTacToeState {
    /// Cells in row-major order, `None` when empty.
    pub cells: Vec<Option<Mark>>,
    /// True once a win or draw has been detected.
    pub game_over: bool,
    /// Winning mark, if any.
    pub winner: Option<Mark>,
    /// True when the board filled with no winner.
    pub is_draw: bool,
}

impl TicTacToeState {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: vec![None; CELLS],
            game_over: false,
            winner: None,
            is_draw: false,
        }
    }

    /// Scans the eight lines for three identical non-empty marks.
    fn scan_winner(&self) -> Option<Mark> {
        for [a, b, c] in LINES {
            if let Some(mark) = self.cells[a] {
                if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) {
                    return Some(mark);
                }
            }
        }
        None
    }
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rules engine for tic-tac-toe.
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToeEngine;

impl RulesEngine for TicTacToeEngine {
    fn game_type(&self) -> GameType {
        GameType::TicTacToe
    }

    fn required_player_count(&self) -> usize {
        2
    }

    #[instrument(skip(self, players))]
    fn create_initial_state(&self, players: &[GamePlayer]) -> Result<GameState, GameError> {
        if players.len() != self.required_player_count() {
            return Err(GameError::InvalidPlayerCount {
                expected: self.required_player_count(),
                actual: players.len(),
            });
        }
        Ok(GameState::TicTacToe(TicTacToeState::new()))
    }

    #[instrument(skip(self, state, players), fields(acting_user))]
    fn validate_and_apply_move(
        &self,
        state: &GameState,
        input: &MoveInput,
        acting_user: &str,
        players: &[GamePlayer],
    ) -> Result<GameState, GameError> {
        let board = state.as_tictactoe()?;
        let position = match input {
            MoveInput::Position { position } => *position,
            MoveInput::Column { .. } => {
                return Err(GameError::MalformedMove {
                    game_type: GameType::TicTacToe,
                })
            }
        };

        if board.game_over {
            return Err(GameError::GameOver);
        }
        if position >= CELLS {
            return Err(GameError::OutOfRange {
                index: position,
                limit: CELLS,
            });
        }
        if board.cells[position].is_some() {
            return Err(GameError::PositionTaken { position });
        }
        let mark = mark_of(players, acting_user)?;

        let mut next = board.clone();
        next.cells[position] = Some(mark);

        if let Some(winner) = next.scan_winner() {
            next.game_over = true;
            next.winner = Some(winner);
        } else if next.cells.iter().all(|c| c.is_some()) {
            next.game_over = true;
            next.is_draw = true;
        }

        Ok(GameState::TicTacToe(next))
    }
}

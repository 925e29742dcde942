//! Connect-four rules engine: 7×6 board with gravity and 4-in-a-row scan.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{mark_of, GameError, GamePlayer, GameState, GameType, Mark, MoveInput, RulesEngine};

/// Number of columns on the board.
pub const COLS: usize = 7;

/// Number of rows on the board.
pub const ROWS: usize = 6;

/// Connect-four board and terminal flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectFourState {
    /// Cells in row-major order (index = row * 7 + col), `None` when empty.
    /// Row 0 is the top of the board; pieces land on the highest-index
    /// empty row of their column.
    pub cells: Vec<Option<Mark>>,
    /// True once a win or draw has been detected.
    pub game_over: bool,
    /// Winning mark, if any.
    pub winner: Option<Mark>,
    /// True when the board filled with no winner.
    pub is_draw: bool,
}

impl ConnectFourState {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            cells: vec![None; COLS * ROWS],
            game_over: false,
            winner: None,
            is_draw: false,
        }
    }

    /// Returns the cell at (row, col).
    fn at(&self, row: usize, col: usize) -> Option<Mark> {
        self.cells[row * COLS + col]
    }

    /// Finds the landing row for a drop: the lowest empty row in the column,
    /// scanning from the bottom upward. `None` means the column is full.
    fn landing_row(&self, col: usize) -> Option<usize> {
        (0..ROWS).rev().find(|&row| self.at(row, col).is_none())
    }

    /// Scans every occupied cell for a 4-in-a-row run extending right, down,
    /// down-right, or down-left, bounded by the board edges.
    fn scan_winner(&self) -> Option<Mark> {
        const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        for row in 0..ROWS {
            for col in 0..COLS {
                let Some(mark) = self.at(row, col) else {
                    continue;
                };
                for (dr, dc) in DIRECTIONS {
                    let end_row = row as isize + 3 * dr;
                    let end_col = col as isize + 3 * dc;
                    if end_row >= ROWS as isize || end_col < 0 || end_col >= COLS as isize {
                        continue;
                    }
                    let run = (1..4).all(|step| {
                        let r = (row as isize + step * dr) as usize;
                        let c = (col as isize + step * dc) as usize;
                        self.at(r, c) == Some(mark)
                    });
                    if run {
                        return Some(mark);
                    }
                }
            }
        }
        None
    }
}

impl Default for ConnectFourState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rules engine for connect four.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectFourEngine;

impl RulesEngine for ConnectFourEngine {
    fn game_type(&self) -> GameType {
        GameType::ConnectFour
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
        Ok(GameState::ConnectFour(ConnectFourState::new()))
    }

    #[instrument(skip(self, state, players), fields(acting_user))]
    fn validate_and_apply_move(
        &self,
        state: &GameState,
        input: &MoveInput,
        acting_user: &str,
        players: &[GamePlayer],
    ) -> Result<GameState, GameError> {
        let board = state.as_connect_four()?;
        let column = match input {
            MoveInput::Column { column } => *column,
            MoveInput::Position { .. } => {
                return Err(GameError::MalformedMove {
                    game_type: GameType::ConnectFour,
                })
            }
        };

        if board.game_over {
            return Err(GameError::GameOver);
        }
        if column >= COLS {
            return Err(GameError::OutOfRange {
                index: column,
                limit: COLS,
            });
        }
        let row = board
            .landing_row(column)
            .ok_or(GameError::ColumnFull { column })?;
        let mark = mark_of(players, acting_user)?;

        let mut next = board.clone();
        next.cells[row * COLS + column] = Some(mark);

        if let Some(winner) = next.scan_winner() {
            next.game_over = true;
            next.winner = Some(winner);
        } else if next.cells.iter().all(|c| c.is_some()) {
            next.game_over = true;
            next.is_draw = true;
        }

        Ok(GameState::ConnectFour(next))
    }
}

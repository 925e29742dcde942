//! Tests for the connect-four rules engine.

use parlor::{
    ConnectFourEngine, ConnectFourState, GameError, GamePlayer, GameState, GameType, Mark,
    MoveInput, RosterEntry, RulesEngine, COLS, ROWS,
};

fn roster() -> Vec<RosterEntry> {
    ["alice", "bob"]
        .iter()
        .map(|id| RosterEntry {
            user_id: id.to_string(),
            username: id.to_string(),
            display_name: id.to_string(),
        })
        .collect()
}

fn players() -> Vec<GamePlayer> {
    ConnectFourEngine
        .create_game_players(&roster())
        .expect("Player creation failed")
}

fn column(column: usize) -> MoveInput {
    MoveInput::Column { column }
}

/// Drops a scripted sequence of columns, alternating alice then bob.
fn play(drops: &[usize]) -> GameState {
    let players = players();
    let mut state = ConnectFourEngine
        .create_initial_state(&players)
        .expect("Initial state failed");
    for (i, &col) in drops.iter().enumerate() {
        let actor = &players[i % 2].user_id;
        state = ConnectFourEngine
            .validate_and_apply_move(&state, &column(col), actor, &players)
            .expect("Drop rejected");
    }
    state
}

#[test]
fn test_initial_state_is_empty() {
    let state = play(&[]);
    let board = state.as_connect_four().expect("Wrong variant");
    assert_eq!(board.cells.len(), COLS * ROWS);
    assert!(board.cells.iter().all(|c| c.is_none()));
    assert!(!board.game_over);
}

#[test]
fn test_piece_lands_on_bottom_row() {
    let state = play(&[3]);
    let board = state.as_connect_four().expect("Wrong variant");
    assert_eq!(board.cells[5 * COLS + 3], Some(Mark::X));
    assert!(board.cells[4 * COLS + 3].is_none());
}

#[test]
fn test_pieces_stack_upward() {
    let state = play(&[3, 3, 3]);
    let board = state.as_connect_four().expect("Wrong variant");
    assert_eq!(board.cells[5 * COLS + 3], Some(Mark::X));
    assert_eq!(board.cells[4 * COLS + 3], Some(Mark::O));
    assert_eq!(board.cells[3 * COLS + 3], Some(Mark::X));
}

#[test]
fn test_seventh_drop_into_column_rejected() {
    let players = players();
    // Six alternating drops fill column 3 without a win.
    let state = play(&[3, 3, 3, 3, 3, 3]);
    let result = ConnectFourEngine.validate_and_apply_move(&state, &column(3), "alice", &players);
    assert_eq!(result.unwrap_err(), GameError::ColumnFull { column: 3 });
}

#[test]
fn test_out_of_range_column_rejected() {
    let players = players();
    let state = play(&[]);
    let result = ConnectFourEngine.validate_and_apply_move(&state, &column(7), "alice", &players);
    assert_eq!(
        result.unwrap_err(),
        GameError::OutOfRange { index: 7, limit: 7 }
    );
}

#[test]
fn test_horizontal_win() {
    // X drops across the bottom row while O stacks in column 6.
    let state = play(&[0, 6, 1, 6, 2, 6, 3]);
    assert!(state.game_over());
    assert_eq!(state.winner(), Some(Mark::X));
    assert!(!state.is_draw());
}

#[test]
fn test_vertical_win() {
    let state = play(&[0, 1, 0, 1, 0, 1, 0]);
    assert_eq!(state.winner(), Some(Mark::X));
}

#[test]
fn test_second_mover_win() {
    // X wastes a drop in column 6 and O completes a horizontal run.
    let state = play(&[6, 0, 6, 1, 5, 2, 5, 3]);
    assert_eq!(state.winner(), Some(Mark::O));
}

/// Builds a board where X at (3,1), (4,2), (5,3) awaits a drop into column 0
/// to complete a down-right diagonal from (2,0).
fn diagonal_setup() -> ConnectFourState {
    let mut board = ConnectFourState::new();
    let mut put = |row: usize, col: usize, mark: Mark| {
        board.cells[row * COLS + col] = Some(mark);
    };
    put(3, 1, Mark::X);
    put(4, 2, Mark::X);
    put(5, 3, Mark::X);
    // Supports under the diagonal plus the column 0 stack the drop lands on.
    put(5, 0, Mark::O);
    put(4, 0, Mark::O);
    put(3, 0, Mark::O);
    put(4, 1, Mark::O);
    put(5, 1, Mark::O);
    put(5, 2, Mark::O);
    board
}

#[test]
fn test_diagonal_win() {
    let players = players();
    let state = GameState::ConnectFour(diagonal_setup());
    let state = ConnectFourEngine
        .validate_and_apply_move(&state, &column(0), "alice", &players)
        .expect("Drop rejected");
    let board = state.as_connect_four().expect("Wrong variant");
    assert_eq!(board.cells[2 * COLS], Some(Mark::X));
    assert!(board.game_over);
    assert_eq!(board.winner, Some(Mark::X));
}

#[test]
fn test_move_after_game_over_rejected() {
    let players = players();
    let state = play(&[0, 1, 0, 1, 0, 1, 0]);
    let result = ConnectFourEngine.validate_and_apply_move(&state, &column(2), "bob", &players);
    assert_eq!(result.unwrap_err(), GameError::GameOver);
}

#[test]
fn test_position_payload_rejected() {
    let players = players();
    let state = play(&[]);
    let result = ConnectFourEngine.validate_and_apply_move(
        &state,
        &MoveInput::Position { position: 0 },
        "alice",
        &players,
    );
    assert_eq!(
        result.unwrap_err(),
        GameError::MalformedMove {
            game_type: GameType::ConnectFour
        }
    );
}

#[test]
fn test_non_player_rejected() {
    let players = players();
    let state = play(&[]);
    let result = ConnectFourEngine.validate_and_apply_move(&state, &column(0), "mallory", &players);
    assert!(matches!(result.unwrap_err(), GameError::NotAPlayer { .. }));
}

#[test]
fn test_state_mismatch_on_wrong_variant() {
    let players = players();
    let state = parlor::TicTacToeEngine
        .create_initial_state(&players)
        .expect("Initial state failed");
    let result = ConnectFourEngine.validate_and_apply_move(&state, &column(0), "alice", &players);
    assert_eq!(
        result.unwrap_err(),
        GameError::StateMismatch {
            expected: GameType::ConnectFour,
            actual: GameType::TicTacToe,
        }
    );
}

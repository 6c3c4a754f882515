use super::*;

/// Play columns alternately starting with the first player.
fn play(columns: &[usize]) -> State {
    let game = Connect4::new();
    let mut state = game.initial_state();
    let mut player = Player::One;
    for &col in columns {
        state = game.next_state(&state, col, player);
        player = player.opponent();
    }
    state
}

#[test]
fn test_initial_state() {
    let state = State::new();
    assert_eq!(state.board, [0; BOARD_SIZE]);
    assert_eq!(state.column_heights, [0; COLS]);
    assert!(!state.is_full());
}

#[test]
fn test_valid_moves() {
    let game = Connect4::new();
    let state = game.initial_state();
    assert_eq!(game.valid_moves(&state), vec![true; COLS]);

    // After one move all columns remain available
    let state = game.next_state(&state, 3, Player::One);
    assert_eq!(state.legal_moves().len(), COLS);
}

#[test]
fn test_drop_piece() {
    let state = State::new().drop_piece(3, Player::One);

    // Piece should be at bottom of column 3
    assert_eq!(state.board[State::pos(3, 0)], 1);
    assert_eq!(state.column_height(3), 1);

    let state = state.drop_piece(3, Player::Two);
    assert_eq!(state.board[State::pos(3, 1)], -1);
    assert_eq!(state.column_height(3), 2);
}

#[test]
fn test_stacking_and_full_column() {
    let mut state = State::new();
    for i in 0..ROWS {
        state = state.drop_piece(0, if i % 2 == 0 { Player::One } else { Player::Two });
        assert_eq!(state.column_height(0), i + 1);
    }

    let game = Connect4::new();
    assert!(!game.valid_moves(&state)[0]);
    assert!(!state.legal_moves().contains(&0));

    // Dropping into a full column leaves the board unchanged
    assert_eq!(state.drop_piece(0, Player::One), state);
}

#[test]
fn test_horizontal_win() {
    // Red: 0, 1, 2, 3 (bottom row); Yellow stacks on 0, 1, 2
    let state = play(&[0, 0, 1, 1, 2, 2, 3]);
    let (value, done) = Connect4::new().value_and_terminated(&state, Some(3));
    assert!(done);
    assert_eq!(value, 1.0);
}

#[test]
fn test_vertical_win() {
    let state = play(&[0, 1, 0, 1, 0, 1, 0]);
    assert!(state.check_win(0));
    assert!(!state.check_win(1));
}

#[test]
fn test_diagonal_wins() {
    // Rising diagonal (0,0) (1,1) (2,2) (3,3) for Red
    let rising = play(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);
    assert!(rising.check_win(3));

    // Falling diagonal (3,0) (2,1) (1,2) (0,3) for Red
    let falling = play(&[3, 2, 2, 1, 1, 0, 1, 0, 0, 6, 0]);
    assert!(falling.check_win(0));
}

#[test]
fn test_no_win_in_progress() {
    let state = play(&[3, 3, 4]);
    let (value, done) = Connect4::new().value_and_terminated(&state, Some(4));
    assert!(!done);
    assert_eq!(value, 0.0);
}

#[test]
fn test_change_perspective() {
    let game = Connect4::new();
    let state = play(&[3, 4]);
    let flipped = game.change_perspective(&state, Player::Two);

    assert_eq!(flipped.board[State::pos(3, 0)], -1);
    assert_eq!(flipped.board[State::pos(4, 0)], 1);
    assert_eq!(flipped.column_heights, state.column_heights);
    assert_eq!(game.change_perspective(&state, Player::One), state);
}

#[test]
fn test_observation_encoding() {
    let game = Connect4::new();
    let state = play(&[3, 4]);
    let obs = game.encode(&state);

    assert_eq!(obs.len(), 3 * BOARD_SIZE);
    assert_eq!(obs[State::pos(4, 0)], 1.0); // opponent plane
    assert_eq!(obs[2 * BOARD_SIZE + State::pos(3, 0)], 1.0); // own plane
    assert_eq!(obs[BOARD_SIZE + State::pos(0, 0)], 1.0); // empty plane
    let total: f32 = obs.iter().sum();
    assert_eq!(total, BOARD_SIZE as f32);
}

#[test]
fn test_draw_on_full_board() {
    // Column order that fills the board without four in a row:
    // pairs of columns filled in alternating blocks.
    let mut columns = Vec::new();
    for &(a, b) in &[(0, 1), (2, 3), (4, 5)] {
        for _ in 0..3 {
            columns.extend_from_slice(&[a, b]);
        }
        for _ in 0..3 {
            columns.extend_from_slice(&[b, a]);
        }
    }
    for _ in 0..ROWS {
        columns.push(6);
    }

    let game = Connect4::new();
    let mut state = game.initial_state();
    let mut player = Player::One;
    let mut result = (0.0, false);
    for &col in &columns {
        state = game.next_state(&state, col, player);
        result = game.value_and_terminated(&state, Some(col));
        if result.1 {
            break;
        }
        player = player.opponent();
    }

    assert!(state.is_full());
    assert_eq!(result, (0.0, true));
}

#[test]
fn test_metadata() {
    let meta = Connect4::new().metadata();
    assert_eq!(meta.env_id, "connect4");
    assert_eq!(meta.num_actions, COLS);
    assert_eq!(meta.observation_size(), 126);
}

#[test]
fn test_display() {
    let state = play(&[0]);
    let rendered = state.to_string();
    assert!(rendered.ends_with("R......\n"));
    assert_eq!(rendered.lines().count(), ROWS);
}

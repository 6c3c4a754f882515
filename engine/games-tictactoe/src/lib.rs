//! TicTacToe game implementation
//!
//! A reference implementation of the `Game` contract on a 3x3 board. Cells
//! hold the signed identity of the player occupying them (+1, -1) or 0 when
//! empty. Actions are flat cell indices:
//!
//! ```text
//!  0 | 1 | 2
//! ---+---+---
//!  3 | 4 | 5
//! ---+---+---
//!  6 | 7 | 8
//! ```
//!
//! # Usage
//!
//! ```rust
//! use engine_core::{Game, Player};
//! use games_tictactoe::TicTacToe;
//!
//! let game = TicTacToe::new();
//! let state = game.next_state(&game.initial_state(), 4, Player::One);
//! let (value, done) = game.value_and_terminated(&state, Some(4));
//! assert!(!done && value == 0.0);
//! ```

use engine_core::{Game, GameMetadata, Player};

pub const ROWS: usize = 3;
pub const COLS: usize = 3;
pub const BOARD_SIZE: usize = ROWS * COLS;

/// Number of encoded planes: opponent stones, empty cells, own stones.
pub const OBS_PLANES: usize = 3;

/// TicTacToe board.
///
/// Immutable by convention: every transition returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    /// Board cells: 0=empty, 1=first player, -1=second player
    board: [i8; BOARD_SIZE],
}

impl State {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            board: [0; BOARD_SIZE],
        }
    }

    /// Build a state from raw cells. Cells outside {-1, 0, 1} are clamped.
    pub fn from_board(board: [i8; BOARD_SIZE]) -> Self {
        let mut board = board;
        for cell in &mut board {
            *cell = (*cell).clamp(-1, 1);
        }
        Self { board }
    }

    pub fn board(&self) -> &[i8; BOARD_SIZE] {
        &self.board
    }

    /// Get legal moves (empty positions)
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&pos| self.board[pos] == 0).collect()
    }

    pub fn is_full(&self) -> bool {
        self.board.iter().all(|&cell| cell != 0)
    }

    /// Place `player` at `position`. Occupied or out-of-range positions leave
    /// the board unchanged.
    pub fn place(&self, position: usize, player: Player) -> State {
        if position >= BOARD_SIZE || self.board[position] != 0 {
            return *self;
        }

        let mut new_state = *self;
        new_state.board[position] = player.sign();
        new_state
    }

    /// Check whether the stone at `action` completes a line.
    ///
    /// The owner of the cell is the player who just moved. Only lines through
    /// `action` count.
    pub fn check_win(&self, action: usize) -> bool {
        if action >= BOARD_SIZE {
            return false;
        }
        let player = self.board[action];
        if player == 0 {
            return false;
        }

        let row = action / COLS;
        let col = action % COLS;
        let target = player as i32 * 3;
        let sum = |cells: [usize; 3]| cells.iter().map(|&i| self.board[i] as i32).sum::<i32>();

        sum([row * COLS, row * COLS + 1, row * COLS + 2]) == target
            || sum([col, COLS + col, 2 * COLS + col]) == target
            || (row == col && sum([0, 4, 8]) == target)
            || (row + col == 2 && sum([2, 4, 6]) == target)
    }

    /// Multiply every cell by the player's sign so that `player` reads as +1.
    pub fn flipped(&self, player: Player) -> State {
        let sign = player.sign();
        let mut board = self.board;
        for cell in &mut board {
            *cell *= sign;
        }
        State { board }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..ROWS {
            let line: String = (0..COLS)
                .map(|col| match self.board[row * COLS + col] {
                    1 => 'X',
                    -1 => 'O',
                    _ => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// TicTacToe game implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl TicTacToe {
    pub fn new() -> Self {
        Self
    }
}

impl Game for TicTacToe {
    type State = State;

    fn env_id(&self) -> &'static str {
        "tictactoe"
    }

    fn action_size(&self) -> usize {
        BOARD_SIZE
    }

    fn observation_size(&self) -> usize {
        OBS_PLANES * BOARD_SIZE
    }

    fn initial_state(&self) -> State {
        State::new()
    }

    fn valid_moves(&self, state: &State) -> Vec<bool> {
        state.board.iter().map(|&cell| cell == 0).collect()
    }

    fn next_state(&self, state: &State, action: usize, player: Player) -> State {
        state.place(action, player)
    }

    fn value_and_terminated(&self, state: &State, last_action: Option<usize>) -> (f32, bool) {
        if let Some(action) = last_action {
            if state.check_win(action) {
                return (1.0, true);
            }
        }
        if state.is_full() {
            return (0.0, true);
        }
        (0.0, false)
    }

    fn change_perspective(&self, state: &State, player: Player) -> State {
        state.flipped(player)
    }

    fn encode(&self, state: &State) -> Vec<f32> {
        let mut out = vec![0.0; OBS_PLANES * BOARD_SIZE];
        for (i, &cell) in state.board.iter().enumerate() {
            // Plane order: -1, 0, +1
            let plane = (cell + 1) as usize;
            out[plane * BOARD_SIZE + i] = 1.0;
        }
        out
    }

    fn metadata(&self) -> GameMetadata {
        GameMetadata::new("tictactoe", "Tic-Tac-Toe")
            .with_board(COLS, ROWS)
            .with_actions(BOARD_SIZE)
            .with_planes(OBS_PLANES)
            .with_players(vec!["X".to_string(), "O".to_string()])
            .with_description("Get three in a row to win!")
    }
}

//! Connect 4 game implementation
//!
//! Connect 4 is a two-player connection game where players drop discs into a
//! 7-column, 6-row vertically suspended grid. The objective is to be the first
//! to form a horizontal, vertical, or diagonal line of four discs.
//!
//! # Board Layout
//!
//! The board is stored in row-major order, with row 0 at the bottom:
//! ```text
//! Row 5: [35][36][37][38][39][40][41]  <- Top
//! Row 4: [28][29][30][31][32][33][34]
//! Row 3: [21][22][23][24][25][26][27]
//! Row 2: [14][15][16][17][18][19][20]
//! Row 1: [ 7][ 8][ 9][10][11][12][13]
//! Row 0: [ 0][ 1][ 2][ 3][ 4][ 5][ 6]  <- Bottom
//!         Col 0  1  2  3  4  5  6
//! ```
//!
//! Actions are column indices 0-6.

use engine_core::{Game, GameMetadata, Player};

/// Board dimensions
pub const COLS: usize = 7;
pub const ROWS: usize = 6;
pub const BOARD_SIZE: usize = COLS * ROWS; // 42

/// Discs in a row needed to win
pub const IN_A_ROW: i32 = 4;

/// Number of encoded planes: opponent discs, empty cells, own discs.
pub const OBS_PLANES: usize = 3;

/// Connect4 board.
///
/// Cells hold 0 (empty), 1 (first player) or -1 (second player).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    /// Stored in row-major order with row 0 at the bottom
    board: [i8; BOARD_SIZE],
    /// Height of each column (number of discs in it)
    column_heights: [u8; COLS],
}

impl State {
    /// Create an empty board
    pub fn new() -> Self {
        Self {
            board: [0; BOARD_SIZE],
            column_heights: [0; COLS],
        }
    }

    pub fn board(&self) -> &[i8; BOARD_SIZE] {
        &self.board
    }

    pub fn column_height(&self, col: usize) -> usize {
        self.column_heights[col] as usize
    }

    /// Convert column and row to board index
    #[inline]
    pub fn pos(col: usize, row: usize) -> usize {
        row * COLS + col
    }

    /// Get legal moves (columns that are not full)
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..COLS)
            .filter(|&col| self.column_heights[col] < ROWS as u8)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.column_heights.iter().all(|&h| h >= ROWS as u8)
    }

    /// Drop a disc for `player` in `column`. Full or out-of-range columns
    /// leave the board unchanged.
    pub fn drop_piece(&self, column: usize, player: Player) -> State {
        if column >= COLS || self.column_heights[column] >= ROWS as u8 {
            return self.clone();
        }

        let mut new_state = self.clone();
        let row = self.column_heights[column] as usize;
        new_state.board[Self::pos(column, row)] = player.sign();
        new_state.column_heights[column] += 1;
        new_state
    }

    /// Check if the top disc of `col` completes a line of four.
    pub fn check_win(&self, col: usize) -> bool {
        if col >= COLS || self.column_heights[col] == 0 {
            return false;
        }
        let row = (self.column_heights[col] - 1) as usize;
        let player = self.board[Self::pos(col, row)];
        if player == 0 {
            return false;
        }

        // Direction vectors: horizontal, vertical, diagonal /, diagonal \
        let directions: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        directions.iter().any(|&(dc, dr)| {
            1 + self.count_run(col, row, dc, dr, player) + self.count_run(col, row, -dc, -dr, player)
                >= IN_A_ROW
        })
    }

    /// Count consecutive `player` discs from (col, row), excluding the start.
    fn count_run(&self, col: usize, row: usize, dc: i32, dr: i32, player: i8) -> i32 {
        let mut count = 0;
        let (mut c, mut r) = (col as i32 + dc, row as i32 + dr);
        while c >= 0 && c < COLS as i32 && r >= 0 && r < ROWS as i32 {
            if self.board[Self::pos(c as usize, r as usize)] != player {
                break;
            }
            count += 1;
            c += dc;
            r += dr;
        }
        count
    }

    /// Multiply every cell by the player's sign so that `player` reads as +1.
    pub fn flipped(&self, player: Player) -> State {
        let sign = player.sign();
        let mut new_state = self.clone();
        for cell in &mut new_state.board {
            *cell *= sign;
        }
        new_state
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in (0..ROWS).rev() {
            let line: String = (0..COLS)
                .map(|col| match self.board[Self::pos(col, row)] {
                    1 => 'R',
                    -1 => 'Y',
                    _ => '.',
                })
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Connect4 game implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct Connect4;

impl Connect4 {
    pub fn new() -> Self {
        Self
    }
}

impl Game for Connect4 {
    type State = State;

    fn env_id(&self) -> &'static str {
        "connect4"
    }

    fn action_size(&self) -> usize {
        COLS
    }

    fn observation_size(&self) -> usize {
        OBS_PLANES * BOARD_SIZE
    }

    fn initial_state(&self) -> State {
        State::new()
    }

    fn valid_moves(&self, state: &State) -> Vec<bool> {
        state
            .column_heights
            .iter()
            .map(|&h| h < ROWS as u8)
            .collect()
    }

    fn next_state(&self, state: &State, action: usize, player: Player) -> State {
        state.drop_piece(action, player)
    }

    fn value_and_terminated(&self, state: &State, last_action: Option<usize>) -> (f32, bool) {
        if let Some(col) = last_action {
            if state.check_win(col) {
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
            let plane = (cell + 1) as usize;
            out[plane * BOARD_SIZE + i] = 1.0;
        }
        out
    }

    fn metadata(&self) -> GameMetadata {
        GameMetadata::new("connect4", "Connect 4")
            .with_board(COLS, ROWS)
            .with_actions(COLS)
            .with_planes(OBS_PLANES)
            .with_players(vec!["Red".to_string(), "Yellow".to_string()])
            .with_description("Drop discs to connect four in a row!")
    }
}

#[cfg(test)]
mod tests;

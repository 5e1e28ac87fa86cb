//! Tic-tac-toe for testing the search.
//!
//! The smallest two-player game that still exercises the whole pipeline:
//! - 3x3 board, X moves first
//! - Actions are cell indices 0..9, row-major
//! - Encoded as three 3x3 planes: side-to-move stones, opponent stones,
//!   and a constant plane that is 1.0 when X is to move

mod game;

pub use game::{Mark, TicTacToe, TicTacToeState};

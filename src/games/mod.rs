//! Reference games implementing `RulesEngine`.

pub mod tictactoe;

pub use tictactoe::{TicTacToe, TicTacToeState};

//! Tic-tac-toe rules.

use crate::nn::EncodedState;
use crate::rules::{Outcome, RepetitionHistory, RulesEngine};

const CELLS: usize = 9;

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

/// A player's mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The other player.
    #[must_use]
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// Board position with the side to move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TicTacToeState {
    cells: [Option<Mark>; CELLS],
    to_move: Mark,
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self {
            cells: [None; CELLS],
            to_move: Mark::X,
        }
    }
}

impl TicTacToeState {
    /// Empty board, X to move.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay a sequence of cell indices from the empty board.
    ///
    /// Returns `None` if any move is illegal.
    pub fn from_moves(moves: &[u8]) -> Option<Self> {
        let game = TicTacToe;
        moves
            .iter()
            .try_fold(Self::new(), |state, cell| game.apply_action(&state, cell))
    }

    /// Player to move.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Mark in `cell`, if any.
    pub fn cell(&self, cell: usize) -> Option<Mark> {
        self.cells.get(cell).copied().flatten()
    }

    /// Player with three in a row, if any.
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| match self.cells[a] {
            Some(mark) if self.cells[b] == Some(mark) && self.cells[c] == Some(mark) => Some(mark),
            _ => None,
        })
    }

    /// Check if every cell is taken.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Number of marks on the board.
    pub fn move_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Tic-tac-toe rules engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl TicTacToe {
    pub fn new() -> Self {
        Self
    }
}

impl RulesEngine for TicTacToe {
    type State = TicTacToeState;
    type Action = u8;

    fn initial_state(&self) -> TicTacToeState {
        TicTacToeState::new()
    }

    fn action_space_size(&self) -> usize {
        CELLS
    }

    fn state_shape(&self) -> Vec<usize> {
        vec![3, 3, 3]
    }

    fn legal_actions(&self, state: &TicTacToeState) -> Vec<u8> {
        if state.winner().is_some() {
            return Vec::new();
        }
        (0..CELLS as u8)
            .filter(|&cell| state.cells[cell as usize].is_none())
            .collect()
    }

    fn apply_action(&self, state: &TicTacToeState, action: &u8) -> Option<TicTacToeState> {
        let cell = *action as usize;
        if cell >= CELLS || state.cells[cell].is_some() || state.winner().is_some() {
            return None;
        }

        let mut next = *state;
        next.cells[cell] = Some(state.to_move);
        next.to_move = state.to_move.opponent();
        Some(next)
    }

    fn value_and_terminated(
        &self,
        state: &TicTacToeState,
        _history: &RepetitionHistory<TicTacToeState>,
    ) -> Outcome {
        // Only the player who just moved can have completed a line.
        if state.winner().is_some() {
            Outcome::terminal(-1.0)
        } else if state.is_full() {
            Outcome::terminal(0.0)
        } else {
            Outcome::ONGOING
        }
    }

    fn encode_state(&self, state: &TicTacToeState) -> EncodedState {
        let mut tensor = vec![0.0; 3 * CELLS];
        let me = state.to_move;

        for (cell, mark) in state.cells.iter().enumerate() {
            match mark {
                Some(m) if *m == me => tensor[cell] = 1.0,
                Some(_) => tensor[CELLS + cell] = 1.0,
                None => {}
            }
        }
        if me == Mark::X {
            tensor[2 * CELLS..].fill(1.0);
        }

        EncodedState::new(tensor, self.state_shape())
    }

    fn encode_action(&self, _state: &TicTacToeState, action: &u8) -> Option<usize> {
        let index = *action as usize;
        (index < CELLS).then_some(index)
    }

    fn decode_action(&self, _state: &TicTacToeState, index: usize) -> Option<u8> {
        (index < CELLS).then_some(index as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(state: &TicTacToeState) -> Outcome {
        TicTacToe.value_and_terminated(state, &RepetitionHistory::new())
    }

    #[test]
    fn test_initial_state() {
        let game = TicTacToe::new();
        let state = game.initial_state();

        assert_eq!(state.to_move(), Mark::X);
        assert_eq!(game.legal_actions(&state).len(), 9);
        assert_eq!(outcome(&state), Outcome::ONGOING);
    }

    #[test]
    fn test_apply_action() {
        let game = TicTacToe;
        let state = game.apply_action(&TicTacToeState::new(), &4).unwrap();

        assert_eq!(state.cell(4), Some(Mark::X));
        assert_eq!(state.to_move(), Mark::O);
        assert_eq!(game.legal_actions(&state).len(), 8);

        // Occupied and out-of-range cells are rejected.
        assert!(game.apply_action(&state, &4).is_none());
        assert!(game.apply_action(&state, &9).is_none());
    }

    #[test]
    fn test_win_is_loss_for_side_to_move() {
        // X takes the top row.
        let state = TicTacToeState::from_moves(&[0, 3, 1, 4, 2]).unwrap();

        assert_eq!(state.winner(), Some(Mark::X));
        assert_eq!(state.to_move(), Mark::O);
        assert_eq!(outcome(&state), Outcome::terminal(-1.0));
        assert!(TicTacToe.legal_actions(&state).is_empty());
        assert!(TicTacToe.apply_action(&state, &8).is_none());
    }

    #[test]
    fn test_draw() {
        let state = TicTacToeState::from_moves(&[0, 1, 2, 4, 3, 5, 7, 6, 8]).unwrap();

        assert!(state.is_full());
        assert_eq!(state.winner(), None);
        assert_eq!(outcome(&state), Outcome::terminal(0.0));
    }

    #[test]
    fn test_from_moves_rejects_illegal() {
        assert!(TicTacToeState::from_moves(&[0, 0]).is_none());
    }

    #[test]
    fn test_encode_state_planes() {
        let game = TicTacToe;
        let state = TicTacToeState::from_moves(&[0, 8]).unwrap();
        let encoded = game.encode_state(&state);

        assert_eq!(encoded.shape, vec![3, 3, 3]);
        assert_eq!(encoded.len(), 27);
        // X to move: own stone at 0, opponent stone at 8, constant plane set.
        assert_eq!(encoded.tensor[0], 1.0);
        assert_eq!(encoded.tensor[9 + 8], 1.0);
        assert_eq!(encoded.tensor[8], 0.0);
        assert!(encoded.tensor[18..].iter().all(|&x| x == 1.0));

        let o_to_move = TicTacToeState::from_moves(&[0]).unwrap();
        let encoded = game.encode_state(&o_to_move);
        assert_eq!(encoded.tensor[9], 1.0);
        assert!(encoded.tensor[18..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_legal_mask_and_decode() {
        let game = TicTacToe;
        let state = TicTacToeState::from_moves(&[0, 1, 2]).unwrap();
        let mask = game.legal_mask(&state);

        assert_eq!(&mask[..3], &[0.0, 0.0, 0.0]);
        assert_eq!(mask.iter().sum::<f32>(), 6.0);

        let policy = vec![1.0 / 9.0; 9];
        let decoded = game.decode_actions(&state, &policy, &mask);
        let actions: Vec<u8> = decoded.iter().map(|(a, _)| *a).collect();
        assert_eq!(actions, vec![3, 4, 5, 6, 7, 8]);
    }
}

//! Rules engine trait for game implementations.
//!
//! Games implement `RulesEngine` to define:
//! - Legal actions for each game state
//! - How actions produce new states
//! - Terminal detection and outcome values
//! - State and action encodings for the evaluator
//!
//! Search calls into `RulesEngine` but never interprets
//! game-specific concepts directly.

pub mod engine;

pub use engine::{Outcome, RepetitionHistory, RulesEngine};

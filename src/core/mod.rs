//! Core building blocks shared by search and training.
//!
//! Holds the explicit random context; everything stochastic in the crate
//! (root noise, action sampling, replay sampling) draws from a `GameRng`
//! that the caller seeds.

pub mod rng;

pub use rng::GameRng;

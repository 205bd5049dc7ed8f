#![deny(warnings)]
pub mod budget;
pub mod clock;
pub mod error;
pub mod heuristic;
pub mod mcts;
pub mod movegen;
pub mod rng;
pub mod solver;

pub use budget::{Budget, CancelHandle};
pub use error::SolveError;
pub use mcts::{Parallelism, SearchReport, Widening};
pub use solver::{Decision, SolveOptions, Solver, Summary};

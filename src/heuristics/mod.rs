//! Heuristics module for KPLink.

pub mod greedy;

pub use greedy::{GreedyError, GreedyHeuristic};

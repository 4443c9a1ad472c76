//! KPLink Solver Library
//!
//! A solver for the Knapsack-with-Linking Problem (KPLink): select a set of
//! items minimizing total cost, so that the selected weights reach a given
//! threshold and any two consecutive selected items are at most
//! `max_distance` positions apart.
//!
//! # Features
//!
//! - Exact label-setting algorithm with Pareto dominance pruning
//! - Greedy heuristic for constant-cost instances
//! - O(n^2) dynamic program for unit-cost instances
//! - Compact MIP model solved with Gurobi (optional `gurobi` feature)
//! - Random instance generation with several weight profiles
//! - Benchmarking framework with CSV export
//!
//! # Example
//!
//! ```no_run
//! use kplink_solver::instance::KpLinkInstance;
//! use kplink_solver::labelling::{Labelling, LabellingParams};
//!
//! // Load instance
//! let instance = KpLinkInstance::from_file("instance.json").unwrap();
//!
//! // Solve exactly with the labelling algorithm
//! let solver = Labelling::new(&instance, LabellingParams::default());
//! let solution = solver.solve().unwrap();
//!
//! println!("{}", solution);
//! ```

pub mod instance;
pub mod solution;
pub mod labelling;
pub mod heuristics;
pub mod dp;
pub mod exact;
pub mod benchmark;

pub use instance::KpLinkInstance;
pub use solution::Solution;

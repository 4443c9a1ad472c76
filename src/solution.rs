//! Solution representation for KPLink.
//!
//! This module provides the data structure shared by all algorithms for
//! representing a selection of items, together with structural checks
//! (compactness, weight threshold, exact totals).

use crate::instance::KpLinkInstance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a solution to a KPLink instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Selected item indices, in ascending order.
    pub selected_items: Vec<usize>,
    /// Sum of the costs of the selected items.
    pub total_cost: f64,
    /// Sum of the weights of the selected items.
    pub total_weight: f64,
    /// Computation time in seconds.
    pub elapsed_time: f64,
    /// Algorithm that produced this solution.
    pub algorithm: String,
    /// Number of undominated labels left at the sink when the labelling
    /// search stopped. None for algorithms without a label frontier.
    pub n_frontier_labels: Option<usize>,
}

impl Solution {
    /// Build a solution from a set of selected items, recomputing totals.
    ///
    /// Items are sorted ascending; duplicates are not removed (a caller
    /// passing duplicates has a bug, which `verify` will expose).
    pub fn from_items(
        instance: &KpLinkInstance,
        mut selected_items: Vec<usize>,
        algorithm: &str,
    ) -> Self {
        selected_items.sort_unstable();
        let total_cost = selected_items.iter().map(|&i| instance.costs[i]).sum();
        let total_weight = selected_items.iter().map(|&i| instance.weights[i]).sum();

        Solution {
            selected_items,
            total_cost,
            total_weight,
            elapsed_time: 0.0,
            algorithm: algorithm.to_string(),
            n_frontier_labels: None,
        }
    }

    /// Number of selected items.
    pub fn n_selected(&self) -> usize {
        self.selected_items.len()
    }

    /// Check that the selection is compact: items strictly ascending and
    /// consecutive selected items at most `max_distance` apart.
    pub fn is_compact(&self, instance: &KpLinkInstance) -> bool {
        self.selected_items
            .windows(2)
            .all(|w| w[0] < w[1] && w[1] - w[0] <= instance.max_distance)
    }

    /// Full structural verification of the solution against an instance:
    /// all indices valid, selection compact, weight threshold reached,
    /// and stored totals matching a fresh summation.
    pub fn verify(&self, instance: &KpLinkInstance) -> bool {
        if !self.selected_items.iter().all(|&i| i < instance.n_items) {
            return false;
        }
        if !self.is_compact(instance) {
            return false;
        }

        let weight: f64 = self.selected_items.iter().map(|&i| instance.weights[i]).sum();
        let cost: f64 = self.selected_items.iter().map(|&i| instance.costs[i]).sum();

        weight >= instance.min_weight
            && (weight - self.total_weight).abs() < 1e-9
            && (cost - self.total_cost).abs() < 1e-9
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Items selected: {}", self.n_selected())?;
        writeln!(f, "  Total cost: {:.6}", self.total_cost)?;
        writeln!(f, "  Total weight: {:.6}", self.total_weight)?;
        writeln!(f, "  Time: {:.4}s", self.elapsed_time)?;
        if let Some(n) = self.n_frontier_labels {
            writeln!(f, "  Final labels at sink: {}", n)?;
        }
        writeln!(f, "  Selected: {:?}", self.selected_items)
    }
}

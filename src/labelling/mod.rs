//! Exact label-setting algorithm for KPLink.
//!
//! The search enumerates partial selections as labels on a line graph with
//! two pseudo-nodes: every path from the source to the sink visits a
//! strictly increasing sequence of items with consecutive indices at most
//! `max_distance` apart, which is exactly the compactness rule. Dominance
//! pruning keeps, at every node, only the Pareto-efficient (cost, weight)
//! pairs, and the minimum-cost label at the sink is an optimal solution.
//!
//! The engine is single-threaded; the only cancellation point is the
//! wall-clock check at the top of the main loop.

mod frontier;
mod label;

pub use frontier::Frontier;
pub use label::{Label, LabelArena, LabelId, Node};

use std::fmt;
use std::time::Instant;

use log::{debug, info};

use crate::instance::KpLinkInstance;
use crate::solution::Solution;

/// Tolerance when cross-checking reconstructed totals against the totals
/// accumulated along the label chain (summation order differs).
const TOTALS_CHECK_EPS: f64 = 1e-6;

/// Parameters of the labelling algorithm.
#[derive(Debug, Clone)]
pub struct LabellingParams {
    /// Wall-clock time limit in seconds. Must be non-negative.
    pub time_limit: f64,
}

impl Default for LabellingParams {
    fn default() -> Self {
        LabellingParams { time_limit: 3600.0 }
    }
}

/// Failure modes of the labelling algorithm. None is retried internally.
#[derive(Debug)]
pub enum LabellingError {
    /// Every label was extended and none reached the sink: the instance
    /// has no compact selection meeting the weight threshold.
    ExhaustedInfeasible,
    /// The time budget expired before any label reached the sink. Unlike
    /// `ExhaustedInfeasible` this is not a proof of infeasibility.
    TimeLimitWithoutSolution { time_limit: f64 },
    /// Totals recomputed during path reconstruction disagree with the
    /// totals accumulated along the chain: an implementation defect.
    InconsistentTotals {
        accumulated_cost: f64,
        recomputed_cost: f64,
        accumulated_weight: f64,
        recomputed_weight: f64,
    },
}

impl fmt::Display for LabellingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabellingError::ExhaustedInfeasible => {
                write!(f, "search exhausted without reaching the sink: instance is infeasible")
            }
            LabellingError::TimeLimitWithoutSolution { time_limit } => {
                write!(
                    f,
                    "no label reached the sink within the time limit of {}s (feasibility undecided)",
                    time_limit
                )
            }
            LabellingError::InconsistentTotals {
                accumulated_cost,
                recomputed_cost,
                accumulated_weight,
                recomputed_weight,
            } => {
                write!(
                    f,
                    "reconstructed totals disagree with accumulated label fields: \
                     cost {} vs {}, weight {} vs {}",
                    recomputed_cost, accumulated_cost, recomputed_weight, accumulated_weight
                )
            }
        }
    }
}

impl std::error::Error for LabellingError {}

/// The label-setting engine.
pub struct Labelling<'a> {
    instance: &'a KpLinkInstance,
    params: LabellingParams,
}

impl<'a> Labelling<'a> {
    pub fn new(instance: &'a KpLinkInstance, params: LabellingParams) -> Self {
        Labelling { instance, params }
    }

    /// Run the search to completion or to the time limit.
    pub fn solve(&self) -> Result<Solution, LabellingError> {
        let start = Instant::now();
        let mut arena = LabelArena::new();
        let mut frontier = Frontier::new();

        frontier.insert(
            &mut arena,
            Label {
                node: Node::Source,
                cost: 0.0,
                weight: 0.0,
                predecessor: None,
            },
            false,
        );

        let mut timed_out = false;

        loop {
            if start.elapsed().as_secs_f64() > self.params.time_limit {
                timed_out = true;
                break;
            }

            let Some(current) = frontier.pick_unextended(&arena) else {
                break;
            };
            // Labels are immutable once stored; copy out the fields before
            // inserting successors.
            let parent = *arena.get(current);
            debug!("extending {}", parent);

            if parent.weight >= self.instance.min_weight {
                // Weight-feasible: close the path. Selecting more items
                // could only increase the cost.
                self.close_at_sink(&mut arena, &mut frontier, current, &parent);
            } else {
                match parent.node {
                    Node::Source => {
                        // Any item may start the selection.
                        for item in 0..self.instance.n_items {
                            self.extend_to_item(&mut arena, &mut frontier, current, &parent, item);
                        }
                    }
                    Node::Item(i) => {
                        // The next item must lie within max_distance; the
                        // range may be empty near the end of the line.
                        let limit = (i + self.instance.max_distance).min(self.instance.n_items - 1);
                        for item in (i + 1)..=limit {
                            self.extend_to_item(&mut arena, &mut frontier, current, &parent, item);
                        }
                    }
                    // Sink labels are created closed and never scheduled.
                    Node::Sink => {}
                }
            }

            arena.mark_extended(current);
        }

        let elapsed = start.elapsed().as_secs_f64();
        let n_sink_labels = frontier.len_at(Node::Sink);

        info!(
            "labelling stopped after {:.3}s: {} labels created, {} undominated at sink",
            elapsed,
            arena.len(),
            n_sink_labels
        );

        let Some(best) = frontier.cheapest_at(Node::Sink) else {
            return Err(if timed_out {
                LabellingError::TimeLimitWithoutSolution {
                    time_limit: self.params.time_limit,
                }
            } else {
                LabellingError::ExhaustedInfeasible
            });
        };

        self.reconstruct(&arena, best, elapsed, n_sink_labels)
    }

    /// Extend `parent` to item `destination`, accumulating its cost and
    /// weight. Rejection by dominance is an expected pruning event.
    fn extend_to_item(
        &self,
        arena: &mut LabelArena,
        frontier: &mut Frontier,
        parent_id: LabelId,
        parent: &Label,
        destination: usize,
    ) {
        frontier.insert(
            arena,
            Label {
                node: Node::Item(destination),
                cost: parent.cost + self.instance.costs[destination],
                weight: parent.weight + self.instance.weights[destination],
                predecessor: Some(parent_id),
            },
            false,
        );
    }

    /// Extend `parent` to the sink. Closing a path adds nothing; the sink
    /// label is created already extended so it is never scheduled.
    fn close_at_sink(
        &self,
        arena: &mut LabelArena,
        frontier: &mut Frontier,
        parent_id: LabelId,
        parent: &Label,
    ) {
        frontier.insert(
            arena,
            Label {
                node: Node::Sink,
                cost: parent.cost,
                weight: parent.weight,
                predecessor: Some(parent_id),
            },
            true,
        );
    }

    /// Walk the predecessor chain of a terminal label back to the source,
    /// collecting the selected items, and cross-check the accumulated
    /// totals against a fresh summation.
    fn reconstruct(
        &self,
        arena: &LabelArena,
        terminal: LabelId,
        elapsed: f64,
        n_sink_labels: usize,
    ) -> Result<Solution, LabellingError> {
        let terminal_label = arena.get(terminal);
        let mut selected_items = Vec::new();
        let mut cost_check = 0.0;
        let mut weight_check = 0.0;

        let mut current = Some(terminal);
        while let Some(id) = current {
            let label = arena.get(id);
            if let Node::Item(item) = label.node {
                selected_items.push(item);
                cost_check += self.instance.costs[item];
                weight_check += self.instance.weights[item];
            }
            current = label.predecessor;
        }

        // Extension only moves to strictly larger indices, so the walk
        // visited items in descending order: one reversal sorts them.
        selected_items.reverse();

        if (cost_check - terminal_label.cost).abs() > TOTALS_CHECK_EPS
            || (weight_check - terminal_label.weight).abs() > TOTALS_CHECK_EPS
        {
            return Err(LabellingError::InconsistentTotals {
                accumulated_cost: terminal_label.cost,
                recomputed_cost: cost_check,
                accumulated_weight: terminal_label.weight,
                recomputed_weight: weight_check,
            });
        }

        Ok(Solution {
            selected_items,
            total_cost: cost_check,
            total_weight: weight_check,
            elapsed_time: elapsed,
            algorithm: "labelling".to_string(),
            n_frontier_labels: Some(n_sink_labels),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::KpLinkInstance;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn solve(instance: &KpLinkInstance) -> Result<Solution, LabellingError> {
        Labelling::new(instance, LabellingParams::default()).solve()
    }

    /// Minimum cost over all compact, weight-feasible subsets, by
    /// exhaustive enumeration. Only for tiny instances.
    fn brute_force(instance: &KpLinkInstance) -> Option<f64> {
        let n = instance.n_items;
        assert!(n <= 15);

        let mut best: Option<f64> = None;
        for mask in 0u32..(1 << n) {
            let items: Vec<usize> = (0..n).filter(|&i| mask & (1 << i) != 0).collect();

            let compact = items
                .windows(2)
                .all(|w| w[1] - w[0] <= instance.max_distance);
            if !compact {
                continue;
            }

            let weight: f64 = items.iter().map(|&i| instance.weights[i]).sum();
            if weight < instance.min_weight {
                continue;
            }

            let cost: f64 = items.iter().map(|&i| instance.costs[i]).sum();
            if best.map_or(true, |b| cost < b) {
                best = Some(cost);
            }
        }
        best
    }

    #[test]
    fn test_adjacent_pair_scenario() {
        // Only adjacent pairs are compact; any two adjacent items reach
        // the threshold at cost 2.
        let instance = KpLinkInstance::new(
            "pairs",
            1,
            10.0,
            vec![5.0, 5.0, 5.0, 5.0],
            vec![1.0, 1.0, 1.0, 1.0],
        )
        .unwrap();

        let sol = solve(&instance).unwrap();
        assert_eq!(sol.total_cost, 2.0);
        assert_eq!(sol.total_weight, 10.0);
        assert_eq!(sol.n_selected(), 2);
        assert!(sol.verify(&instance));
    }

    #[test]
    fn test_single_item_scenario() {
        let instance = KpLinkInstance::new("one", 1, 20.0, vec![20.0], vec![3.0]).unwrap();
        let sol = solve(&instance).unwrap();
        assert_eq!(sol.selected_items, vec![0]);
        assert_eq!(sol.total_cost, 3.0);
        assert!(sol.verify(&instance));
    }

    #[test]
    fn test_infeasible_instance_is_reported() {
        // Threshold above the sum of all weights.
        let instance =
            KpLinkInstance::new("inf", 2, 100.0, vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 1.0])
                .unwrap();
        let err = solve(&instance).unwrap_err();
        assert!(matches!(err, LabellingError::ExhaustedInfeasible));
    }

    #[test]
    fn test_zero_time_limit_is_distinct_from_infeasible() {
        let instance = KpLinkInstance::new("t0", 1, 1.0, vec![1.0, 1.0], vec![1.0, 1.0]).unwrap();
        let labelling = Labelling::new(&instance, LabellingParams { time_limit: 0.0 });
        let err = labelling.solve().unwrap_err();
        assert!(matches!(err, LabellingError::TimeLimitWithoutSolution { .. }));
    }

    #[test]
    fn test_cheap_far_items_need_a_bridge() {
        // Items 0 and 4 alone reach the threshold cheaply but are too far
        // apart; the optimum must pay for a bridging item.
        let instance = KpLinkInstance::new(
            "bridge",
            2,
            10.0,
            vec![5.0, 0.1, 0.1, 0.1, 5.0],
            vec![1.0, 10.0, 2.0, 10.0, 1.0],
        )
        .unwrap();

        let sol = solve(&instance).unwrap();
        assert_eq!(sol.selected_items, vec![0, 2, 4]);
        assert!((sol.total_cost - 4.0).abs() < 1e-12);
        assert!(sol.verify(&instance));
    }

    #[test]
    fn test_zero_threshold_selects_nothing() {
        // The source is already weight-feasible, so the empty selection of
        // cost 0 closes immediately.
        let instance = KpLinkInstance::new("z", 1, 0.0, vec![1.0, 1.0], vec![1.0, 1.0]).unwrap();
        let sol = solve(&instance).unwrap();
        assert!(sol.selected_items.is_empty());
        assert_eq!(sol.total_cost, 0.0);
    }

    #[test]
    fn test_sink_frontier_size_is_reported() {
        let instance = KpLinkInstance::new(
            "diag",
            3,
            4.0,
            vec![2.0, 3.0, 2.0, 3.0],
            vec![1.0, 2.0, 1.5, 2.5],
        )
        .unwrap();
        let sol = solve(&instance).unwrap();
        assert!(sol.n_frontier_labels.is_some());
        assert!(sol.n_frontier_labels.unwrap() >= 1);
    }

    #[test]
    fn test_optimal_on_random_small_instances() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for trial in 0..200 {
            let n = rng.gen_range(1..=10);
            let max_distance = rng.gen_range(1..=4);
            let weights: Vec<f64> = (0..n).map(|_| rng.gen_range(1..=8) as f64).collect();
            let costs: Vec<f64> = (0..n).map(|_| rng.gen_range(1..=8) as f64).collect();
            let total: f64 = weights.iter().sum();
            let min_weight = rng.gen_range(0.0..total * 1.2);

            let instance = KpLinkInstance::new(
                format!("rand-{}", trial),
                max_distance,
                min_weight,
                weights,
                costs,
            )
            .unwrap();

            match (solve(&instance), brute_force(&instance)) {
                (Ok(sol), Some(best)) => {
                    assert!(
                        (sol.total_cost - best).abs() < 1e-9,
                        "trial {}: got cost {}, optimum {}",
                        trial,
                        sol.total_cost,
                        best
                    );
                    assert!(sol.verify(&instance), "trial {}: infeasible output", trial);
                }
                (Err(LabellingError::ExhaustedInfeasible), None) => {}
                (engine, brute) => panic!(
                    "trial {}: engine {:?} disagrees with brute force {:?}",
                    trial,
                    engine.map(|s| s.total_cost),
                    brute
                ),
            }
        }
    }

    #[test]
    fn test_monotone_accumulation_along_chain() {
        // Rebuild the chain by running the engine on a small instance and
        // checking the reported solution's prefix sums, which mirror the
        // accumulated label fields: both must be non-decreasing.
        let instance = KpLinkInstance::new(
            "mono",
            2,
            9.0,
            vec![3.0, 2.0, 4.0, 1.0, 5.0],
            vec![2.0, 1.0, 3.0, 1.0, 2.0],
        )
        .unwrap();
        let sol = solve(&instance).unwrap();

        let mut cost = 0.0;
        let mut weight = 0.0;
        for &item in &sol.selected_items {
            let (next_cost, next_weight) =
                (cost + instance.costs[item], weight + instance.weights[item]);
            assert!(next_cost >= cost && next_weight >= weight);
            cost = next_cost;
            weight = next_weight;
        }
        assert!((cost - sol.total_cost).abs() < 1e-12);
        assert!((weight - sol.total_weight).abs() < 1e-12);
    }
}

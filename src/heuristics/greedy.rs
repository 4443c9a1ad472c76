//! Greedy heuristic for constant-cost instances.
//!
//! With constant costs, minimizing total cost means selecting as few items
//! as possible, so the greedy packs the heaviest item first and then
//! repeatedly the heaviest item still available, where an item is
//! available when it is unpacked and within `max_distance` of some packed
//! item. The result is compact by construction but not necessarily
//! optimal.

use std::fmt;
use std::time::Instant;

use log::debug;

use crate::instance::KpLinkInstance;
use crate::solution::Solution;

/// Failure modes of the greedy heuristic.
#[derive(Debug)]
pub enum GreedyError {
    /// The greedy is only meaningful when all costs are equal.
    NonConstantCosts,
    /// The reachable items ran out before the threshold was met.
    Infeasible,
}

impl fmt::Display for GreedyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GreedyError::NonConstantCosts => {
                write!(f, "the greedy heuristic requires a constant-cost instance")
            }
            GreedyError::Infeasible => {
                write!(f, "greedy ran out of reachable items below the weight threshold")
            }
        }
    }
}

impl std::error::Error for GreedyError {}

/// Greedy packer for constant-cost instances.
pub struct GreedyHeuristic<'a> {
    instance: &'a KpLinkInstance,
    packed: Vec<bool>,
    /// Unpacked items within `max_distance` of a packed item.
    available: Vec<bool>,
}

impl<'a> GreedyHeuristic<'a> {
    pub fn new(instance: &'a KpLinkInstance) -> Result<Self, GreedyError> {
        if !instance.constant_costs {
            return Err(GreedyError::NonConstantCosts);
        }
        Ok(GreedyHeuristic {
            instance,
            packed: vec![false; instance.n_items],
            available: vec![false; instance.n_items],
        })
    }

    /// Pack item `i` and refresh availability around it.
    fn pack(&mut self, i: usize) {
        debug_assert!(!self.packed[i]);

        self.packed[i] = true;
        self.available[i] = false;

        let start = i.saturating_sub(self.instance.max_distance);
        let end = (i + self.instance.max_distance).min(self.instance.n_items - 1);
        for j in start..=end {
            if !self.packed[j] {
                self.available[j] = true;
            }
        }
    }

    /// Index of the heaviest available item, if any.
    fn heaviest_available(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &avail) in self.available.iter().enumerate() {
            if !avail {
                continue;
            }
            let w = self.instance.weights[j];
            if best.map_or(true, |(_, bw)| w > bw) {
                best = Some((j, w));
            }
        }
        best.map(|(j, _)| j)
    }

    /// Run the greedy to completion.
    pub fn solve(mut self) -> Result<Solution, GreedyError> {
        let start = Instant::now();
        let p = self.instance;

        // Heaviest item overall starts the selection.
        let first = (0..p.n_items)
            .max_by(|&a, &b| p.weights[a].total_cmp(&p.weights[b]))
            .unwrap_or(0);
        let mut current_weight = p.weights[first];
        self.pack(first);

        while current_weight < p.min_weight {
            let Some(next) = self.heaviest_available() else {
                return Err(GreedyError::Infeasible);
            };
            debug!("greedy packs item {} (weight {})", next, p.weights[next]);
            current_weight += p.weights[next];
            self.pack(next);
        }

        let selected_items: Vec<usize> = (0..p.n_items).filter(|&j| self.packed[j]).collect();
        let mut solution = Solution::from_items(p, selected_items, "greedy");
        solution.elapsed_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn constant_instance(
        max_distance: usize,
        min_weight: f64,
        weights: Vec<f64>,
    ) -> KpLinkInstance {
        let n = weights.len();
        KpLinkInstance::new("const", max_distance, min_weight, weights, vec![2.0; n]).unwrap()
    }

    #[test]
    fn test_rejects_non_constant_costs() {
        let inst =
            KpLinkInstance::new("bad", 1, 1.0, vec![1.0, 1.0], vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            GreedyHeuristic::new(&inst),
            Err(GreedyError::NonConstantCosts)
        ));
    }

    #[test]
    fn test_single_heavy_item_suffices() {
        let inst = constant_instance(1, 5.0, vec![1.0, 6.0, 1.0]);
        let sol = GreedyHeuristic::new(&inst).unwrap().solve().unwrap();
        assert_eq!(sol.selected_items, vec![1]);
        assert!(sol.verify(&inst));
    }

    #[test]
    fn test_grows_around_seed_item() {
        // Heaviest item is 2; neighbours within distance 1 get packed next.
        let inst = constant_instance(1, 10.0, vec![1.0, 4.0, 5.0, 3.0, 1.0]);
        let sol = GreedyHeuristic::new(&inst).unwrap().solve().unwrap();
        assert!(sol.verify(&inst));
        assert!(sol.selected_items.contains(&2));
    }

    #[test]
    fn test_reports_infeasibility() {
        // Heaviest item is isolated: nothing else within distance 1.
        let inst = constant_instance(1, 10.0, vec![6.0, 0.0, 0.0, 0.0, 1.0]);
        // Items 1 and 2 are reachable but weightless; after packing all
        // reachable items the weight stays below 10.
        let res = GreedyHeuristic::new(&inst).unwrap().solve();
        assert!(matches!(res, Err(GreedyError::Infeasible)));
    }

    #[test]
    fn test_feasible_on_random_instances() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..100 {
            let n = rng.gen_range(2..=40);
            let max_distance = rng.gen_range(1..=5);
            let weights: Vec<f64> = (0..n).map(|_| rng.gen_range(1..=9) as f64).collect();
            let total: f64 = weights.iter().sum();
            // Low enough that the greedy always succeeds when every item
            // is reachable; all weights are positive so growth continues.
            let min_weight = rng.gen_range(1.0..total * 0.5);
            let inst = constant_instance(max_distance, min_weight, weights);

            let sol = GreedyHeuristic::new(&inst).unwrap().solve().unwrap();
            assert!(sol.verify(&inst));
        }
    }
}

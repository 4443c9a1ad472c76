//! Specialized O(n²) dynamic program for unit-cost instances.
//!
//! When every item costs 1, minimizing total cost means minimizing the
//! number of selected items. `W(i, l)` is the largest weight achievable by
//! a compact subset of `{0, ..., i}` with `l + 1` elements whose largest
//! index is `i`; the answer is the smallest `l` with some `W(i, l)` at or
//! above the threshold. Both tables are stored flat, lower-triangular.

use std::fmt;
use std::time::Instant;

use log::debug;

use crate::instance::KpLinkInstance;
use crate::solution::Solution;

/// Failure modes of the unit-cost DP.
#[derive(Debug)]
pub enum UnitDpError {
    /// The DP is only valid when every cost equals 1.
    NonUnitCosts,
    /// No compact subset reaches the weight threshold.
    Infeasible,
}

impl fmt::Display for UnitDpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitDpError::NonUnitCosts => {
                write!(f, "the unit-cost DP requires an instance with all costs equal to 1")
            }
            UnitDpError::Infeasible => {
                write!(f, "no compact selection reaches the weight threshold")
            }
        }
    }
}

impl std::error::Error for UnitDpError {}

/// The unit-cost dynamic program.
pub struct UnitCostDp<'a> {
    instance: &'a KpLinkInstance,
    /// Flat lower-triangular table of best weights, indexed through `idx`.
    weights: Vec<Option<f64>>,
    /// Index achieving the maximum in the recursion, for reconstruction.
    predecessors: Vec<Option<usize>>,
}

impl<'a> UnitCostDp<'a> {
    pub fn new(instance: &'a KpLinkInstance) -> Result<Self, UnitDpError> {
        if !instance.has_unit_costs() {
            return Err(UnitDpError::NonUnitCosts);
        }
        let n = instance.n_items;
        let size = n * (n + 1) / 2;
        Ok(UnitCostDp {
            instance,
            weights: vec![None; size],
            predecessors: vec![None; size],
        })
    }

    /// Position of entry (i, l), l <= i, in the flat triangular tables.
    fn idx(i: usize, l: usize) -> usize {
        (i + 1) * i / 2 + l
    }

    /// Fill the tables and reconstruct a minimum-cardinality selection.
    pub fn solve(mut self) -> Result<Solution, UnitDpError> {
        let start = Instant::now();
        let p = self.instance;
        let n = p.n_items;

        for i in 0..n {
            self.weights[Self::idx(i, 0)] = Some(p.weights[i]);
        }

        for l in 1..n {
            for i in l..n {
                let start_idx = i.saturating_sub(p.max_distance);

                let mut best: Option<(f64, usize)> = None;
                for j in start_idx..i {
                    // Subsets of size l with largest index j < l elements
                    // do not exist; their entries stay None.
                    if let Some(w) = self.weights[Self::idx(j, l - 1)] {
                        if best.map_or(true, |(bw, _)| w > bw) {
                            best = Some((w, j));
                        }
                    }
                }

                if let Some((w, j)) = best {
                    self.weights[Self::idx(i, l)] = Some(w + p.weights[i]);
                    self.predecessors[Self::idx(i, l)] = Some(j);
                }
            }
        }

        // Smallest cardinality reaching the threshold; ties by scan order.
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            for l in 0..=i {
                if let Some(w) = self.weights[Self::idx(i, l)] {
                    if w >= p.min_weight && best.map_or(true, |(bl, _, _)| l < bl) {
                        best = Some((l, i, w));
                    }
                }
            }
        }

        let Some((size, last, weight)) = best else {
            return Err(UnitDpError::Infeasible);
        };

        debug!(
            "unit-cost DP optimum: {} items ending at {}, weight {}",
            size + 1,
            last,
            weight
        );

        let mut selected_items = vec![last];
        let mut current_i = last;
        let mut current_l = size;
        while current_l >= 1 {
            // Entry (current_i, current_l) was reachable, so its
            // predecessor entry is set.
            let Some(prev) = self.predecessors[Self::idx(current_i, current_l)] else {
                break;
            };
            selected_items.push(prev);
            current_i = prev;
            current_l -= 1;
        }
        selected_items.reverse();

        let mut solution = Solution::from_items(p, selected_items, "unit_dp");
        solution.elapsed_time = start.elapsed().as_secs_f64();
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labelling::{Labelling, LabellingParams};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn unit_instance(
        max_distance: usize,
        min_weight: f64,
        weights: Vec<f64>,
    ) -> KpLinkInstance {
        let n = weights.len();
        KpLinkInstance::new("unit", max_distance, min_weight, weights, vec![1.0; n]).unwrap()
    }

    #[test]
    fn test_rejects_non_unit_costs() {
        let inst =
            KpLinkInstance::new("bad", 1, 1.0, vec![1.0, 1.0], vec![1.0, 2.0]).unwrap();
        assert!(matches!(UnitCostDp::new(&inst), Err(UnitDpError::NonUnitCosts)));
    }

    #[test]
    fn test_single_item() {
        let inst = unit_instance(1, 20.0, vec![20.0]);
        let sol = UnitCostDp::new(&inst).unwrap().solve().unwrap();
        assert_eq!(sol.selected_items, vec![0]);
        assert_eq!(sol.total_cost, 1.0);
        assert!(sol.verify(&inst));
    }

    #[test]
    fn test_adjacent_pairs() {
        let inst = unit_instance(1, 10.0, vec![5.0, 5.0, 5.0, 5.0]);
        let sol = UnitCostDp::new(&inst).unwrap().solve().unwrap();
        assert_eq!(sol.n_selected(), 2);
        assert!(sol.verify(&inst));
    }

    #[test]
    fn test_infeasible() {
        let inst = unit_instance(2, 100.0, vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            UnitCostDp::new(&inst).unwrap().solve(),
            Err(UnitDpError::Infeasible)
        ));
    }

    #[test]
    fn test_prefers_heavy_far_item_over_more_items() {
        // One heavy item beats any pair of light ones.
        let inst = unit_instance(1, 6.0, vec![3.0, 3.5, 2.0, 7.0]);
        let sol = UnitCostDp::new(&inst).unwrap().solve().unwrap();
        assert_eq!(sol.selected_items, vec![3]);
    }

    #[test]
    fn test_agrees_with_labelling_on_random_instances() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);

        for trial in 0..100 {
            let n = rng.gen_range(1..=12);
            let max_distance = rng.gen_range(1..=4);
            let weights: Vec<f64> = (0..n).map(|_| rng.gen_range(1..=9) as f64).collect();
            let total: f64 = weights.iter().sum();
            let min_weight = rng.gen_range(1.0..total * 1.1);
            let inst = unit_instance(max_distance, min_weight, weights);

            let dp = UnitCostDp::new(&inst).unwrap().solve();
            let labelling = Labelling::new(&inst, LabellingParams::default()).solve();

            match (dp, labelling) {
                (Ok(dp_sol), Ok(lab_sol)) => {
                    // Same number of selected items, i.e. same unit cost.
                    assert_eq!(
                        dp_sol.n_selected(),
                        lab_sol.n_selected(),
                        "trial {}: DP selected {:?}, labelling {:?}",
                        trial,
                        dp_sol.selected_items,
                        lab_sol.selected_items
                    );
                    assert!(dp_sol.verify(&inst));
                }
                (Err(UnitDpError::Infeasible), Err(_)) => {}
                (dp, labelling) => panic!(
                    "trial {}: DP {:?} disagrees with labelling {:?}",
                    trial,
                    dp.map(|s| s.n_selected()),
                    labelling.map(|s| s.n_selected())
                ),
            }
        }
    }
}

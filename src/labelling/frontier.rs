//! Frontier store: the Pareto-efficient label sets, one per node.
//!
//! Each node keeps its labels ordered by `(cost, weight)`; the ordering has
//! no semantic meaning beyond deduplicating exact copies. Every insertion
//! preserves the antichain invariant: no label in a node's set dominates
//! another. The store also runs the scheduling queue of labels awaiting
//! extension.

use std::collections::{BTreeMap, VecDeque};

use log::debug;
use ordered_float::OrderedFloat;

use super::label::{Label, LabelArena, LabelId, Node};

/// Sort key of a label inside its node's set.
type FrontierKey = (OrderedFloat<f64>, OrderedFloat<f64>);

fn key_of(label: &Label) -> FrontierKey {
    (OrderedFloat(label.cost), OrderedFloat(label.weight))
}

/// Maps each node to the undominated labels currently resident there.
#[derive(Debug, Default)]
pub struct Frontier {
    sets: BTreeMap<Node, BTreeMap<FrontierKey, LabelId>>,
    /// Labels waiting to be extended, in creation order. The choice of
    /// which unextended label to process next is deliberately left open;
    /// it affects performance and tie-breaking among equal-cost optima,
    /// never correctness.
    pending: VecDeque<LabelId>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to add `label` to the set at its node.
    ///
    /// Returns false and discards the label if an existing label at the
    /// node dominates it (an exact duplicate is dominated by its copy, so
    /// re-insertion is a no-op). Otherwise evicts every resident label the
    /// new one dominates, stores the label in the arena and returns true.
    ///
    /// Evicted labels are retired, not destroyed: they can no longer be
    /// extended, but chains running through them stay intact.
    pub fn insert(&mut self, arena: &mut LabelArena, label: Label, closed: bool) -> bool {
        let set = self.sets.entry(label.node).or_default();

        if set
            .values()
            .any(|&resident| arena.get(resident).dominates(&label))
        {
            debug!("label {} dominated at its node, discarded", label);
            return false;
        }

        let evicted: Vec<FrontierKey> = set
            .iter()
            .filter(|(_, &resident)| label.dominates(arena.get(resident)))
            .map(|(&key, _)| key)
            .collect();

        for key in evicted {
            if let Some(resident) = set.remove(&key) {
                debug!("label {} evicted by {}", arena.get(resident), label);
                arena.retire(resident);
            }
        }

        let id = arena.push(label, closed);
        set.insert(key_of(arena.get(id)), id);

        if !closed {
            self.pending.push_back(id);
        }

        true
    }

    /// Return some label not yet extended, or None when all labels have
    /// been processed. Labels retired after being enqueued are skipped.
    pub fn pick_unextended(&mut self, arena: &LabelArena) -> Option<LabelId> {
        while let Some(id) = self.pending.pop_front() {
            if !arena.is_retired(id) && !arena.is_extended(id) {
                return Some(id);
            }
        }
        None
    }

    /// Ids of the undominated labels currently at `node`.
    pub fn labels_at(&self, node: Node) -> impl Iterator<Item = LabelId> + '_ {
        self.sets.get(&node).into_iter().flat_map(|s| s.values().copied())
    }

    /// Number of undominated labels at `node`.
    pub fn len_at(&self, node: Node) -> usize {
        self.sets.get(&node).map_or(0, |s| s.len())
    }

    /// The minimum-cost label at `node`, if any.
    ///
    /// The per-node set is ordered by `(cost, weight)`, so the first entry
    /// is minimal in cost; ties are broken arbitrarily, any minimal-cost
    /// label is an equally valid answer.
    pub fn cheapest_at(&self, node: Node) -> Option<LabelId> {
        self.sets
            .get(&node)
            .and_then(|s| s.values().next().copied())
    }
}

//! Labels and the arena that owns them.
//!
//! A label describes one feasible partial selection ending at a node. Labels
//! form a predecessor forest rooted at the source label: a label evicted by
//! dominance may still be the ancestor of surviving labels, so labels are
//! never destroyed individually. The arena owns every label ever created and
//! hands out stable integer ids; the scheduling state (`extended`, `retired`)
//! lives in side tables so that the label value itself stays immutable.

use std::fmt;

/// Addressing key of the frontier: an item index or one of the two
/// pseudo-markers delimiting every selection path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    /// Pseudo start marker; the only node whose label has no predecessor.
    Source,
    /// A genuine item index in `[0, n_items)`.
    Item(usize),
    /// Pseudo end marker; labels here are complete selections.
    Sink,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Source => write!(f, "source"),
            Node::Item(i) => write!(f, "{}", i),
            Node::Sink => write!(f, "sink"),
        }
    }
}

/// Stable identifier of a label inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelId(usize);

/// A candidate partial selection ending at `node`.
///
/// Immutable once created; scheduling state is kept by the arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Label {
    /// Node this partial selection ends at.
    pub node: Node,
    /// Total cost of the items selected so far.
    pub cost: f64,
    /// Total weight of the items selected so far.
    pub weight: f64,
    /// Label this one was extended from. None only for the source label.
    pub predecessor: Option<LabelId>,
}

impl Label {
    /// Non-strict dominance: this label is at least as good as `other` on
    /// both criteria. Only labels at the same node are comparable; a label
    /// dominates an identical copy of itself.
    pub fn dominates(&self, other: &Label) -> bool {
        self.node == other.node && self.cost <= other.cost && self.weight >= other.weight
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Label[ node = {}, cost = {}, weight = {} ]",
            self.node, self.cost, self.weight
        )
    }
}

/// Owner of every label created during a labelling run.
///
/// Labels are destroyed only when the whole arena is dropped, which keeps
/// predecessor chains of surviving labels valid even after dominance
/// evictions.
#[derive(Debug, Default)]
pub struct LabelArena {
    labels: Vec<Label>,
    /// Set exactly once, when the engine processes the label.
    extended: Vec<bool>,
    /// Set when the label is evicted from its frontier by dominance; a
    /// retired label must not be extended but stays valid as a predecessor.
    retired: Vec<bool>,
}

impl LabelArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new label, returning its id. `extended` is true for labels
    /// that must never be scheduled (sink labels are created closed).
    pub fn push(&mut self, label: Label, extended: bool) -> LabelId {
        let id = LabelId(self.labels.len());
        self.labels.push(label);
        self.extended.push(extended);
        self.retired.push(false);
        id
    }

    pub fn get(&self, id: LabelId) -> &Label {
        &self.labels[id.0]
    }

    pub fn is_extended(&self, id: LabelId) -> bool {
        self.extended[id.0]
    }

    pub fn mark_extended(&mut self, id: LabelId) {
        self.extended[id.0] = true;
    }

    pub fn is_retired(&self, id: LabelId) -> bool {
        self.retired[id.0]
    }

    pub fn retire(&mut self, id: LabelId) {
        self.retired[id.0] = true;
    }

    /// Total number of labels ever created.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ordering() {
        assert!(Node::Source < Node::Item(0));
        assert!(Node::Item(3) < Node::Item(4));
        assert!(Node::Item(usize::MAX) < Node::Sink);
    }

    #[test]
    fn test_dominance_is_non_strict() {
        let a = Label {
            node: Node::Item(2),
            cost: 1.0,
            weight: 5.0,
            predecessor: None,
        };
        let same = a;
        let worse = Label { cost: 2.0, weight: 4.0, ..a };
        let other_node = Label { node: Node::Item(3), ..a };

        assert!(a.dominates(&same));
        assert!(a.dominates(&worse));
        assert!(!worse.dominates(&a));
        assert!(!a.dominates(&other_node));
    }

    #[test]
    fn test_incomparable_labels() {
        let cheap_light = Label {
            node: Node::Item(0),
            cost: 1.0,
            weight: 2.0,
            predecessor: None,
        };
        let dear_heavy = Label { cost: 3.0, weight: 6.0, ..cheap_light };

        assert!(!cheap_light.dominates(&dear_heavy));
        assert!(!dear_heavy.dominates(&cheap_light));
    }

    #[test]
    fn test_arena_side_tables() {
        let mut arena = LabelArena::new();
        let a = arena.push(
            Label {
                node: Node::Source,
                cost: 0.0,
                weight: 0.0,
                predecessor: None,
            },
            false,
        );
        let b = arena.push(
            Label {
                node: Node::Item(0),
                cost: 1.0,
                weight: 1.0,
                predecessor: Some(a),
            },
            false,
        );

        assert_eq!(arena.len(), 2);
        assert!(!arena.is_extended(a));
        arena.mark_extended(a);
        assert!(arena.is_extended(a));

        assert!(!arena.is_retired(b));
        arena.retire(b);
        assert!(arena.is_retired(b));
        // The label value itself is untouched by retirement.
        assert_eq!(arena.get(b).predecessor, Some(a));
    }
}

//! Contraction ordering strategies
//!
//! Gantree: L1_Network → ContractionStrategy
//!
//! A strategy only picks the next pair of tensors to merge. The network
//! performs the merge, so every strategy yields the same result tensor and
//! differs only in intermediate sizes.

use crate::leg::{TensorId, OUTPUT_TENSOR_ID};
use crate::network::{NetworkNode, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// Contraction View
// ============================================================================

/// Read-only view of the tensors still waiting to be contracted
pub struct ContractionView<'a> {
    nodes: &'a BTreeMap<TensorId, NetworkNode>,
}

impl<'a> ContractionView<'a> {
    pub(crate) fn new(nodes: &'a BTreeMap<TensorId, NetworkNode>) -> Self {
        Self { nodes }
    }

    /// Remaining tensor ids, ascending
    pub fn ids(&self) -> impl Iterator<Item = TensorId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of remaining tensors
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing is left
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Kind of a remaining tensor
    pub fn kind(&self, id: TensorId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    /// Tensors sharing at least one leg with `id`
    pub fn neighbours(&self, id: TensorId) -> BTreeSet<TensorId> {
        self.nodes
            .get(&id)
            .map(|node| {
                node.legs
                    .iter()
                    .map(|leg| leg.tensor)
                    .filter(|&peer| peer != OUTPUT_TENSOR_ID && peer != id)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Element count of the tensor produced by merging `a` and `b`
    pub fn merged_volume(&self, a: TensorId, b: TensorId) -> Option<usize> {
        let na = self.nodes.get(&a)?;
        let nb = self.nodes.get(&b)?;
        let free = |node: &NetworkNode, other: TensorId| -> Option<usize> {
            node.legs
                .iter()
                .zip(node.tensor.shape())
                .filter(|(leg, _)| leg.tensor != other)
                .try_fold(1usize, |acc, (_, &d)| acc.checked_mul(d))
        };
        free(na, b)?.checked_mul(free(nb, a)?)
    }
}

// ============================================================================
// Strategy Trait
// ============================================================================

/// Picks the next pair of tensors to contract
/// Gantree: ContractionStrategy // 축약 순서 trait
pub trait ContractionStrategy: Send + Sync {
    /// Strategy name for logging
    fn name(&self) -> &'static str;

    /// Next pair to merge, or `None` when fewer than two tensors remain
    fn next_pair(&self, view: &ContractionView<'_>) -> Option<(TensorId, TensorId)>;
}

/// First two remaining ids; merging them takes an outer product when they
/// share no leg
fn first_two(view: &ContractionView<'_>) -> Option<(TensorId, TensorId)> {
    let mut ids = view.ids();
    Some((ids.next()?, ids.next()?))
}

// ============================================================================
// Lowest Id First
// ============================================================================

/// Lowest id tensor with its lowest-id neighbour
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestIdFirst;

impl ContractionStrategy for LowestIdFirst {
    fn name(&self) -> &'static str {
        "lowest-id-first"
    }

    fn next_pair(&self, view: &ContractionView<'_>) -> Option<(TensorId, TensorId)> {
        view.ids()
            .find_map(|id| view.neighbours(id).into_iter().next().map(|n| (id, n)))
            .or_else(|| first_two(view))
    }
}

// ============================================================================
// Ring First
// ============================================================================

/// Merge the state ring into one tensor, then absorb gate and noise tensors
/// in id order
/// Gantree: RingFirst // 링 우선 축약
#[derive(Debug, Clone, Copy, Default)]
pub struct RingFirst;

impl ContractionStrategy for RingFirst {
    fn name(&self) -> &'static str {
        "ring-first"
    }

    fn next_pair(&self, view: &ContractionView<'_>) -> Option<(TensorId, TensorId)> {
        let states: Vec<TensorId> = view
            .ids()
            .filter(|&id| view.kind(id) == Some(NodeKind::State))
            .collect();

        // State tensors first
        for &s in &states {
            let partner = view
                .neighbours(s)
                .into_iter()
                .find(|&n| view.kind(n) == Some(NodeKind::State));
            if let Some(n) = partner {
                return Some((s, n));
            }
        }

        // Then the earliest operator touching the state
        let absorbed = states
            .iter()
            .flat_map(|&s| {
                view.neighbours(s)
                    .into_iter()
                    .filter(|&n| view.kind(n) != Some(NodeKind::State))
                    .map(move |n| (n, s))
            })
            .min();
        if let Some((n, s)) = absorbed {
            return Some((s, n));
        }

        LowestIdFirst.next_pair(view)
    }
}

// ============================================================================
// Contraction Order (configuration)
// ============================================================================

/// Configurable choice of contraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractionOrder {
    /// State ring first, then operators
    #[default]
    RingFirst,
    /// Lowest id pair first
    LowestIdFirst,
}

impl ContractionOrder {
    /// Instantiate the strategy
    pub fn strategy(&self) -> Box<dyn ContractionStrategy> {
        match self {
            ContractionOrder::RingFirst => Box::new(RingFirst),
            ContractionOrder::LowestIdFirst => Box::new(LowestIdFirst),
        }
    }
}

impl fmt::Display for ContractionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leg::TensorLeg;
    use crate::tensor::Tensor;

    fn node(kind: NodeKind, legs: Vec<TensorLeg>) -> NetworkNode {
        let shape = vec![2; legs.len()];
        NetworkNode {
            tensor: Tensor::zeros(shape).unwrap(),
            legs,
            kind,
        }
    }

    /// 1 - 2 are state tensors joined by one bond, 3 is a gate on 2
    fn sample_graph() -> BTreeMap<TensorId, NetworkNode> {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            1,
            node(
                NodeKind::State,
                vec![TensorLeg::new(2, 0), TensorLeg::output(0)],
            ),
        );
        nodes.insert(
            2,
            node(
                NodeKind::State,
                vec![TensorLeg::new(1, 0), TensorLeg::new(3, 1)],
            ),
        );
        nodes.insert(
            3,
            node(
                NodeKind::Gate,
                vec![TensorLeg::output(1), TensorLeg::new(2, 1)],
            ),
        );
        nodes
    }

    #[test]
    fn test_neighbours_skip_output() {
        let nodes = sample_graph();
        let view = ContractionView::new(&nodes);
        assert_eq!(view.neighbours(1).into_iter().collect::<Vec<_>>(), vec![2]);
        assert_eq!(view.neighbours(2).len(), 2);
        assert_eq!(view.merged_volume(1, 2), Some(4));
    }

    #[test]
    fn test_ring_first_merges_states() {
        let nodes = sample_graph();
        let view = ContractionView::new(&nodes);
        assert_eq!(RingFirst.next_pair(&view), Some((1, 2)));
    }

    #[test]
    fn test_ring_first_absorbs_gate() {
        let mut nodes = sample_graph();
        nodes.remove(&1);
        let view = ContractionView::new(&nodes);
        assert_eq!(RingFirst.next_pair(&view), Some((2, 3)));
    }

    #[test]
    fn test_lowest_id_first() {
        let nodes = sample_graph();
        let view = ContractionView::new(&nodes);
        assert_eq!(LowestIdFirst.next_pair(&view), Some((1, 2)));
    }

    #[test]
    fn test_disconnected_falls_back_to_outer_product() {
        let mut nodes = BTreeMap::new();
        nodes.insert(4, node(NodeKind::Gate, vec![TensorLeg::output(0)]));
        nodes.insert(7, node(NodeKind::Gate, vec![TensorLeg::output(1)]));
        let view = ContractionView::new(&nodes);
        assert_eq!(LowestIdFirst.next_pair(&view), Some((4, 7)));
        assert_eq!(RingFirst.next_pair(&view), Some((4, 7)));
    }

    #[test]
    fn test_contraction_order_serde() {
        let order: ContractionOrder = serde_json::from_str("\"lowest_id_first\"").unwrap();
        assert_eq!(order, ContractionOrder::LowestIdFirst);
        assert_eq!(ContractionOrder::default().to_string(), "ring-first");
    }
}

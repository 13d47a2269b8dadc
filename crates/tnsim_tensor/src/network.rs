//! Tensor network graph
//!
//! Gantree: L1_Network → TensorNetwork
//!
//! Tensors live in an arena keyed by small integer ids; connectivity is a
//! per-leg list of `(peer tensor, peer leg)` pairs. Id 0 is the output
//! tensor whose legs are the open qubit legs. Every append keeps the
//! connectivity symmetric or is rejected without touching the network.

use crate::contraction::{ContractionStrategy, ContractionView};
use crate::leg::{TensorId, TensorLeg, OUTPUT_TENSOR_ID};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tnsim_core::constants::tensor::DEFAULT_MAX_TENSOR_ELEMENTS;
use tnsim_core::{SimError, SimResult};

/// Role of a tensor in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Placeholder whose legs are the open legs (id 0)
    Output,
    /// Site of the state ring
    State,
    /// Unitary gate
    Gate,
    /// Kraus channel tensor
    Noise,
}

/// Tensor plus its leg connectivity
#[derive(Debug, Clone)]
pub struct NetworkNode {
    /// Tensor value (owned copy)
    pub tensor: Tensor,
    /// One entry per leg
    pub legs: Vec<TensorLeg>,
    /// Role
    pub kind: NodeKind,
}

/// Tensor waiting to be appended
#[derive(Debug, Clone)]
pub struct PendingTensor {
    /// Tensor value
    pub tensor: Tensor,
    /// Requested connectivity, one entry per leg
    pub legs: Vec<TensorLeg>,
    /// Role
    pub kind: NodeKind,
}

impl PendingTensor {
    /// Create a pending tensor
    pub fn new(tensor: Tensor, legs: Vec<TensorLeg>, kind: NodeKind) -> Self {
        Self { tensor, legs, kind }
    }
}

/// Mutable graph of tensors connected by legs
/// Gantree: TensorNetwork // 텐서 네트워크
#[derive(Debug, Clone)]
pub struct TensorNetwork {
    nodes: BTreeMap<TensorId, NetworkNode>,
    next_id: TensorId,
    max_elements: usize,
}

impl Default for TensorNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl TensorNetwork {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an empty network
    pub fn new() -> Self {
        Self::with_max_elements(DEFAULT_MAX_TENSOR_ELEMENTS)
    }

    /// Create an empty network with an intermediate-size limit
    pub fn with_max_elements(max_elements: usize) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 0,
            max_elements,
        }
    }

    /// Largest tensor a contraction may produce
    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// True until the first tensor is appended
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of tensors, output tensor included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Id the next appended tensor receives
    pub fn next_id(&self) -> TensorId {
        self.next_id
    }

    /// Tensor ids, ascending
    pub fn ids(&self) -> Vec<TensorId> {
        self.nodes.keys().copied().collect()
    }

    /// Node by id
    pub fn node(&self, id: TensorId) -> SimResult<&NetworkNode> {
        self.nodes.get(&id).ok_or(SimError::UnknownTensorId(id))
    }

    /// Tensor by id
    /// Gantree: get_tensor(id) -> Result<&Tensor> // 텐서 조회
    pub fn tensor(&self, id: TensorId) -> SimResult<&Tensor> {
        self.node(id).map(|n| &n.tensor)
    }

    /// Connectivity of a tensor
    pub fn legs(&self, id: TensorId) -> SimResult<&[TensorLeg]> {
        self.node(id).map(|n| n.legs.as_slice())
    }

    /// Number of open legs (rank of the output tensor)
    pub fn num_open_legs(&self) -> usize {
        self.nodes
            .get(&OUTPUT_TENSOR_ID)
            .map(|n| n.legs.len())
            .unwrap_or(0)
    }

    /// Current frontier leg bound to open leg `index`
    pub fn open_leg(&self, index: usize) -> SimResult<TensorLeg> {
        let output = self
            .nodes
            .get(&OUTPUT_TENSOR_ID)
            .ok_or(SimError::EmptyNetwork)?;
        output
            .legs
            .get(index)
            .copied()
            .ok_or(SimError::QubitOutOfRange {
                qubit: index,
                open_legs: output.legs.len(),
            })
    }

    // ========================================================================
    // Append
    // ========================================================================

    /// Append one tensor
    /// Gantree: append_tensor(tensor, legs) -> Result<TensorId> // 텐서 추가
    pub fn append_tensor(
        &mut self,
        tensor: Tensor,
        legs: Vec<TensorLeg>,
        kind: NodeKind,
    ) -> SimResult<TensorId> {
        let ids = self.append_tensors(vec![PendingTensor::new(tensor, legs, kind)])?;
        ids.first().copied().ok_or(SimError::EmptyNetwork)
    }

    fn leg_dim(&self, batch: &[PendingTensor], base: TensorId, target: TensorLeg) -> Option<usize> {
        if target.tensor >= base {
            batch.get(target.tensor - base)?.tensor.dim(target.leg)
        } else {
            self.nodes.get(&target.tensor)?.tensor.dim(target.leg)
        }
    }

    /// Append tensors that may reference each other
    ///
    /// Ids are assigned consecutively from [`next_id`](Self::next_id); the
    /// first tensor of an empty network is the output tensor (id 0). A leg
    /// naming a leg of an existing tensor rewires that leg to point back.
    /// The whole batch is validated before anything is committed.
    pub fn append_tensors(&mut self, batch: Vec<PendingTensor>) -> SimResult<Vec<TensorId>> {
        let base = self.next_id;

        for pending in &batch {
            if pending.legs.len() != pending.tensor.rank() {
                return Err(SimError::LegCountMismatch {
                    rank: pending.tensor.rank(),
                    legs: pending.legs.len(),
                });
            }
        }

        // Leg tables of existing tensors, rewired on a copy
        let mut staged: BTreeMap<TensorId, Vec<TensorLeg>> = BTreeMap::new();
        let mut stale: BTreeSet<TensorId> = BTreeSet::new();

        for (offset, pending) in batch.iter().enumerate() {
            let id = base + offset;
            for (leg, &target) in pending.legs.iter().enumerate() {
                if target == TensorLeg::new(id, leg) {
                    return Err(SimError::AsymmetricLeg {
                        tensor: id,
                        leg,
                        peer: id,
                        peer_leg: leg,
                    });
                }
                let peer_dim =
                    self.leg_dim(&batch, base, target)
                        .ok_or(SimError::DanglingLeg {
                            tensor: id,
                            leg,
                            peer: target.tensor,
                            peer_leg: target.leg,
                        })?;
                let dim = pending.tensor.shape()[leg];
                if peer_dim != dim {
                    return Err(SimError::LegDimensionMismatch {
                        tensor: id,
                        leg,
                        dim,
                        peer: target.tensor,
                        peer_leg: target.leg,
                        peer_dim,
                    });
                }
                if target.tensor < base {
                    if !staged.contains_key(&target.tensor) {
                        let legs = self.legs(target.tensor)?.to_vec();
                        staged.insert(target.tensor, legs);
                    }
                    if let Some(peer_legs) = staged.get_mut(&target.tensor) {
                        let former = peer_legs[target.leg];
                        peer_legs[target.leg] = TensorLeg::new(id, leg);
                        stale.insert(former.tensor);
                    }
                }
            }
        }

        // Symmetry over everything the batch touched
        let legs_of = |id: TensorId| -> Option<&Vec<TensorLeg>> {
            if id >= base {
                batch.get(id - base).map(|p| &p.legs)
            } else {
                staged
                    .get(&id)
                    .or_else(|| self.nodes.get(&id).map(|n| &n.legs))
            }
        };
        let touched: BTreeSet<TensorId> = (base..base + batch.len())
            .chain(staged.keys().copied())
            .chain(stale.iter().copied())
            .collect();
        for &id in &touched {
            let Some(legs) = legs_of(id) else {
                continue;
            };
            for (leg, &peer) in legs.iter().enumerate() {
                let back = legs_of(peer.tensor)
                    .and_then(|l| l.get(peer.leg))
                    .ok_or(SimError::DanglingLeg {
                        tensor: id,
                        leg,
                        peer: peer.tensor,
                        peer_leg: peer.leg,
                    })?;
                if *back != TensorLeg::new(id, leg) {
                    return Err(SimError::AsymmetricLeg {
                        tensor: id,
                        leg,
                        peer: peer.tensor,
                        peer_leg: peer.leg,
                    });
                }
            }
        }

        // Commit
        for (id, legs) in staged {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.legs = legs;
            }
        }
        let count = batch.len();
        for (offset, pending) in batch.into_iter().enumerate() {
            self.nodes.insert(
                base + offset,
                NetworkNode {
                    tensor: pending.tensor,
                    legs: pending.legs,
                    kind: pending.kind,
                },
            );
        }
        self.next_id = base + count;
        log::debug!(
            "appended {} tensor(s) as ids {}..{}",
            count,
            base,
            self.next_id
        );
        Ok((base..self.next_id).collect())
    }

    /// Verify that every leg points to an existing leg that points back
    pub fn check_connectivity(&self) -> SimResult<()> {
        for (&id, node) in &self.nodes {
            for (leg, &peer) in node.legs.iter().enumerate() {
                let back = self
                    .nodes
                    .get(&peer.tensor)
                    .and_then(|n| n.legs.get(peer.leg))
                    .ok_or(SimError::DanglingLeg {
                        tensor: id,
                        leg,
                        peer: peer.tensor,
                        peer_leg: peer.leg,
                    })?;
                if *back != TensorLeg::new(id, leg) {
                    return Err(SimError::AsymmetricLeg {
                        tensor: id,
                        leg,
                        peer: peer.tensor,
                        peer_leg: peer.leg,
                    });
                }
            }
        }
        Ok(())
    }

    /// Drop every tensor and restart ids at 0
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.next_id = 0;
    }

    // ========================================================================
    // Contraction
    // ========================================================================

    /// Contract the network into one tensor and close the epoch
    ///
    /// The result has one leg per open leg, in open-leg order. The network is
    /// empty afterwards, whether or not contraction succeeds.
    /// Gantree: evaluate(strategy) -> Result<Tensor> // 축약
    pub fn contract(&mut self, strategy: &dyn ContractionStrategy) -> SimResult<Tensor> {
        if self.is_empty() {
            return Err(SimError::EmptyNetwork);
        }
        let mut nodes = std::mem::take(&mut self.nodes);
        self.next_id = 0;

        let output = nodes
            .remove(&OUTPUT_TENSOR_ID)
            .ok_or(SimError::UnknownTensorId(OUTPUT_TENSOR_ID))?;
        let num_open = output.legs.len();
        if nodes.is_empty() {
            return Err(SimError::EmptyNetwork);
        }

        let ids: Vec<TensorId> = nodes.keys().copied().collect();
        for id in ids {
            trace_self_loops(&mut nodes, id)?;
        }

        let mut steps = 0usize;
        while nodes.len() > 1 {
            let view = ContractionView::new(&nodes);
            let (a, b) = strategy.next_pair(&view).ok_or(SimError::EmptyNetwork)?;
            let requested = view.merged_volume(a, b).unwrap_or(usize::MAX);
            if requested > self.max_elements {
                return Err(SimError::ResourceExhausted {
                    requested,
                    limit: self.max_elements,
                });
            }
            merge_nodes(&mut nodes, a, b)?;
            steps += 1;
        }

        let survivor = nodes
            .into_values()
            .next()
            .ok_or(SimError::EmptyNetwork)?;
        if survivor.legs.len() != num_open {
            return Err(SimError::LegCountMismatch {
                rank: survivor.tensor.rank(),
                legs: num_open,
            });
        }
        let order = (0..num_open)
            .map(|j| {
                survivor
                    .legs
                    .iter()
                    .position(|l| *l == TensorLeg::output(j))
                    .ok_or(SimError::DanglingLeg {
                        tensor: OUTPUT_TENSOR_ID,
                        leg: j,
                        peer: OUTPUT_TENSOR_ID,
                        peer_leg: j,
                    })
            })
            .collect::<SimResult<Vec<usize>>>()?;

        log::debug!(
            "contracted network in {} step(s) using {}",
            steps,
            strategy.name()
        );
        survivor.tensor.permute(&order)
    }
}

// ============================================================================
// Contraction Helpers
// ============================================================================

/// Point every reference to `(from, old)` at `(to, mapping[old])`
fn relabel(
    nodes: &mut BTreeMap<TensorId, NetworkNode>,
    from: TensorId,
    to: TensorId,
    mapping: &[Option<usize>],
) {
    for node in nodes.values_mut() {
        for leg in &mut node.legs {
            if leg.tensor == from {
                if let Some(Some(new_leg)) = mapping.get(leg.leg) {
                    *leg = TensorLeg::new(to, *new_leg);
                }
            }
        }
    }
}

/// Trace out every leg pair of `id` that connects to itself
fn trace_self_loops(nodes: &mut BTreeMap<TensorId, NetworkNode>, id: TensorId) -> SimResult<()> {
    loop {
        let mapping = {
            let node = nodes.get_mut(&id).ok_or(SimError::UnknownTensorId(id))?;
            let Some(p) = node.legs.iter().position(|l| l.tensor == id) else {
                return Ok(());
            };
            let q = node.legs[p].leg;
            node.tensor = node.tensor.trace_pair(p, q)?;

            let mut next = 0usize;
            let mapping: Vec<Option<usize>> = (0..node.legs.len())
                .map(|old| {
                    if old == p || old == q {
                        None
                    } else {
                        next += 1;
                        Some(next - 1)
                    }
                })
                .collect();
            node.legs = node
                .legs
                .iter()
                .enumerate()
                .filter(|(old, _)| *old != p && *old != q)
                .map(|(_, &l)| l)
                .collect();
            mapping
        };
        relabel(nodes, id, id, &mapping);
    }
}

/// Contract `a` and `b` over all their shared legs into id `min(a, b)`
fn merge_nodes(
    nodes: &mut BTreeMap<TensorId, NetworkNode>,
    a: TensorId,
    b: TensorId,
) -> SimResult<()> {
    let na = nodes.remove(&a).ok_or(SimError::UnknownTensorId(a))?;
    let nb = nodes.remove(&b).ok_or(SimError::UnknownTensorId(b))?;

    let pairs: Vec<(usize, usize)> = na
        .legs
        .iter()
        .enumerate()
        .filter(|(_, l)| l.tensor == b)
        .map(|(p, l)| (p, l.leg))
        .collect();
    let tensor = na.tensor.contract(&nb.tensor, &pairs)?;

    let new_id = a.min(b);
    let mut legs = Vec::with_capacity(tensor.rank());
    let mut map_a = vec![None; na.legs.len()];
    let mut map_b = vec![None; nb.legs.len()];
    for (p, &l) in na.legs.iter().enumerate().filter(|(_, l)| l.tensor != b) {
        map_a[p] = Some(legs.len());
        legs.push(l);
    }
    for (p, &l) in nb.legs.iter().enumerate().filter(|(_, l)| l.tensor != a) {
        map_b[p] = Some(legs.len());
        legs.push(l);
    }
    relabel(nodes, a, new_id, &map_a);
    relabel(nodes, b, new_id, &map_b);

    let kind = if na.kind == NodeKind::State || nb.kind == NodeKind::State {
        NodeKind::State
    } else {
        na.kind
    };
    nodes.insert(new_id, NetworkNode { tensor, legs, kind });
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

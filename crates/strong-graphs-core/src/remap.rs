use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::index;

use crate::distance::DistanceOrder;
use crate::error::GeneratorError;
use crate::loop_arcs::{free_backward_positions, LoopCensus, LoopDemand};
use crate::remaining::determine_vacancies;
use crate::network::{Network, NodeId};

/// Bijection between the labels before and after a remapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMapping {
    old_to_new: Vec<NodeId>,
    new_to_old: Vec<NodeId>,
}

impl NodeMapping {
    pub fn identity(n: u32) -> Self {
        let ids: Vec<NodeId> = (0..n).collect();
        Self {
            old_to_new: ids.clone(),
            new_to_old: ids,
        }
    }

    pub fn from_old_to_new(old_to_new: Vec<NodeId>) -> Result<Self, GeneratorError> {
        let n = old_to_new.len();
        let mut new_to_old = vec![NodeId::MAX; n];
        for (old, &new) in old_to_new.iter().enumerate() {
            let slot = new_to_old
                .get_mut(new as usize)
                .ok_or_else(|| GeneratorError::invariant(format!("label {new} out of range")))?;
            if *slot != NodeId::MAX {
                return Err(GeneratorError::invariant(format!("label {new} assigned twice")));
            }
            *slot = old as NodeId;
        }
        Ok(Self {
            old_to_new,
            new_to_old,
        })
    }

    pub fn new_id(&self, old: NodeId) -> Option<NodeId> {
        self.old_to_new.get(old as usize).copied()
    }

    pub fn old_id(&self, new: NodeId) -> Option<NodeId> {
        self.new_to_old.get(new as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.old_to_new.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_to_new.is_empty()
    }

    /// `(old, new)` pairs in old-label order.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.old_to_new
            .iter()
            .enumerate()
            .map(|(old, &new)| (old as NodeId, new))
    }

    fn get(&self, old: NodeId) -> Result<NodeId, GeneratorError> {
        self.new_id(old)
            .ok_or_else(|| GeneratorError::invariant(format!("node {old} has no mapping")))
    }
}

/// Everything that carries node labels while the instance is assembled.
#[derive(Debug, Clone)]
pub struct Layout {
    pub network: Network,
    pub tree_arcs: BTreeSet<(NodeId, NodeId)>,
    pub distances: Vec<i64>,
    pub order: DistanceOrder,
    pub source: NodeId,
}

impl Layout {
    /// New layout with every label passed through `mapping`. Weights are untouched.
    pub fn relabel(&self, mapping: &NodeMapping) -> Result<Layout, GeneratorError> {
        let n = self.distances.len();
        if mapping.len() != n {
            return Err(GeneratorError::invariant(format!(
                "mapping covers {} of {n} nodes",
                mapping.len()
            )));
        }
        let network = self.network.relabel(mapping)?;
        let tree_arcs = self
            .tree_arcs
            .iter()
            .map(|&(u, v)| -> Result<_, GeneratorError> { Ok((mapping.get(u)?, mapping.get(v)?)) })
            .collect::<Result<BTreeSet<_>, _>>()?;
        let mut distances = vec![0_i64; n];
        for (old, new) in mapping.pairs() {
            distances[new as usize] = self.distances[old as usize];
        }
        let order = self
            .order
            .order
            .iter()
            .map(|&node| mapping.get(node))
            .collect::<Result<Vec<_>, _>>()?;
        let mut position = vec![0usize; n];
        for (pos, &node) in order.iter().enumerate() {
            position[node as usize] = pos;
        }
        Ok(Layout {
            network,
            tree_arcs,
            distances,
            order: DistanceOrder { order, position },
            source: mapping.get(self.source)?,
        })
    }
}

pub fn remapping_required(network: &Network, order: &DistanceOrder, negative_loop: usize) -> bool {
    negative_loop > free_backward_positions(network, order).len()
}

/// Loop census of `network` as it reads once label `l` sits at order
/// position `at[l]`.
fn census_under(network: &Network, order: &DistanceOrder, at: &[usize]) -> LoopCensus {
    let n = at.len();
    let mut census = LoopCensus {
        missing: 0,
        free_backward: 0,
    };
    for a in 0..n {
        let b = (a + 1) % n;
        if network.has_arc(order.order[at[a]], order.order[at[b]]) {
            continue;
        }
        census.missing += 1;
        if at[a] > at[b] {
            census.free_backward += 1;
        }
    }
    census
}

/// Mapping under which the loop has enough free backward positions for `demand`.
///
/// Labels start out as the current ones laid along the order. Loop
/// predecessors `a` are drawn one at a time and labels `a` and `a + 1` are
/// pinned to positions `n - 1 - a` and `n - 2 - a`; pinned labels never move
/// again. Pinning stops once the relabeled loop can host `demand`, at the
/// latest when every label is pinned and the order is reversed. The node at
/// position `p` then takes the label found at `p`.
pub fn create_mapping(
    rng: &mut StdRng,
    layout: &Layout,
    demand: &LoopDemand,
) -> Result<NodeMapping, GeneratorError> {
    let order = &layout.order;
    let n = order.len();
    if demand.sampled >= n {
        return Err(GeneratorError::infeasible(format!(
            "{} negative loop arcs leave no non-negative loop arc on {n} nodes",
            demand.sampled
        )));
    }
    let arc_count = layout.network.arc_count();
    let backward_vacancy = determine_vacancies(&layout.network, order).total_backward();
    let mut labels: Vec<NodeId> = order.order.clone();
    let mut at = order.position.clone();
    let mut pinned = vec![false; n];

    let mut pin = |label: NodeId, labels: &mut Vec<NodeId>, at: &mut Vec<usize>| {
        if pinned[label as usize] {
            return;
        }
        let target = n - 1 - label as usize;
        let from = at[label as usize];
        let displaced = labels[target];
        labels.swap(from, target);
        at[label as usize] = target;
        at[displaced as usize] = from;
        pinned[label as usize] = true;
    };

    let mut checkpoint = demand.sampled.clamp(1, n - 1);
    for (drawn, a) in index::sample(rng, n - 1, n - 1).iter().enumerate() {
        pin(a as NodeId, &mut labels, &mut at);
        pin(a as NodeId + 1, &mut labels, &mut at);
        if drawn + 1 < checkpoint {
            continue;
        }
        let census = census_under(&layout.network, order, &at);
        if census.free_backward >= demand.wanted(census, arc_count, backward_vacancy) {
            break;
        }
        checkpoint = (checkpoint * 2).min(n - 1);
    }

    let mut old_to_new = vec![0 as NodeId; n];
    for (pos, &old) in order.order.iter().enumerate() {
        old_to_new[old as usize] = labels[pos];
    }
    NodeMapping::from_old_to_new(old_to_new)
}

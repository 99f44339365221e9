use rand::rngs::StdRng;
use rand::seq::index;

use crate::distance::DistanceOrder;
use crate::error::GeneratorError;
use crate::network::{Network, NodeId};
use crate::weights::WeightSampler;

/// Successor of `u` on the loop, wrapping at `n`.
pub fn loop_successor(u: NodeId, n: usize) -> NodeId {
    ((u as usize + 1) % n) as NodeId
}

/// Loop predecessors whose arc is backward in `order` and not yet in `network`.
pub fn free_backward_positions(network: &Network, order: &DistanceOrder) -> Vec<NodeId> {
    let n = order.len();
    (0..n as NodeId)
        .filter(|&u| {
            let v = loop_successor(u, n);
            order.is_backward(u, v) && !network.has_arc(u, v)
        })
        .collect()
}

pub fn missing_loop_arcs(network: &Network) -> usize {
    let n = network.node_count();
    (0..n as NodeId)
        .filter(|&u| !network.has_arc(u, loop_successor(u, n)))
        .count()
}

/// Loop positions still to be filled, and how many of them are backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopCensus {
    pub missing: usize,
    pub free_backward: usize,
}

pub fn loop_census(network: &Network, order: &DistanceOrder) -> LoopCensus {
    LoopCensus {
        missing: missing_loop_arcs(network),
        free_backward: free_backward_positions(network, order).len(),
    }
}

/// Non-positive arcs the loop stage is asked for, and what the remaining
/// stage must still be able to place after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopDemand {
    pub arc_target: usize,
    /// Non-positive arcs still owed once the tree is in place.
    pub negatives_left: usize,
    /// Drawn share of `negatives_left` for the loop.
    pub sampled: usize,
}

impl LoopDemand {
    /// Fewest non-positive loop arcs that leave the remaining stage enough
    /// arcs and backward pairs for the rest of `negatives_left`.
    ///
    /// `arc_count` and `backward_vacancy` describe the network before the loop
    /// is completed.
    pub fn required(&self, census: LoopCensus, arc_count: usize, backward_vacancy: usize) -> usize {
        let arc_room = self.arc_target.saturating_sub(arc_count + census.missing);
        let backward_room = backward_vacancy.saturating_sub(census.free_backward);
        self.negatives_left.saturating_sub(arc_room.min(backward_room))
    }

    pub fn wanted(&self, census: LoopCensus, arc_count: usize, backward_vacancy: usize) -> usize {
        self.sampled
            .max(self.required(census, arc_count, backward_vacancy))
    }
}

/// `dist[head] - dist[tail]`, the smallest weight an arc may carry.
pub(crate) fn distance_gap(distances: &[i64], tail: NodeId, head: NodeId) -> Result<i64, GeneratorError> {
    distances[head as usize]
        .checked_sub(distances[tail as usize])
        .ok_or_else(|| GeneratorError::invariant(format!("distance gap of ({tail}, {head}) overflows")))
}

/// Weight of an arc that must not undercut `dist[head]`; positive whenever the
/// sampler allows it.
pub(crate) fn non_negative_weight(
    rng: &mut StdRng,
    weights: &dyn WeightSampler,
    gap: i64,
) -> Result<i64, GeneratorError> {
    weights
        .sample_positive(rng)
        .checked_add(gap.max(0))
        .ok_or_else(|| GeneratorError::invariant("arc weight overflow"))
}

/// Weight in `[gap, 0]` of a non-positive arc.
pub(crate) fn non_positive_weight(
    rng: &mut StdRng,
    weights: &dyn WeightSampler,
    tail: NodeId,
    head: NodeId,
    gap: i64,
) -> Result<i64, GeneratorError> {
    if gap > 0 {
        return Err(GeneratorError::invariant(format!(
            "arc ({tail}, {head}) cannot be non-positive with distance gap {gap}"
        )));
    }
    Ok(weights.sample(rng, Some(gap), Some(0)))
}

/// Adds every missing arc `u -> u+1 (mod n)` and returns how many of them
/// were made non-positive.
pub fn complete_loop(
    rng: &mut StdRng,
    network: &mut Network,
    distances: &[i64],
    order: &DistanceOrder,
    negative_loop: usize,
    weights: &dyn WeightSampler,
) -> Result<usize, GeneratorError> {
    let n = network.node_count();
    let candidates = free_backward_positions(network, order);
    let negative = negative_loop.min(candidates.len());
    let mut is_negative = vec![false; n];
    for idx in index::sample(rng, candidates.len(), negative).iter() {
        is_negative[candidates[idx] as usize] = true;
    }

    for u in 0..n as NodeId {
        let v = loop_successor(u, n);
        if network.has_arc(u, v) {
            continue;
        }
        let gap = distance_gap(distances, u, v)?;
        let weight = if is_negative[u as usize] {
            non_positive_weight(rng, weights, u, v, gap)?
        } else {
            non_negative_weight(rng, weights, gap)?
        };
        network.add_arc(u, v, weight)?;
    }
    Ok(negative)
}

use std::ops::Range;

use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use tracing::debug;

use crate::distance::DistanceOrder;
use crate::error::GeneratorError;
use crate::loop_arcs::{distance_gap, non_negative_weight, non_positive_weight};
use crate::network::{Network, NodeId};
use crate::weights::WeightSampler;

pub const MAX_SAMPLING_ROUNDS: usize = 64;

/// Extra draws per round to absorb predecessors that already have an arc.
const SAMPLING_SLACK: usize = 2;

/// Missing inward arcs per node, split by the side of the order they would come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vacancies {
    pub backward: Vec<usize>,
    pub forward: Vec<usize>,
}

impl Vacancies {
    pub fn total_backward(&self) -> usize {
        self.backward.iter().sum()
    }

    pub fn total_forward(&self) -> usize {
        self.forward.iter().sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingQuota {
    pub negative: usize,
    pub positive: usize,
}

pub fn determine_vacancies(network: &Network, order: &DistanceOrder) -> Vacancies {
    let n = order.len();
    let mut backward = vec![0usize; n];
    let mut forward = vec![0usize; n];
    for v in 0..n as NodeId {
        let pos = order.position_of(v);
        let mut later = 0;
        let mut earlier = 0;
        for (u, _) in network.predecessors(v) {
            if order.position_of(u) > pos {
                later += 1;
            } else {
                earlier += 1;
            }
        }
        backward[v as usize] = (n - 1 - pos).saturating_sub(later);
        forward[v as usize] = pos.saturating_sub(earlier);
    }
    Vacancies { backward, forward }
}

/// Spreads `quantity` units over the slots of `capacity`, one unit at a time.
pub fn distribute(
    rng: &mut StdRng,
    capacity: &[usize],
    quantity: usize,
) -> Result<Vec<usize>, GeneratorError> {
    let mut allocation = vec![0usize; capacity.len()];
    let mut candidates: Vec<usize> = (0..capacity.len()).filter(|&i| capacity[i] > 0).collect();
    for placed in 0..quantity {
        if candidates.is_empty() {
            return Err(GeneratorError::infeasible(format!(
                "capacity exhausted after {placed} of {quantity} units"
            )));
        }
        let pick = rng.gen_range(0..candidates.len());
        let slot = candidates[pick];
        allocation[slot] += 1;
        if allocation[slot] == capacity[slot] {
            candidates.swap_remove(pick);
        }
    }
    Ok(allocation)
}

pub fn remaining_quota(
    arc_target: usize,
    arc_count: usize,
    negatives_left: usize,
    vacancies: &Vacancies,
) -> RemainingQuota {
    let remaining = arc_target.saturating_sub(arc_count);
    let negative = negatives_left
        .min(remaining)
        .min(vacancies.total_backward());
    RemainingQuota {
        negative,
        positive: remaining - negative,
    }
}

/// Draws `amount` distinct tails for arcs into `head`, taken from the order
/// positions in `positions` and skipping tails that already have such an arc.
pub fn sample_predecessors(
    rng: &mut StdRng,
    network: &Network,
    order: &DistanceOrder,
    head: NodeId,
    positions: Range<usize>,
    amount: usize,
) -> Result<Vec<NodeId>, GeneratorError> {
    if amount == 0 {
        return Ok(Vec::new());
    }
    let len = positions.len();
    let exhausted = |rounds| GeneratorError::SamplingExhausted {
        node: head,
        requested: amount,
        rounds,
    };
    if amount > len {
        return Err(exhausted(0));
    }

    let mut picked = Vec::with_capacity(amount);
    let mut taken = vec![false; len];
    let mut want = (amount + SAMPLING_SLACK).min(len);
    for round in 1..=MAX_SAMPLING_ROUNDS {
        for idx in index::sample(rng, len, want).iter() {
            if picked.len() == amount {
                break;
            }
            let tail = order.order[positions.start + idx];
            if taken[idx] || network.has_arc(tail, head) {
                continue;
            }
            taken[idx] = true;
            picked.push(tail);
        }
        if picked.len() == amount {
            return Ok(picked);
        }
        if want == len {
            return Err(exhausted(round));
        }
        want = (want * 2).min(len);
    }
    Err(exhausted(MAX_SAMPLING_ROUNDS))
}

/// Fills the network up to `arc_target` arcs; returns the number of
/// non-positive arcs added.
pub fn gen_remaining_arcs(
    rng: &mut StdRng,
    network: &mut Network,
    distances: &[i64],
    order: &DistanceOrder,
    arc_target: usize,
    negatives_left: usize,
    weights: &dyn WeightSampler,
) -> Result<usize, GeneratorError> {
    let n = order.len();
    let vacancies = determine_vacancies(network, order);
    let quota = remaining_quota(arc_target, network.arc_count(), negatives_left, &vacancies);
    debug!(
        negative = quota.negative,
        positive = quota.positive,
        backward_vacancies = vacancies.total_backward(),
        forward_vacancies = vacancies.total_forward(),
        "remaining arc quota"
    );

    let negative = distribute(rng, &vacancies.backward, quota.negative)?;
    let combined: Vec<usize> = (0..n)
        .map(|v| vacancies.backward[v] - negative[v] + vacancies.forward[v])
        .collect();
    let positive = distribute(rng, &combined, quota.positive)?;

    for (pos, &v) in order.order.iter().enumerate() {
        let idx = v as usize;
        let (neg, pos_total) = (negative[idx], positive[idx]);
        if neg + pos_total == 0 {
            continue;
        }
        let lo = pos_total.saturating_sub(vacancies.forward[idx]);
        let hi = pos_total.min(vacancies.backward[idx] - neg);
        let positive_backward = if lo >= hi { lo } else { rng.gen_range(lo..=hi) };

        let backward = sample_predecessors(rng, network, order, v, pos + 1..n, neg + positive_backward)?;
        let forward = sample_predecessors(rng, network, order, v, 0..pos, pos_total - positive_backward)?;

        for (k, &u) in backward.iter().enumerate() {
            let gap = distance_gap(distances, u, v)?;
            let weight = if k < neg {
                non_positive_weight(rng, weights, u, v, gap)?
            } else {
                non_negative_weight(rng, weights, gap)?
            };
            network.add_arc(u, v, weight)?;
        }
        for &u in &forward {
            let gap = distance_gap(distances, u, v)?;
            network.add_arc(u, v, non_negative_weight(rng, weights, gap)?)?;
        }
    }
    Ok(quota.negative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{determine_order, shortest_path};
    use crate::weights::UniformWeights;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn path(weights: &[i64]) -> (Network, Vec<i64>, DistanceOrder) {
        let n = weights.len() as u32 + 1;
        let mut network = Network::with_nodes(n);
        let mut tree = BTreeSet::new();
        for (u, &w) in weights.iter().enumerate() {
            let u = u as NodeId;
            network.add_arc(u, u + 1, w).unwrap();
            tree.insert((u, u + 1));
        }
        let paths = shortest_path(&network, &tree, 0).unwrap();
        let order = determine_order(&paths);
        (network, paths.distances, order)
    }

    #[test]
    fn vacancies_subtract_existing_predecessors() {
        let (network, _, order) = path(&[1, 1, 1]);
        let vacancies = determine_vacancies(&network, &order);
        assert_eq!(vacancies.backward, vec![3, 2, 1, 0]);
        assert_eq!(vacancies.forward, vec![0, 0, 1, 2]);
        assert_eq!(vacancies.total_backward() + vacancies.total_forward(), 12 - 3);
    }

    #[test]
    fn distribute_respects_capacity() {
        let mut rng = StdRng::seed_from_u64(21);
        let capacity = [3, 0, 5, 1];
        let allocation = distribute(&mut rng, &capacity, 9).unwrap();
        assert_eq!(allocation, vec![3, 0, 5, 1]);
        let partial = distribute(&mut rng, &capacity, 4).unwrap();
        assert_eq!(partial.iter().sum::<usize>(), 4);
        assert!(partial.iter().zip(capacity).all(|(a, c)| *a <= c));
        assert!(distribute(&mut rng, &capacity, 10).is_err());
    }

    #[test]
    fn quota_is_bounded_by_backward_room() {
        let vacancies = Vacancies {
            backward: vec![2, 1, 0],
            forward: vec![0, 1, 2],
        };
        assert_eq!(
            remaining_quota(10, 4, 8, &vacancies),
            RemainingQuota { negative: 3, positive: 3 }
        );
        assert_eq!(
            remaining_quota(3, 4, 8, &vacancies),
            RemainingQuota { negative: 0, positive: 0 }
        );
    }

    #[test]
    fn predecessors_skip_existing_arcs() {
        let (mut network, _, order) = path(&[1, 1, 1, 1, 1]);
        network.add_arc(0, 5, 9).unwrap();
        network.add_arc(2, 5, 9).unwrap();
        let mut rng = StdRng::seed_from_u64(6);
        let tails = sample_predecessors(&mut rng, &network, &order, 5, 0..5, 2).unwrap();
        let mut sorted = tails.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 3]);
        assert!(sample_predecessors(&mut rng, &network, &order, 5, 0..5, 3).is_err());
        assert!(sample_predecessors(&mut rng, &network, &order, 5, 0..2, 3).is_err());
    }

    #[test]
    fn fills_up_to_target_with_optimal_weights() {
        let (mut network, distances, order) = path(&[4, -2, 7, -5, 3, 1, -6]);
        let weights = UniformWeights::new(-30, 30).unwrap();
        let mut rng = StdRng::seed_from_u64(10);
        let negatives =
            gen_remaining_arcs(&mut rng, &mut network, &distances, &order, 30, 6, &weights)
                .unwrap();
        assert_eq!(network.arc_count(), 30);
        assert_eq!(negatives, 6);
        // Three negative tree arcs plus the six placed here.
        let non_positive = network.arcs().filter(|arc| arc.weight <= 0).count();
        assert_eq!(non_positive, 3 + 6);
        for arc in network.arcs() {
            let (u, v) = (arc.tail as usize, arc.head as usize);
            assert!(distances[u] + arc.weight >= distances[v]);
        }
    }
}

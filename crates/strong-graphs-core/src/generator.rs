use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, instrument, Level};

use crate::distance::{determine_order, shortest_path};
use crate::error::GeneratorError;
use crate::loop_arcs::{complete_loop, loop_census, missing_loop_arcs, LoopDemand};
use crate::negative::{negative_in_loop, negative_in_tree, total_negative, NegativeBudget};
use crate::network::{Network, NodeId};
use crate::params::{validate, validate_weights};
use crate::remaining::{determine_vacancies, gen_remaining_arcs};
use crate::remap::{create_mapping, remapping_required, Layout, NodeMapping};
use crate::tree::OptimalTree;
use crate::weights::WeightSampler;

/// A generated network with its shortest-path certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub network: Network,
    pub tree_arcs: BTreeSet<(NodeId, NodeId)>,
    pub distances: Vec<i64>,
    /// Relabeling applied after the tree was built, if one was needed.
    pub remapping: Option<NodeMapping>,
    pub source: NodeId,
    pub budget: NegativeBudget,
}

impl Instance {
    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.network.arc_count()
    }

    pub fn sum_of_distances(&self) -> i128 {
        self.distances.iter().map(|&d| i128::from(d)).sum()
    }

    pub fn non_positive_arc_count(&self) -> usize {
        self.network.arcs().filter(|arc| arc.weight <= 0).count()
    }

    pub fn negative_arc_count(&self) -> usize {
        self.network.arcs().filter(|arc| arc.weight < 0).count()
    }

    /// Checks the distances against every arc: no arc shortens a distance,
    /// tree arcs are tight, and the source sits at 0.
    pub fn verify(&self) -> Result<(), GeneratorError> {
        if self.distances.len() != self.node_count() {
            return Err(GeneratorError::invariant(format!(
                "{} distances for {} nodes",
                self.distances.len(),
                self.node_count()
            )));
        }
        if self.distances.get(self.source as usize) != Some(&0) {
            return Err(GeneratorError::invariant(format!(
                "source {} is not at distance 0",
                self.source
            )));
        }
        for arc in self.network.arcs() {
            let reach = i128::from(self.distances[arc.tail as usize]) + i128::from(arc.weight);
            let head = i128::from(self.distances[arc.head as usize]);
            if reach < head {
                return Err(GeneratorError::invariant(format!(
                    "arc ({}, {}) with weight {} shortens node {}",
                    arc.tail, arc.head, arc.weight, arc.head
                )));
            }
            if reach != head && self.tree_arcs.contains(&(arc.tail, arc.head)) {
                return Err(GeneratorError::invariant(format!(
                    "tree arc ({}, {}) is not tight",
                    arc.tail, arc.head
                )));
            }
        }
        if let Some(&(u, v)) = self
            .tree_arcs
            .iter()
            .find(|&&(u, v)| !self.network.has_arc(u, v))
        {
            return Err(GeneratorError::invariant(format!(
                "tree arc ({u}, {v}) missing from the network"
            )));
        }
        Ok(())
    }
}

pub fn generate<W: WeightSampler>(
    seed: u64,
    node_count: u32,
    arc_count: u32,
    negative_ratio: f64,
    weights: &W,
) -> Result<Instance, GeneratorError> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with_rng(&mut rng, node_count, arc_count, negative_ratio, weights)
}

#[instrument(level = Level::DEBUG, skip_all, fields(
    n = node_count,
    m = arc_count,
    r = negative_ratio,
))]
pub fn generate_with_rng(
    rng: &mut StdRng,
    node_count: u32,
    arc_count: u32,
    negative_ratio: f64,
    weights: &dyn WeightSampler,
) -> Result<Instance, GeneratorError> {
    validate(node_count, arc_count, negative_ratio)?;
    validate_weights(node_count, weights)?;
    let n = node_count as usize;
    let m = arc_count as usize;

    let tree = OptimalTree::build(rng, node_count, m)?;
    let total = total_negative(n, m, negative_ratio);
    let tree_negative = negative_in_tree(rng, n, m, total)?;
    let mut network = Network::with_nodes(node_count);
    tree.insert_weighted(rng, &mut network, tree_negative, weights)?;
    let tree_arcs = tree.arc_set();
    debug!(
        total_negative = total,
        tree_negative,
        loop_arcs_in_tree = tree.loop_predecessors.len(),
        "tree built"
    );

    let paths = shortest_path(&network, &tree_arcs, 0)?;
    let order = determine_order(&paths);
    let negatives_left = total - tree_negative;
    let demand = LoopDemand {
        arc_target: m,
        negatives_left,
        sampled: negative_in_loop(rng, n, m, total, tree_negative, missing_loop_arcs(&network))?,
    };

    let mut layout = Layout {
        network,
        tree_arcs,
        distances: paths.distances,
        order,
        source: 0,
    };
    // Relabeling keeps every node at its position, so tree arcs stay on
    // the same side of the order.
    let tree_arc_count = layout.network.arc_count();
    let backward_vacancy = determine_vacancies(&layout.network, &layout.order).total_backward();
    let census = loop_census(&layout.network, &layout.order);
    let wanted = demand.wanted(census, tree_arc_count, backward_vacancy);
    let remapping = if remapping_required(&layout.network, &layout.order, wanted) {
        let mapping = create_mapping(rng, &layout, &demand)?;
        layout = layout.relabel(&mapping)?;
        debug!(wanted, source = layout.source, "nodes remapped");
        Some(mapping)
    } else {
        None
    };

    let census = loop_census(&layout.network, &layout.order);
    let loop_target = demand
        .wanted(census, tree_arc_count, backward_vacancy)
        .min(census.free_backward);
    let loop_arcs = complete_loop(
        rng,
        &mut layout.network,
        &layout.distances,
        &layout.order,
        loop_target,
        weights,
    )?;
    let remaining = gen_remaining_arcs(
        rng,
        &mut layout.network,
        &layout.distances,
        &layout.order,
        m,
        negatives_left.saturating_sub(loop_arcs),
        weights,
    )?;

    let budget = NegativeBudget {
        target: total,
        tree: tree_negative,
        loop_arcs,
        remaining,
    };
    if budget.shortfall() > 0 {
        return Err(GeneratorError::infeasible(format!(
            "placed {} of {} non-positive arcs (tree {}, loop {}, remaining {})",
            budget.realized(),
            budget.target,
            budget.tree,
            budget.loop_arcs,
            budget.remaining
        )));
    }

    let instance = Instance {
        network: layout.network,
        tree_arcs: layout.tree_arcs,
        distances: layout.distances,
        remapping,
        source: layout.source,
        budget,
    };
    instance.verify()?;
    debug!(
        arcs = instance.arc_count(),
        non_positive = instance.non_positive_arc_count(),
        "instance generated"
    );
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::UniformWeights;

    #[test]
    fn small_instance_is_optimal_and_strong() {
        let weights = UniformWeights::default();
        let instance = generate(1, 12, 40, 0.3, &weights).unwrap();
        assert_eq!(instance.node_count(), 12);
        assert!(instance.arc_count() >= 40);
        assert!(instance.network.reaches_all_from(instance.source));
        assert!(instance.network.reached_by_all(instance.source));
        assert!(!instance.network.has_negative_cycle());
        assert_eq!(instance.tree_arcs.len(), 11);
        instance.verify().unwrap();
    }

    #[test]
    fn verify_rejects_a_loose_tree_arc() {
        let weights = UniformWeights::default();
        let mut instance = generate(4, 8, 20, 0.2, &weights).unwrap();
        let node = (instance.source + 1) % 8;
        instance.distances[node as usize] += 1;
        assert!(matches!(instance.verify(), Err(GeneratorError::Invariant(_))));
    }

    #[test]
    fn invalid_parameters_are_rejected_up_front() {
        let weights = UniformWeights::default();
        assert!(matches!(
            generate(0, 1, 4, 0.1, &weights),
            Err(GeneratorError::InvalidParameters(_))
        ));
        assert!(matches!(
            generate(0, 10, 9, 0.1, &weights),
            Err(GeneratorError::InvalidParameters(_))
        ));
        assert!(matches!(
            generate(0, 10, 20, 1.5, &weights),
            Err(GeneratorError::InvalidParameters(_))
        ));
    }
}

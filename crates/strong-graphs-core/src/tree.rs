use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::error::GeneratorError;
use crate::network::{Network, NodeId};
use crate::weights::WeightSampler;

pub const NO_PARENT: NodeId = NodeId::MAX;

/// Shortest-path arborescence rooted at node 0.
///
/// `arcs` lists the tree arcs in the order they were attached; the weight
/// assignment relies on that order to decide which arcs are non-positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimalTree {
    pub parent: Vec<NodeId>,
    pub arcs: Vec<(NodeId, NodeId)>,
    pub loop_predecessors: Vec<NodeId>,
}

/// Tree arcs that must coincide with loop positions so that the rest of the
/// loop still fits in `m` arcs.
pub fn minimum_loop_arcs(n: usize, m: usize) -> usize {
    (2 * n).saturating_sub(1).saturating_sub(m)
}

struct Attach {
    parent: Vec<NodeId>,
    in_tree: Vec<bool>,
    tree_nodes: Vec<NodeId>,
    arcs: Vec<(NodeId, NodeId)>,
    is_loop_predecessor: Vec<bool>,
}

impl Attach {
    fn attach(&mut self, u: NodeId, v: NodeId) {
        self.parent[v as usize] = u;
        self.in_tree[v as usize] = true;
        self.tree_nodes.push(v);
        self.arcs.push((u, v));
    }

    fn dive(&mut self, mut u: NodeId) {
        while self.is_loop_predecessor[u as usize] {
            self.attach(u, u + 1);
            u += 1;
        }
    }
}

impl OptimalTree {
    pub fn build(rng: &mut StdRng, node_count: u32, arc_count: usize) -> Result<Self, GeneratorError> {
        let n = node_count as usize;
        if n < 2 {
            return Err(GeneratorError::invalid("a tree needs at least two nodes"));
        }
        if arc_count <= n - 1 {
            return Err(GeneratorError::invalid(format!(
                "{arc_count} arcs cannot hold a tree and a loop on {n} nodes"
            )));
        }

        let nb_loop = minimum_loop_arcs(n, arc_count);
        let loop_predecessors: Vec<NodeId> = index::sample(rng, n - 1, nb_loop)
            .iter()
            .map(|u| u as NodeId)
            .collect();
        let mut is_loop_predecessor = vec![false; n];
        let mut has_loop_parent = vec![false; n];
        for &u in &loop_predecessors {
            is_loop_predecessor[u as usize] = true;
            has_loop_parent[u as usize + 1] = true;
        }

        let mut state = Attach {
            parent: vec![NO_PARENT; n],
            in_tree: vec![false; n],
            tree_nodes: Vec::with_capacity(n),
            arcs: Vec::with_capacity(n - 1),
            is_loop_predecessor,
        };
        state.in_tree[0] = true;
        state.tree_nodes.push(0);

        // Nodes reached by diving get their parent from the loop.
        let mut parentless: Vec<NodeId> = (1..node_count)
            .filter(|&v| !has_loop_parent[v as usize])
            .collect();

        if state.is_loop_predecessor[0] {
            state.dive(0);
        } else {
            let pick = rng.gen_range(0..parentless.len());
            let v = parentless.swap_remove(pick);
            state.attach(0, v);
            state.dive(v);
        }

        parentless.shuffle(rng);
        for v in parentless {
            let u = state.tree_nodes[rng.gen_range(0..state.tree_nodes.len())];
            state.attach(u, v);
            state.dive(v);
        }

        if state.arcs.len() != n - 1 || state.in_tree.iter().any(|reached| !reached) {
            return Err(GeneratorError::invariant(format!(
                "tree construction produced {} arcs for {n} nodes",
                state.arcs.len()
            )));
        }

        Ok(Self {
            parent: state.parent,
            arcs: state.arcs,
            loop_predecessors,
        })
    }

    pub fn arc_set(&self) -> BTreeSet<(NodeId, NodeId)> {
        self.arcs.iter().copied().collect()
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.arcs
            .iter()
            .filter(move |(u, _)| *u == node)
            .map(|&(_, v)| v)
    }

    /// Inserts the tree arcs, the first `negative_count` with a non-positive
    /// weight and the rest positive where the sampler allows.
    pub fn insert_weighted(
        &self,
        rng: &mut StdRng,
        network: &mut Network,
        negative_count: usize,
        weights: &dyn WeightSampler,
    ) -> Result<(), GeneratorError> {
        if negative_count > self.arcs.len() {
            return Err(GeneratorError::infeasible(format!(
                "{negative_count} negative tree arcs requested from {} tree arcs",
                self.arcs.len()
            )));
        }
        for (idx, &(u, v)) in self.arcs.iter().enumerate() {
            let weight = if idx < negative_count {
                weights.sample(rng, None, Some(0))
            } else {
                weights.sample_positive(rng)
            };
            network.add_arc(u, v, weight)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::UniformWeights;
    use rand::SeedableRng;

    #[test]
    fn tree_covers_all_nodes() {
        let mut rng = StdRng::seed_from_u64(42);
        let tree = OptimalTree::build(&mut rng, 12, 40).unwrap();
        assert_eq!(tree.arcs.len(), 11);
        assert_eq!(tree.parent[0], NO_PARENT);
        for node in 1..12 {
            assert_ne!(tree.parent[node], NO_PARENT);
        }
        assert!(tree.children(0).count() >= 1);
        assert_eq!(tree.arc_set().len(), 11);
    }

    #[test]
    fn sparse_budget_forces_loop_arcs_into_tree() {
        let mut rng = StdRng::seed_from_u64(5);
        let tree = OptimalTree::build(&mut rng, 10, 14).unwrap();
        assert_eq!(minimum_loop_arcs(10, 14), 5);
        assert_eq!(tree.loop_predecessors.len(), 5);
        let arcs = tree.arc_set();
        for &u in &tree.loop_predecessors {
            assert!(arcs.contains(&(u, u + 1)));
        }
    }

    #[test]
    fn minimal_arc_budget_yields_a_path() {
        let mut rng = StdRng::seed_from_u64(9);
        let tree = OptimalTree::build(&mut rng, 6, 6).unwrap();
        let expected: Vec<_> = (0..5).map(|u| (u, u + 1)).collect();
        assert_eq!(tree.arcs, expected);
    }

    #[test]
    fn build_is_deterministic() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let tree_a = OptimalTree::build(&mut rng_a, 30, 100).unwrap();
        let tree_b = OptimalTree::build(&mut rng_b, 30, 100).unwrap();
        assert_eq!(tree_a, tree_b);
    }

    #[test]
    fn rejects_arc_budget_below_tree_size() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(OptimalTree::build(&mut rng, 5, 4).is_err());
        assert!(OptimalTree::build(&mut rng, 1, 4).is_err());
    }

    #[test]
    fn first_arcs_receive_non_positive_weights() {
        let mut rng = StdRng::seed_from_u64(11);
        let tree = OptimalTree::build(&mut rng, 8, 20).unwrap();
        let mut network = Network::with_nodes(8);
        let weights = UniformWeights::new(-50, 50).unwrap();
        tree.insert_weighted(&mut rng, &mut network, 3, &weights).unwrap();
        for (idx, &(u, v)) in tree.arcs.iter().enumerate() {
            let w = network.weight(u, v).unwrap();
            if idx < 3 {
                assert!(w <= 0);
            } else {
                assert!(w >= 1);
            }
        }
    }
}

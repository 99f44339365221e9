use std::collections::{BTreeSet, VecDeque};

use crate::error::GeneratorError;
use crate::network::{Network, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPaths {
    pub distances: Vec<i64>,
    /// Nodes in the order the tree search discovered them, source first.
    pub discovery: Vec<NodeId>,
}

/// Nodes sorted by non-decreasing distance; equal distances keep discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceOrder {
    pub order: Vec<NodeId>,
    pub position: Vec<usize>,
}

impl DistanceOrder {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub fn position_of(&self, node: NodeId) -> usize {
        self.position[node as usize]
    }

    /// An arc `tail -> head` points back towards the source side of the order.
    pub fn is_backward(&self, tail: NodeId, head: NodeId) -> bool {
        self.position[tail as usize] > self.position[head as usize]
    }

    /// Backward loop positions `u -> u+1 (mod n)`.
    pub fn backward_loop_positions(&self) -> usize {
        let n = self.order.len();
        (0..n)
            .filter(|&u| self.is_backward(u as NodeId, ((u + 1) % n) as NodeId))
            .count()
    }
}

pub fn shortest_path(
    network: &Network,
    tree_arcs: &BTreeSet<(NodeId, NodeId)>,
    source: NodeId,
) -> Result<ShortestPaths, GeneratorError> {
    let n = network.node_count();
    if !network.contains_node(source) {
        return Err(GeneratorError::invariant(format!("source {source} missing")));
    }
    let mut distances = vec![0_i64; n];
    let mut reached = vec![false; n];
    let mut discovery = Vec::with_capacity(n);
    let mut queue = VecDeque::from([source]);
    reached[source as usize] = true;
    while let Some(u) = queue.pop_front() {
        discovery.push(u);
        for (v, w) in network.successors(u) {
            if !tree_arcs.contains(&(u, v)) {
                continue;
            }
            if reached[v as usize] {
                return Err(GeneratorError::invariant(format!(
                    "node {v} has two tree parents"
                )));
            }
            reached[v as usize] = true;
            distances[v as usize] = distances[u as usize]
                .checked_add(w)
                .ok_or_else(|| GeneratorError::invariant("distance overflow"))?;
            queue.push_back(v);
        }
    }
    if discovery.len() != n {
        return Err(GeneratorError::invariant(format!(
            "tree reaches {} of {n} nodes",
            discovery.len()
        )));
    }
    Ok(ShortestPaths {
        distances,
        discovery,
    })
}

pub fn determine_order(paths: &ShortestPaths) -> DistanceOrder {
    let n = paths.distances.len();
    let mut rank = vec![0usize; n];
    for (idx, &node) in paths.discovery.iter().enumerate() {
        rank[node as usize] = idx;
    }
    let mut order: Vec<NodeId> = (0..n as NodeId).collect();
    order.sort_by_key(|&node| (paths.distances[node as usize], rank[node as usize]));
    let mut position = vec![0usize; n];
    for (pos, &node) in order.iter().enumerate() {
        position[node as usize] = pos;
    }
    DistanceOrder { order, position }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_network(arcs: &[(NodeId, NodeId, i64)], n: u32) -> (Network, BTreeSet<(NodeId, NodeId)>) {
        let mut network = Network::with_nodes(n);
        let mut set = BTreeSet::new();
        for &(u, v, w) in arcs {
            network.add_arc(u, v, w).unwrap();
            set.insert((u, v));
        }
        (network, set)
    }

    #[test]
    fn propagates_distances_along_tree() {
        let (network, tree) = tree_network(&[(0, 2, 5), (2, 1, -7), (0, 3, 0), (3, 4, 2)], 5);
        let paths = shortest_path(&network, &tree, 0).unwrap();
        assert_eq!(paths.distances, vec![0, -2, 5, 0, 2]);
        assert_eq!(paths.discovery[0], 0);
    }

    #[test]
    fn ignores_non_tree_arcs() {
        let (mut network, tree) = tree_network(&[(0, 1, 3), (1, 2, 3)], 3);
        network.add_arc(0, 2, 1).unwrap();
        let paths = shortest_path(&network, &tree, 0).unwrap();
        assert_eq!(paths.distances[2], 6);
    }

    #[test]
    fn ties_keep_parents_first() {
        let (network, tree) = tree_network(&[(0, 2, 0), (2, 1, 0), (0, 3, -1)], 4);
        let paths = shortest_path(&network, &tree, 0).unwrap();
        let order = determine_order(&paths);
        assert_eq!(order.order[0], 3);
        assert!(order.position_of(0) < order.position_of(2));
        assert!(order.position_of(2) < order.position_of(1));
        assert!(!order.is_backward(0, 2));
        assert!(!order.is_backward(2, 1));
        assert!(order.is_backward(0, 3));
    }

    #[test]
    fn counts_backward_loop_positions() {
        let (network, tree) = tree_network(&[(0, 1, -2), (1, 2, -2), (2, 3, -2)], 4);
        let order = determine_order(&shortest_path(&network, &tree, 0).unwrap());
        assert_eq!(order.order, vec![3, 2, 1, 0]);
        assert_eq!(order.backward_loop_positions(), 3);
    }

    #[test]
    fn unreachable_node_is_an_error() {
        let (network, tree) = tree_network(&[(0, 1, 1)], 3);
        assert!(shortest_path(&network, &tree, 0).is_err());
    }
}

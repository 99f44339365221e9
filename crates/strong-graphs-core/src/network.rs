use std::collections::{HashMap, VecDeque};

use crate::error::NetworkError;
use crate::remap::NodeMapping;

pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arc {
    pub tail: NodeId,
    pub head: NodeId,
    pub weight: i64,
}

/// Directed network with at most one arc per ordered pair.
///
/// Arcs are kept in insertion order, which is also the order `arcs()` emits
/// them in, so two networks built by the same draw sequence compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    present: Vec<bool>,
    node_count: usize,
    arcs: Vec<Arc>,
    index: HashMap<(NodeId, NodeId), ArcId>,
    outgoing: Vec<Vec<ArcId>>,
    incoming: Vec<Vec<ArcId>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(node_count: u32) -> Self {
        let n = node_count as usize;
        Self {
            present: vec![true; n],
            node_count: n,
            arcs: Vec::new(),
            index: HashMap::new(),
            outgoing: vec![Vec::new(); n],
            incoming: vec![Vec::new(); n],
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.present.get(node as usize).copied().unwrap_or(false)
    }

    pub fn add_node(&mut self, node: NodeId) -> Result<NodeId, NetworkError> {
        if self.contains_node(node) {
            return Err(NetworkError::DuplicateNode(node));
        }
        let idx = node as usize;
        if idx >= self.present.len() {
            self.present.resize(idx + 1, false);
            self.outgoing.resize_with(idx + 1, Vec::new);
            self.incoming.resize_with(idx + 1, Vec::new);
        }
        self.present[idx] = true;
        self.node_count += 1;
        Ok(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter(|(_, present)| **present)
            .map(|(idx, _)| idx as NodeId)
    }

    pub fn add_arc(&mut self, tail: NodeId, head: NodeId, weight: i64) -> Result<ArcId, NetworkError> {
        if !self.contains_node(tail) {
            return Err(NetworkError::MissingNode(tail));
        }
        if !self.contains_node(head) {
            return Err(NetworkError::MissingNode(head));
        }
        if tail == head {
            return Err(NetworkError::SelfLoop(tail));
        }
        if self.index.contains_key(&(tail, head)) {
            return Err(NetworkError::DuplicateArc(tail, head));
        }
        let arc_id = ArcId(self.arcs.len());
        self.arcs.push(Arc { tail, head, weight });
        self.index.insert((tail, head), arc_id);
        self.outgoing[tail as usize].push(arc_id);
        self.incoming[head as usize].push(arc_id);
        Ok(arc_id)
    }

    pub fn has_arc(&self, tail: NodeId, head: NodeId) -> bool {
        self.index.contains_key(&(tail, head))
    }

    pub fn weight(&self, tail: NodeId, head: NodeId) -> Option<i64> {
        self.index
            .get(&(tail, head))
            .map(|arc_id| self.arcs[arc_id.0].weight)
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Arc> {
        self.arcs.iter()
    }

    /// `(head, weight)` for every arc leaving `node`; empty for unknown nodes.
    pub fn successors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, i64)> + '_ {
        self.outgoing
            .get(node as usize)
            .into_iter()
            .flatten()
            .map(|arc_id| {
                let arc = &self.arcs[arc_id.0];
                (arc.head, arc.weight)
            })
    }

    /// `(tail, weight)` for every arc entering `node`; empty for unknown nodes.
    pub fn predecessors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, i64)> + '_ {
        self.incoming
            .get(node as usize)
            .into_iter()
            .flatten()
            .map(|arc_id| {
                let arc = &self.arcs[arc_id.0];
                (arc.tail, arc.weight)
            })
    }

    pub fn in_degree(&self, node: NodeId) -> usize {
        self.incoming.get(node as usize).map_or(0, Vec::len)
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outgoing.get(node as usize).map_or(0, Vec::len)
    }

    /// Copy of this network with every node reference passed through `mapping`.
    pub fn relabel(&self, mapping: &NodeMapping) -> Result<Network, NetworkError> {
        let mut relabeled = Network::new();
        for node in self.nodes() {
            let new_id = mapping.new_id(node).ok_or(NetworkError::MissingNode(node))?;
            relabeled.add_node(new_id)?;
        }
        for arc in &self.arcs {
            let tail = mapping
                .new_id(arc.tail)
                .ok_or(NetworkError::MissingNode(arc.tail))?;
            let head = mapping
                .new_id(arc.head)
                .ok_or(NetworkError::MissingNode(arc.head))?;
            relabeled.add_arc(tail, head, arc.weight)?;
        }
        Ok(relabeled)
    }

    pub fn has_negative_cycle(&self) -> bool {
        let n = self.present.len();
        if n == 0 {
            return false;
        }
        let mut dist = vec![0_i64; n];
        for _ in 0..n {
            let mut updated = false;
            for arc in &self.arcs {
                let u = arc.tail as usize;
                let v = arc.head as usize;
                let nd = dist[u].saturating_add(arc.weight);
                if nd < dist[v] {
                    dist[v] = nd;
                    updated = true;
                }
            }
            if !updated {
                return false;
            }
        }
        true
    }

    pub fn reaches_all_from(&self, source: NodeId) -> bool {
        self.sweep(source, &self.outgoing, |arc| arc.head)
    }

    pub fn reached_by_all(&self, source: NodeId) -> bool {
        self.sweep(source, &self.incoming, |arc| arc.tail)
    }

    fn sweep(&self, source: NodeId, adjacency: &[Vec<ArcId>], next: impl Fn(&Arc) -> NodeId) -> bool {
        if !self.contains_node(source) {
            return false;
        }
        let mut seen = vec![false; self.present.len()];
        seen[source as usize] = true;
        let mut reached = 1;
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            for arc_id in &adjacency[node as usize] {
                let other = next(&self.arcs[arc_id.0]);
                if !seen[other as usize] {
                    seen[other as usize] = true;
                    reached += 1;
                    queue.push_back(other);
                }
            }
        }
        reached == self.node_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_arcs() {
        let mut network = Network::with_nodes(3);
        network.add_arc(0, 1, 4).unwrap();
        assert_eq!(
            network.add_arc(0, 1, 2).unwrap_err(),
            NetworkError::DuplicateArc(0, 1)
        );
        assert_eq!(network.add_arc(2, 2, 0).unwrap_err(), NetworkError::SelfLoop(2));
        assert_eq!(network.add_arc(0, 7, 1).unwrap_err(), NetworkError::MissingNode(7));
        assert_eq!(network.add_node(1).unwrap_err(), NetworkError::DuplicateNode(1));
        assert_eq!(network.arc_count(), 1);
    }

    #[test]
    fn adjacency_reports_weights() {
        let mut network = Network::with_nodes(3);
        network.add_arc(0, 1, 4).unwrap();
        network.add_arc(2, 1, -3).unwrap();
        network.add_arc(1, 2, 5).unwrap();

        let preds: Vec<_> = network.predecessors(1).collect();
        assert_eq!(preds, vec![(0, 4), (2, -3)]);
        let succs: Vec<_> = network.successors(1).collect();
        assert_eq!(succs, vec![(2, 5)]);
        assert_eq!(network.weight(2, 1), Some(-3));
        assert_eq!(network.weight(1, 0), None);
        assert!(network.has_arc(1, 2));
        assert!(!network.has_arc(2, 0));
        assert_eq!(network.in_degree(1), 2);
        assert_eq!(network.out_degree(0), 1);
    }

    #[test]
    fn sparse_node_ids_grow_storage() {
        let mut network = Network::new();
        network.add_node(4).unwrap();
        network.add_node(1).unwrap();
        assert_eq!(network.node_count(), 2);
        assert_eq!(network.nodes().collect::<Vec<_>>(), vec![1, 4]);
        assert!(network.add_arc(4, 1, 0).is_ok());
        assert!(network.add_arc(4, 2, 0).is_err());
    }

    #[test]
    fn detects_negative_cycles_and_connectivity() {
        let mut cycle = Network::with_nodes(3);
        cycle.add_arc(0, 1, 2).unwrap();
        cycle.add_arc(1, 2, -1).unwrap();
        cycle.add_arc(2, 0, -1).unwrap();
        assert!(!cycle.has_negative_cycle());
        assert!(cycle.reaches_all_from(0));
        assert!(cycle.reached_by_all(0));

        let mut negative = Network::with_nodes(2);
        negative.add_arc(0, 1, -2).unwrap();
        negative.add_arc(1, 0, 1).unwrap();
        assert!(negative.has_negative_cycle());

        let mut path = Network::with_nodes(3);
        path.add_arc(0, 1, 1).unwrap();
        path.add_arc(1, 2, 1).unwrap();
        assert!(path.reaches_all_from(0));
        assert!(!path.reached_by_all(0));
    }
}

//! A transient topology-only graph used during construction.

use crate::algorithms::HandleGraph;
use crate::support;

use std::collections::BTreeMap;

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
struct EmptyGraphNode {
    predecessors: Vec<usize>,
    successors: Vec<usize>,
}

/// A bidirected graph with nodes and edges but no sequences.
///
/// The graph stores each edge in both directions, which simplifies edge
/// creation during GFA parsing. Duplicate edges should be removed with
/// [`EmptyGraph::remove_duplicate_edges`] once all edges have been created.
/// Handles are encoded as in [`crate::support`].
#[derive(Clone, Debug, Default)]
pub struct EmptyGraph {
    nodes: BTreeMap<usize, EmptyGraphNode>,
}

impl EmptyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        EmptyGraph::default()
    }

    /// Creates a node with the given identifier.
    pub fn create_node(&mut self, node_id: usize) {
        self.nodes.entry(node_id).or_default();
    }

    /// Creates the edge `(from, to)` between two oriented nodes.
    ///
    /// The edge is stored in the adjacency lists of both endpoints.
    /// Returns an error if either endpoint does not exist.
    pub fn create_edge(&mut self, from: usize, to: usize) -> Result<(), String> {
        if !self.nodes.contains_key(&support::node_id(from)) || !self.nodes.contains_key(&support::node_id(to)) {
            return Err(format!(
                "EmptyGraph: Cannot create an edge between nodes {} and {}",
                support::node_id(from), support::node_id(to)
            ));
        }

        // from -> to
        {
            let node = self.nodes.get_mut(&support::node_id(from)).unwrap();
            if support::node_orientation(from).is_reverse() {
                node.predecessors.push(support::flip_node(to));
            } else {
                node.successors.push(to);
            }
        }

        // to -> from
        {
            let node = self.nodes.get_mut(&support::node_id(to)).unwrap();
            if support::node_orientation(to).is_reverse() {
                node.successors.push(support::flip_node(from));
            } else {
                node.predecessors.push(from);
            }
        }

        Ok(())
    }

    /// Sorts the adjacency lists and removes duplicate edges.
    pub fn remove_duplicate_edges(&mut self) {
        for node in self.nodes.values_mut() {
            node.predecessors.sort_unstable();
            node.predecessors.dedup();
            node.successors.sort_unstable();
            node.successors.dedup();
        }
    }

    fn adjacency(&self, handle: usize, go_left: bool) -> Option<(&Vec<usize>, bool)> {
        let node = self.nodes.get(&support::node_id(handle))?;
        let flip = support::node_orientation(handle).is_reverse();
        let edges = if go_left != flip { &node.predecessors } else { &node.successors };
        Some((edges, flip))
    }
}

impl HandleGraph for EmptyGraph {
    fn has_node(&self, node_id: usize) -> bool {
        self.nodes.contains_key(&node_id)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn min_node_id(&self) -> usize {
        self.nodes.keys().next().copied().unwrap_or(0)
    }

    fn max_node_id(&self) -> usize {
        self.nodes.keys().next_back().copied().unwrap_or(0)
    }

    fn follow_edges<F: FnMut(usize) -> bool>(&self, handle: usize, go_left: bool, mut visit: F) -> bool {
        let (edges, flip) = match self.adjacency(handle, go_left) {
            Some(result) => result,
            None => return true,
        };
        for &next in edges {
            let actual = if flip { support::flip_node(next) } else { next };
            if !visit(actual) {
                return false;
            }
        }
        true
    }

    fn for_each_node<F: FnMut(usize) -> bool>(&self, mut visit: F) -> bool {
        for &node_id in self.nodes.keys() {
            if !visit(node_id) {
                return false;
            }
        }
        true
    }

    fn degree(&self, handle: usize, go_left: bool) -> usize {
        match self.adjacency(handle, go_left) {
            Some((edges, _)) => edges.len(),
            None => 0,
        }
    }
}

//-----------------------------------------------------------------------------

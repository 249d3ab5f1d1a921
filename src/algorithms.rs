//! Algorithms on bidirected graphs: connected components, acyclicity, and
//! topological orders, plus the partitioning of a graph into construction jobs.

use crate::support::{self, Orientation};

use simple_sds::raw_vector::{RawVector, AccessRaw};

use std::collections::{BTreeMap, BTreeSet, HashMap};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A minimal interface to a bidirected graph.
///
/// Nodes are identified by positive integers and oriented nodes by encoded
/// handles (see [`crate::support`]). The interface is implemented by the
/// transient construction graph and by the final GBZ graph, so the
/// algorithms in this module work on both.
pub trait HandleGraph {
    /// Returns `true` if the graph contains a node with the given identifier.
    fn has_node(&self, node_id: usize) -> bool;

    /// Returns the number of nodes in the graph.
    fn node_count(&self) -> usize;

    /// Returns the smallest node identifier, or `0` if the graph is empty.
    fn min_node_id(&self) -> usize;

    /// Returns the largest node identifier, or `0` if the graph is empty.
    fn max_node_id(&self) -> usize;

    /// Visits the neighbors of the given oriented node.
    ///
    /// Visits successors when `go_left` is `false` and predecessors when it
    /// is `true`. Following left from a handle visits the flips of the nodes
    /// reached by following right from its flip. The visitor returns `false`
    /// to stop the iteration; the return value is `false` if it did.
    fn follow_edges<F: FnMut(usize) -> bool>(&self, handle: usize, go_left: bool, visit: F) -> bool;

    /// Visits all node identifiers in the graph.
    ///
    /// The visitor returns `false` to stop the iteration; the return value
    /// is `false` if it did.
    fn for_each_node<F: FnMut(usize) -> bool>(&self, visit: F) -> bool;

    /// Returns the number of edges on the given side of an oriented node.
    fn degree(&self, handle: usize, go_left: bool) -> usize {
        let mut result = 0;
        self.follow_edges(handle, go_left, |_| { result += 1; true });
        result
    }
}

//-----------------------------------------------------------------------------

// A disjoint-set structure over node ids `offset..offset + size`, using
// path splitting and union by rank.
struct DisjointSets {
    parent: Vec<usize>,
    rank: Vec<u8>,
    offset: usize,
}

impl DisjointSets {
    fn new(size: usize, offset: usize) -> Self {
        DisjointSets {
            parent: (0..size).collect(),
            rank: vec![0; size],
            offset,
        }
    }

    fn size(&self) -> usize {
        self.parent.len()
    }

    fn find(&mut self, node_id: usize) -> usize {
        let mut element = node_id - self.offset;
        while self.parent[element] != element {
            let next = self.parent[element];
            self.parent[element] = self.parent[next];
            element = next;
        }
        element
    }

    fn union(&mut self, node_a: usize, node_b: usize) {
        let mut a = self.find(node_a);
        let mut b = self.find(node_b);
        if a == b {
            return;
        }
        if self.rank[a] < self.rank[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        if self.rank[b] == self.rank[a] {
            self.rank[a] += 1;
        }
    }

    // Returns the sets as sorted lists of node ids, in the order determined
    // by the first included node of each set.
    fn sets<F: FnMut(usize) -> bool>(&mut self, mut include_node: F) -> Vec<Vec<usize>> {
        let mut result: Vec<Vec<usize>> = Vec::new();
        let mut root_to_set: HashMap<usize, usize> = HashMap::new();
        for node_id in self.offset..self.offset + self.size() {
            if !include_node(node_id) {
                continue;
            }
            let root = self.find(node_id);
            let set = *root_to_set.entry(root).or_insert_with(|| {
                result.push(Vec::new());
                result.len() - 1
            });
            result[set].push(node_id);
        }
        result
    }
}

//-----------------------------------------------------------------------------

/// Returns the weakly connected components of the graph.
///
/// Each component is a sorted list of node identifiers, and the components
/// are ordered by their smallest node identifiers. Every node of the graph
/// appears in exactly one component.
pub fn weakly_connected_components<G: HandleGraph>(graph: &G) -> Vec<Vec<usize>> {
    if graph.node_count() == 0 {
        return Vec::new();
    }
    let min_id = graph.min_node_id();
    let max_id = graph.max_node_id();

    let mut found = RawVector::with_len(max_id + 1 - min_id, false);
    let mut components = DisjointSets::new(max_id + 1 - min_id, min_id);
    graph.for_each_node(|start_id| {
        if found.bit(start_id - min_id) {
            return true;
        }
        let mut stack: Vec<usize> = vec![support::encode_node(start_id, Orientation::Forward)];
        while let Some(handle) = stack.pop() {
            let node_id = support::node_id(handle);
            if found.bit(node_id - min_id) {
                continue;
            }
            found.set_bit(node_id - min_id, true);
            for go_left in [false, true] {
                graph.follow_edges(handle, go_left, |next| {
                    components.union(node_id, support::node_id(next));
                    stack.push(next);
                    true
                });
            }
        }
        true
    });

    components.sets(|node_id| graph.has_node(node_id))
}

//-----------------------------------------------------------------------------

/// Checks if the component induces a directed acyclic graph that is
/// reachable in a single orientation.
///
/// Returns the head nodes (nodes with no predecessors in the chosen
/// orientation) if it does, and an empty list otherwise. Nodes of the
/// component that are missing from the graph are ignored.
pub fn is_nice_and_acyclic<G: HandleGraph>(graph: &G, component: &[usize]) -> Vec<usize> {
    let mut head_nodes: Vec<usize> = Vec::new();
    if component.is_empty() {
        return head_nodes;
    }

    const NOT_SEEN: usize = usize::MAX;
    // (remaining indegree, orientation) for each node of the component.
    let mut nodes: HashMap<usize, (usize, Orientation)> = HashMap::new();
    let mut active: Vec<usize> = Vec::new();
    let mut found = 0;

    // Determine the head nodes.
    let mut missing_nodes = 0;
    for &node_id in component {
        if !graph.has_node(node_id) {
            missing_nodes += 1;
            continue;
        }
        let handle = support::encode_node(node_id, Orientation::Forward);
        let indegree = graph.degree(handle, true);
        if indegree == 0 {
            nodes.insert(node_id, (0, Orientation::Forward));
            head_nodes.push(node_id);
            active.push(handle);
            found += 1;
        } else {
            nodes.insert(node_id, (NOT_SEEN, Orientation::Forward));
        }
    }

    // Process the successors of active nodes, determine their orientations,
    // and decrement their indegrees. A node becomes active when its
    // indegree reaches zero.
    let mut ok = true;
    while let Some(curr) = active.pop() {
        graph.follow_edges(curr, false, |next| {
            let next_id = support::node_id(next);
            let next_orientation = support::node_orientation(next);
            let entry = match nodes.get_mut(&next_id) {
                Some(entry) => entry,
                None => return true,
            };
            if entry.0 == NOT_SEEN {
                entry.0 = graph.degree(next, true);
                entry.1 = next_orientation;
            } else if next_orientation != entry.1 {
                ok = false;
                return false;
            }
            entry.0 -= 1;
            if entry.0 == 0 {
                active.push(next);
                found += 1;
            }
            true
        });
        if !ok {
            break;
        }
    }
    if found != component.len() - missing_nodes {
        ok = false;
    }

    if !ok {
        head_nodes.clear();
    }
    head_nodes
}

//-----------------------------------------------------------------------------

/// Returns the handles of the subgraph induced by the given nodes in
/// topological order.
///
/// Both orientations of each node are included. Returns an empty list if the
/// subgraph is not a directed acyclic graph. Nodes that are missing from the
/// graph are ignored.
pub fn topological_order<G: HandleGraph>(graph: &G, subgraph: &BTreeSet<usize>) -> Vec<usize> {
    let mut result: Vec<usize> = Vec::with_capacity(2 * subgraph.len());
    if subgraph.is_empty() {
        return result;
    }

    let mut indegrees: BTreeMap<usize, usize> = BTreeMap::new();
    let mut active: Vec<usize> = Vec::new();

    // Add both orientations of each node to the map.
    let mut missing_nodes = 0;
    for &node_id in subgraph {
        if !graph.has_node(node_id) {
            missing_nodes += 1;
            continue;
        }
        indegrees.insert(support::encode_node(node_id, Orientation::Forward), 0);
        indegrees.insert(support::encode_node(node_id, Orientation::Reverse), 0);
    }

    // Determine indegrees within the subgraph and activate the heads.
    let handles: Vec<usize> = indegrees.keys().copied().collect();
    for &handle in handles.iter() {
        let mut indegree = 0;
        graph.follow_edges(handle, true, |prev| {
            if indegrees.contains_key(&prev) {
                indegree += 1;
            }
            true
        });
        indegrees.insert(handle, indegree);
    }
    for &handle in handles.iter() {
        if indegrees[&handle] == 0 {
            active.push(handle);
            result.push(handle);
        }
    }

    // Kahn's algorithm: activate a handle when all of its incoming edges
    // have been used.
    while let Some(curr) = active.pop() {
        graph.follow_edges(curr, false, |next| {
            if let Some(indegree) = indegrees.get_mut(&next) {
                *indegree -= 1;
                if *indegree == 0 {
                    active.push(next);
                    result.push(next);
                }
            }
            true
        });
    }

    if result.len() != 2 * (subgraph.len() - missing_nodes) {
        result.clear();
    }
    result
}

//-----------------------------------------------------------------------------

/// A partitioning of graph components into construction jobs.
///
/// Components are ordered by their smallest node identifiers, and each job
/// covers a contiguous range of components. Each path index construction
/// job can then be run independently, as the jobs share no nodes.
#[derive(Clone, Debug, Default)]
pub struct ConstructionJobs {
    /// Total number of nodes assigned to each job.
    pub nodes_per_job: Vec<usize>,
    /// Weakly connected components, as returned by [`weakly_connected_components`].
    pub weakly_connected_components: Vec<Vec<usize>>,
    /// Maps node identifiers to component identifiers.
    pub node_to_component: HashMap<usize, usize>,
    /// Maps component identifiers to job identifiers.
    pub component_to_job: Vec<usize>,
}

impl ConstructionJobs {
    /// Returns the number of jobs.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes_per_job.len()
    }

    /// Returns `true` if there are no jobs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes_per_job.is_empty()
    }

    /// Returns the number of components.
    #[inline]
    pub fn components(&self) -> usize {
        self.weakly_connected_components.len()
    }

    /// Returns the component identifier for the node, or [`None`] if there is no such node.
    pub fn component(&self, node_id: usize) -> Option<usize> {
        self.node_to_component.get(&node_id).copied()
    }

    /// Returns the job identifier for the node, or [`None`] if there is no such node.
    pub fn job(&self, node_id: usize) -> Option<usize> {
        let component = self.component(node_id)?;
        self.component_to_job.get(component).copied()
    }

    /// Returns the component identifiers assigned to each job.
    pub fn components_per_job(&self) -> Vec<Vec<usize>> {
        let mut result = vec![Vec::new(); self.len()];
        for (component, &job) in self.component_to_job.iter().enumerate() {
            if job < result.len() {
                result[job].push(component);
            }
        }
        result
    }

    /// Returns a contig name for each component.
    ///
    /// The names are taken from the given (first node, contig name) pairs,
    /// which typically come from reference and generic paths. The first name
    /// for each component wins, and components without a name fall back to
    /// `component_<id>`.
    pub fn contig_names<'a>(&self, paths: impl Iterator<Item = (usize, &'a str)>) -> Vec<String> {
        let mut result = vec![String::new(); self.components()];
        for (node_id, contig_name) in paths {
            if let Some(component) = self.component(node_id) {
                if result[component].is_empty() && !contig_name.is_empty() {
                    result[component] = String::from(contig_name);
                }
            }
        }
        for (component, name) in result.iter_mut().enumerate() {
            if name.is_empty() {
                *name = format!("component_{}", component);
            }
        }
        result
    }
}

/// Partitions the graph into construction jobs of roughly equal size.
///
/// Consecutive components are combined into the same job as long as the job
/// stays within `size_bound` nodes. A component larger than the bound forms
/// a job of its own.
pub fn construction_jobs<G: HandleGraph>(graph: &G, size_bound: usize) -> ConstructionJobs {
    let mut jobs = ConstructionJobs {
        weakly_connected_components: weakly_connected_components(graph),
        ..ConstructionJobs::default()
    };

    jobs.node_to_component.reserve(graph.node_count());
    jobs.component_to_job.reserve(jobs.components());

    for i in 0..jobs.components() {
        let component_size = jobs.weakly_connected_components[i].len();
        if jobs.nodes_per_job.is_empty() || jobs.nodes_per_job.last().unwrap() + component_size > size_bound {
            jobs.nodes_per_job.push(0);
        }
        *jobs.nodes_per_job.last_mut().unwrap() += component_size;
        for offset in 0..component_size {
            let node_id = jobs.weakly_connected_components[i][offset];
            jobs.node_to_component.insert(node_id, i);
        }
        jobs.component_to_job.push(jobs.nodes_per_job.len() - 1);
    }

    jobs
}

//-----------------------------------------------------------------------------

pub mod bipart;
pub mod ops;
pub mod query;

use crate::libs::phylo::edge::{Edge, EdgeId};
use crate::libs::phylo::error::TreeError;
use crate::libs::phylo::node::{Node, NodeId};

/// Arena-backed phylogenetic tree.
///
/// The tree owns two flat vectors, one of nodes and one of edges; all
/// cross-references are indices. Identifiers are therefore dense in
/// `[0, len)` by construction and survive any in-place rewiring.
#[derive(Debug, Default, Clone)]
pub struct Tree {
    pub(super) nodes: Vec<Node>,
    pub(super) edges: Vec<Edge>,
    pub(super) root: Option<NodeId>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new unconnected node. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    /// Get a reference to a node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable reference to a node by ID.
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Get a reference to an edge by ID.
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Get a mutable reference to an edge by ID.
    pub fn get_edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the root node ID
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Set a node as the root of the tree.
    pub fn set_root(&mut self, id: NodeId) {
        if self.get_node(id).is_some() {
            self.root = Some(id);
        }
    }

    /// Append a fresh edge oriented `(left, right)` WITHOUT registering
    /// adjacency. Callers rewiring in place (grafting) register the
    /// endpoints themselves; ordinary construction goes through
    /// `connect_nodes`.
    pub fn add_edge(&mut self, left: NodeId, right: NodeId) -> EdgeId {
        let id = self.edges.len();
        self.edges.push(Edge::new(id, left, right));
        id
    }

    /// Connect two nodes by a fresh edge oriented `(parent, child)`.
    /// Both adjacency lists are updated; the edge starts without a length.
    ///
    /// # Example
    /// ```
    /// use brsup::libs::phylo::tree::Tree;
    /// let mut tree = Tree::new();
    /// let a = tree.add_node();
    /// let b = tree.add_node();
    /// let e = tree.connect_nodes(a, b);
    /// assert_eq!(tree.get_edge(e).unwrap().left, a);
    /// assert_eq!(tree.get_node(b).unwrap().neigh, vec![a]);
    /// ```
    pub fn connect_nodes(&mut self, parent: NodeId, child: NodeId) -> EdgeId {
        let id = self.add_edge(parent, child);
        self.nodes[parent].add_neighbor(child, id);
        self.nodes[child].add_neighbor(parent, id);
        id
    }

    /// Position of `edge` in the `br` list of `node`.
    pub fn edge_index(&self, node: NodeId, edge: EdgeId) -> Result<usize, TreeError> {
        self.nodes[node]
            .br
            .iter()
            .position(|&e| e == edge)
            .ok_or(TreeError::EdgeNotAdjacent { node, edge })
    }

    /// Position of `other` in the `neigh` list of `node`.
    pub fn node_index(&self, node: NodeId, other: NodeId) -> Result<usize, TreeError> {
        self.nodes[node]
            .neigh
            .iter()
            .position(|&n| n == other)
            .ok_or(TreeError::NodeNotAdjacent { node, other })
    }

    /// Check if the node is a tip (exactly one neighbor)
    pub fn is_tip(&self, id: NodeId) -> bool {
        self.nodes[id].is_tip()
    }

    /// The unique parent of `n` under the current root orientation:
    /// the `left` endpoint of the single incident edge whose `right` is `n`.
    pub fn parent_of(&self, n: NodeId) -> Result<NodeId, TreeError> {
        Ok(self.edges[self.parent_edge_of(n)?].left)
    }

    /// The unique incident edge of `n` whose `right` endpoint is `n`.
    pub fn parent_edge_of(&self, n: NodeId) -> Result<EdgeId, TreeError> {
        let mut found = None;
        for &eid in &self.nodes[n].br {
            if self.edges[eid].right == n {
                if found.is_some() {
                    return Err(TreeError::MultipleParents(n));
                }
                found = Some(eid);
            }
        }
        found.ok_or(TreeError::NoParent(n))
    }

    /// Atomically replace the neighbor of `node` at `slot`.
    /// The displaced edge must be `old_edge`, otherwise the adjacency
    /// lists went out of sync and the operation is refused.
    pub fn replace_neighbor(
        &mut self,
        node: NodeId,
        slot: usize,
        new_node: NodeId,
        old_edge: EdgeId,
        new_edge: EdgeId,
    ) -> Result<(), TreeError> {
        if self.nodes[node].br[slot] != old_edge {
            return Err(TreeError::EdgeNotAdjacent {
                node,
                edge: old_edge,
            });
        }
        self.nodes[node].neigh[slot] = new_node;
        self.nodes[node].br[slot] = new_edge;
        Ok(())
    }

    // --- Delegation to ops ---

    pub fn reroot(&mut self, n: NodeId) -> Result<(), TreeError> {
        ops::reroot(self, n)
    }

    pub fn reroot_first(&mut self) -> Result<(), TreeError> {
        ops::reroot_first(self)
    }

    pub fn graft_tip_on_edge(&mut self, tip: NodeId, edge: EdgeId) -> Result<(), TreeError> {
        ops::graft_tip_on_edge(self, tip, edge)
    }

    pub fn shuffle_tips<R: rand::Rng>(&mut self, rng: &mut R) {
        ops::shuffle_tips(self, rng)
    }

    // --- Delegation to query ---

    pub fn tips(&self) -> Vec<NodeId> {
        query::tips(self)
    }

    pub fn tip_names(&self) -> Vec<String> {
        query::tip_names(self)
    }

    pub fn get_node_by_name(&self, name: &str) -> Option<NodeId> {
        query::get_node_by_name(self, name)
    }

    pub fn preorder_pairs(&self) -> Vec<(NodeId, Option<NodeId>)> {
        query::preorder_pairs(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_basic_ops() {
        let mut tree = Tree::new();

        // 0(root) - 1, 2; 1 - 3
        let n0 = tree.add_node();
        let n1 = tree.add_node();
        let n2 = tree.add_node();
        let n3 = tree.add_node();

        tree.set_root(n0);
        let e01 = tree.connect_nodes(n0, n1);
        let e02 = tree.connect_nodes(n0, n2);
        let e13 = tree.connect_nodes(n1, n3);

        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.edge_count(), 3);

        // Dense ids in creation order
        assert_eq!((e01, e02, e13), (0, 1, 2));

        // Adjacency symmetry: every edge is in both endpoints' `br`,
        // with the parallel `neigh` entry being the other endpoint
        for edge in tree.edges() {
            for &end in &[edge.left, edge.right] {
                let i = tree.edge_index(end, edge.id).unwrap();
                assert_eq!(tree.get_node(end).unwrap().neigh[i], edge.other(end));
            }
        }

        assert_eq!(tree.parent_of(n3), Ok(n1));
        assert_eq!(tree.parent_edge_of(n1), Ok(e01));
        assert_eq!(tree.parent_of(n0), Err(TreeError::NoParent(n0)));
    }

    #[test]
    fn test_tree_lookup_failures() {
        let mut tree = Tree::new();
        let n0 = tree.add_node();
        let n1 = tree.add_node();
        let n2 = tree.add_node();
        let e = tree.connect_nodes(n0, n1);

        assert!(tree.edge_index(n2, e).is_err());
        assert!(tree.node_index(n0, n2).is_err());
        assert_eq!(tree.edge_index(n0, e), Ok(0));
        assert_eq!(tree.node_index(n1, n0), Ok(0));
    }

    #[test]
    fn test_multiple_parents_detected() {
        let mut tree = Tree::new();
        let n0 = tree.add_node();
        let n1 = tree.add_node();
        let n2 = tree.add_node();
        tree.connect_nodes(n0, n2);
        tree.connect_nodes(n1, n2);

        assert_eq!(tree.parent_of(n2), Err(TreeError::MultipleParents(n2)));
    }

    #[test]
    fn test_replace_neighbor_checks_slot() {
        let mut tree = Tree::new();
        let n0 = tree.add_node();
        let n1 = tree.add_node();
        let n2 = tree.add_node();
        let e01 = tree.connect_nodes(n0, n1);
        let e02 = tree.connect_nodes(n0, n2);

        // Wrong displaced edge is refused
        assert!(tree.replace_neighbor(n0, 0, n2, e02, e02).is_err());
        // Correct slot goes through
        assert!(tree.replace_neighbor(n0, 1, n1, e02, e01).is_ok());
        assert_eq!(tree.get_node(n0).unwrap().neigh[1], n1);
    }
}

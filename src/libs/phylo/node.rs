use super::edge::EdgeId;

/// NodeId is an index into the Tree's node vector.
/// It is lightweight (Copy) and safe (no pointers).
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier for the node (index in the arena)
    pub id: NodeId,

    /// Node name/label (empty when absent)
    pub name: String,

    /// Bracketed comment attached in the Newick source (empty when absent)
    pub comment: String,

    /// Hop distance from the current root, refreshed by rerooting
    pub depth: usize,

    /// Neighbor node IDs
    pub neigh: Vec<NodeId>,

    /// Incident edge IDs, parallel to `neigh`: `br[i]` connects
    /// this node to `neigh[i]`
    pub br: Vec<EdgeId>,
}

impl Node {
    /// Create a new unconnected node with a specific ID
    ///
    /// # Example
    /// ```
    /// use brsup::libs::phylo::node::Node;
    /// let node = Node::new(1);
    /// assert_eq!(node.id, 1);
    /// assert!(node.neigh.is_empty());
    /// assert!(node.name.is_empty());
    /// ```
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: String::new(),
            comment: String::new(),
            depth: 0,
            neigh: Vec::with_capacity(3),
            br: Vec::with_capacity(3),
        }
    }

    /// Set the name of the node
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the comment of the node
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Register `other` as a neighbor across `edge`.
    /// `neigh` and `br` grow in lockstep.
    pub fn add_neighbor(&mut self, other: NodeId, edge: EdgeId) {
        self.neigh.push(other);
        self.br.push(edge);
    }

    /// Check if the node is a tip (exactly one neighbor)
    ///
    /// # Example
    /// ```
    /// use brsup::libs::phylo::node::Node;
    /// let mut node = Node::new(0);
    /// assert!(!node.is_tip());
    /// node.add_neighbor(1, 0);
    /// assert!(node.is_tip());
    /// ```
    pub fn is_tip(&self) -> bool {
        self.neigh.len() == 1
    }
}

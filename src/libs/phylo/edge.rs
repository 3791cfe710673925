use super::node::NodeId;
use fixedbitset::FixedBitSet;

/// EdgeId is an index into the Tree's edge vector.
pub type EdgeId = usize;

/// An undirected branch with a stored orientation.
/// After rerooting, `left` is always the endpoint nearer the root.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Unique identifier for the edge (index in the arena)
    pub id: EdgeId,

    /// Endpoint nearer the root
    pub left: NodeId,

    /// Endpoint farther from the root
    pub right: NodeId,

    /// Branch length (None when absent from the source)
    pub length: Option<f64>,

    /// Support value (None when absent)
    pub support: Option<f64>,

    /// Tip bipartition induced by this edge, indexed by tip index.
    /// Filled by `bipart::assign_edge_bitsets`.
    pub bitset: Option<FixedBitSet>,
}

impl Edge {
    pub fn new(id: EdgeId, left: NodeId, right: NodeId) -> Self {
        Self {
            id,
            left,
            right,
            length: None,
            support: None,
            bitset: None,
        }
    }

    /// The endpoint opposite `n`. Panics if `n` is not an endpoint.
    pub fn other(&self, n: NodeId) -> NodeId {
        if self.left == n {
            self.right
        } else if self.right == n {
            self.left
        } else {
            panic!("node {} is not an endpoint of edge {}", n, self.id)
        }
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = Some(length);
    }

    pub fn set_support(&mut self, support: f64) {
        self.support = Some(support);
    }
}

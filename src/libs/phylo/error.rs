use std::fmt;

use super::edge::EdgeId;
use super::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Error during parsing (e.g., syntax error)
    ParseError {
        /// A human-readable message explaining the error
        message: String,
        /// The line number (1-based)
        line: usize,
        /// The column number (1-based)
        column: usize,
        /// The snippet of input where the error occurred
        snippet: String,
    },
    /// The edge is not incident to the node
    EdgeNotAdjacent { node: NodeId, edge: EdgeId },
    /// The node is not a neighbor of the other node
    NodeNotAdjacent { node: NodeId, other: NodeId },
    /// The node has no incoming edge (possibly the root)
    NoParent(NodeId),
    /// The node has several incoming edges (malformed orientation)
    MultipleParents(NodeId),
    /// The node does not belong to this tree
    NodeNotInTree(NodeId),
    /// No node with three neighbors exists for rerooting
    NoTrifurcation,
    /// A tip carries no name where one is required
    UnnamedTip(NodeId),
    /// Other logical error (e.g., invalid operation)
    LogicError(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::ParseError {
                message,
                line,
                column,
                snippet,
            } => {
                write!(
                    f,
                    "Parse error at line {}, column {}:\n{}\nSnippet: \"{}\"",
                    line, column, message, snippet
                )
            }
            TreeError::EdgeNotAdjacent { node, edge } => {
                write!(f, "Edge {} is not incident to node {}", edge, node)
            }
            TreeError::NodeNotAdjacent { node, other } => {
                write!(f, "Node {} is not a neighbor of node {}", other, node)
            }
            TreeError::NoParent(id) => {
                write!(f, "Node {} has no parent (possibly the root?)", id)
            }
            TreeError::MultipleParents(id) => {
                write!(f, "Node {} has more than one parent", id)
            }
            TreeError::NodeNotInTree(id) => {
                write!(f, "Node {} is not part of the tree", id)
            }
            TreeError::NoTrifurcation => {
                write!(f, "No node with three neighbors found for rerooting")
            }
            TreeError::UnnamedTip(id) => {
                write!(f, "Tip node {} has no name", id)
            }
            TreeError::LogicError(msg) => write!(f, "Tree logic error: {}", msg),
        }
    }
}

impl std::error::Error for TreeError {}

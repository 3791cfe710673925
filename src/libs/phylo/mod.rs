pub mod edge;
pub mod error;
pub mod node;
pub mod parser;
pub mod reader;
pub mod tree;
pub mod writer;

pub use edge::{Edge, EdgeId};
pub use error::TreeError;
pub use node::{Node, NodeId};
pub use tree::Tree;

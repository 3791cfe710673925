use super::Tree;
use crate::libs::phylo::node::NodeId;

/// IDs of all tips, in creation order.
pub fn tips(tree: &Tree) -> Vec<NodeId> {
    tree.nodes
        .iter()
        .filter(|n| n.is_tip())
        .map(|n| n.id)
        .collect()
}

/// Names of all tips, in creation order.
pub fn tip_names(tree: &Tree) -> Vec<String> {
    tree.nodes
        .iter()
        .filter(|n| n.is_tip())
        .map(|n| n.name.clone())
        .collect()
}

/// First node carrying `name`, if any.
pub fn get_node_by_name(tree: &Tree, name: &str) -> Option<NodeId> {
    tree.nodes.iter().find(|n| n.name == name).map(|n| n.id)
}

/// `(node, parent)` pairs in preorder from the root.
///
/// Children of a node are its neighbors minus the parent, so this works
/// on the undirected adjacency lists without consulting edge orientation.
/// Iterating the result in reverse yields a valid bottom-up order.
pub fn preorder_pairs(tree: &Tree) -> Vec<(NodeId, Option<NodeId>)> {
    let mut result = Vec::with_capacity(tree.node_count());
    let root = match tree.root() {
        Some(r) => r,
        None => return result,
    };

    let mut stack = vec![(root, None)];
    while let Some((id, parent)) = stack.pop() {
        result.push((id, parent));
        for &next in tree.nodes[id].neigh.iter().rev() {
            if Some(next) != parent {
                stack.push((next, Some(id)));
            }
        }
    }

    result
}

use super::node::NodeId;
use super::parser::is_support_label;
use super::tree::Tree;

/// Serialize the tree to a canonical Newick string.
///
/// Numeric attributes are written as fixed-point with five fractional
/// digits; absent lengths and supports are not emitted at all.
pub fn write_newick(tree: &Tree) -> String {
    match tree.root() {
        Some(root) => {
            let mut s = subtree_newick(tree, root, None);
            s.push(';');
            s
        }
        None => ";".to_string(),
    }
}

// A node is parenthesised iff it has two or more neighbors (the parent
// counts). Children iterate in `neigh` order, skipping the parent; each
// child renders as: subtree, support, [comment], :length.
fn subtree_newick(tree: &Tree, id: NodeId, parent: Option<NodeId>) -> String {
    let node = tree.get_node(id).unwrap();
    let mut newick = String::new();

    if !node.neigh.is_empty() {
        if node.neigh.len() > 1 {
            newick.push('(');
        }
        let mut nbchild = 0;
        for (i, &child) in node.neigh.iter().enumerate() {
            if Some(child) == parent {
                continue;
            }
            if nbchild > 0 {
                newick.push(',');
            }
            newick.push_str(&subtree_newick(tree, child, Some(id)));

            let edge = tree.get_edge(node.br[i]).unwrap();
            let child_node = tree.get_node(child).unwrap();
            if let Some(support) = edge.support {
                // A `support/pvalue` label already encodes the support;
                // emitting the raw value as well would garble the token
                if !is_support_label(&child_node.name) {
                    newick.push_str(&format!("{:.5}", support));
                }
            }
            if !child_node.comment.is_empty() {
                newick.push_str(&format!("[{}]", child_node.comment));
            }
            if let Some(length) = edge.length {
                newick.push_str(&format!(":{:.5}", length));
            }
            nbchild += 1;
        }
        if node.neigh.len() > 1 {
            newick.push(')');
        }
    }
    newick.push_str(&node.name);

    newick
}

impl Tree {
    /// Serialize this tree to Newick.
    ///
    /// # Example
    /// ```
    /// use brsup::libs::phylo::tree::Tree;
    /// let tree = Tree::from_newick("(A:1,B:2);").unwrap();
    /// assert_eq!(tree.to_newick(), "(A:1.00000,B:2.00000);");
    /// ```
    pub fn to_newick(&self) -> String {
        write_newick(self)
    }
}

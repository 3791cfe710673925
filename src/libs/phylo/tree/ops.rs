use super::Tree;
use crate::libs::phylo::edge::EdgeId;
use crate::libs::phylo::error::TreeError;
use crate::libs::phylo::node::NodeId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Reroot the tree on node `n` and re-orient every edge accordingly.
pub fn reroot(tree: &mut Tree, n: NodeId) -> Result<(), TreeError> {
    if tree.get_node(n).is_none() {
        return Err(TreeError::NodeNotInTree(n));
    }
    tree.root = Some(n);
    reorder_edges(tree, n);
    Ok(())
}

/// Reroot on the first node (in creation order) with three neighbors.
pub fn reroot_first(tree: &mut Tree) -> Result<(), TreeError> {
    let candidate = tree
        .nodes
        .iter()
        .find(|n| n.neigh.len() == 3)
        .map(|n| n.id)
        .ok_or(TreeError::NoTrifurcation)?;
    reroot(tree, candidate)
}

// One traversal from the new root, visiting each edge once: an edge is
// swapped iff its `right` endpoint is the node nearer the root. Node
// depths are refreshed on the way down.
fn reorder_edges(tree: &mut Tree, root: NodeId) {
    tree.nodes[root].depth = 0;
    let mut stack: Vec<(NodeId, Option<NodeId>)> = vec![(root, None)];

    while let Some((id, prev)) = stack.pop() {
        let next_depth = tree.nodes[id].depth + 1;
        for i in 0..tree.nodes[id].br.len() {
            let eid = tree.nodes[id].br[i];
            let (l, r) = {
                let e = &tree.edges[eid];
                (e.left, e.right)
            };
            if Some(l) == prev || Some(r) == prev {
                continue;
            }
            if r == id {
                let e = &mut tree.edges[eid];
                std::mem::swap(&mut e.left, &mut e.right);
            }
            let child = tree.edges[eid].right;
            tree.nodes[child].depth = next_depth;
            stack.push((child, Some(id)));
        }
    }
}

/// Graft the (fresh, unconnected) tip `n` in the middle of edge `e`.
///
/// A new internal node is spliced into `e`, the far half of `e` becomes a
/// new edge of half the original length, and `n` hangs off the new node by
/// a pendant edge. Rewiring goes through `replace_neighbor`, which checks
/// that the displaced edge actually occupies the slot.
pub fn graft_tip_on_edge(tree: &mut Tree, n: NodeId, e: EdgeId) -> Result<(), TreeError> {
    let newnode = tree.add_node();
    let lnode = tree.edges[e].left;
    let rnode = tree.edges[e].right;

    // Slots of e at both endpoints, looked up before any rewiring
    let e_l_ind = tree.edge_index(lnode, e)?;
    let e_r_ind = tree.edge_index(rnode, e)?;

    let pendant = tree.connect_nodes(newnode, n);
    tree.edges[pendant].length = Some(1.0);

    // e keeps its id and its slot at lnode, but now ends at newnode
    tree.edges[e].right = newnode;
    tree.nodes[newnode].add_neighbor(lnode, e);
    tree.replace_neighbor(lnode, e_l_ind, newnode, e, e)?;

    // The far half (newnode, rnode) is a fresh edge; both halves carry
    // half of the original length
    let half = tree.edges[e].length.map(|l| l / 2.0);
    let far = tree.add_edge(newnode, rnode);
    tree.edges[far].length = half;
    tree.edges[e].length = half;
    tree.nodes[newnode].add_neighbor(rnode, far);
    tree.replace_neighbor(rnode, e_r_ind, newnode, e, far)?;

    Ok(())
}

/// Build a random binary tree with `nbtips` tips named `Tip1` ..
/// `Tip{nbtips-1}` plus `Node0`, by repeatedly grafting on a uniformly
/// chosen edge, then reroot it on its first trifurcation.
///
/// At least three tips are required; with two there is no trifurcation to
/// reroot on.
pub fn random_binary_tree<R: Rng>(rng: &mut R, nbtips: usize) -> Result<Tree, TreeError> {
    if nbtips < 3 {
        return Err(TreeError::LogicError(
            "cannot create a random binary tree with less than 3 tips".to_string(),
        ));
    }

    let mut tree = Tree::new();
    for i in 1..nbtips {
        let n = tree.add_node();
        tree.nodes[n].set_name(format!("Tip{}", i));
        if tree.edge_count() == 0 {
            let n2 = tree.add_node();
            tree.nodes[n2].set_name(format!("Node{}", i - 1));
            let e = tree.connect_nodes(n2, n);
            tree.edges[e].length = Some(1.0);
            tree.root = Some(n2);
        } else {
            let i_edge = rng.gen_range(0..tree.edge_count());
            graft_tip_on_edge(&mut tree, n, i_edge)?;
        }
    }
    reroot_first(&mut tree)?;

    Ok(tree)
}

/// Uniformly permute tip names in place.
pub fn shuffle_tips<R: Rng>(tree: &mut Tree, rng: &mut R) {
    let tips = super::query::tips(tree);
    let mut names: Vec<String> = tips.iter().map(|&t| tree.nodes[t].name.clone()).collect();
    names.shuffle(rng);
    for (&t, name) in tips.iter().zip(names) {
        tree.nodes[t].name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reroot_unique_parent() {
        let mut tree = Tree::from_newick("((A,B),(C,(D,E)));").unwrap();
        let d = tree.get_node_by_name("D").unwrap();
        let inner = tree.parent_of(d).unwrap();

        tree.reroot(inner).unwrap();
        assert_eq!(tree.root(), Some(inner));
        assert_eq!(tree.get_node(inner).unwrap().depth, 0);

        for node in tree.nodes() {
            if node.id == inner {
                assert!(matches!(
                    tree.parent_edge_of(node.id),
                    Err(TreeError::NoParent(_))
                ));
            } else {
                let e = tree.parent_edge_of(node.id).unwrap();
                assert_eq!(tree.get_edge(e).unwrap().right, node.id);
                // depth is one more than the parent's
                let p = tree.get_edge(e).unwrap().left;
                assert_eq!(node.depth, tree.get_node(p).unwrap().depth + 1);
            }
        }
    }

    #[test]
    fn test_reroot_foreign_node() {
        let mut tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        assert!(matches!(
            tree.reroot(99),
            Err(TreeError::NodeNotInTree(99))
        ));
    }

    #[test]
    fn test_reroot_first_needs_trifurcation() {
        // A two-tip tree has no three-neighbor node
        let mut tree = Tree::from_newick("(A,B);").unwrap();
        assert_eq!(tree.reroot_first(), Err(TreeError::NoTrifurcation));

        // In a rooted binary tree, internal non-root nodes have three
        // neighbors; the first one in creation order wins
        let mut tree = Tree::from_newick("((A,B),(C,D));").unwrap();
        let a = tree.get_node_by_name("A").unwrap();
        let ab = tree.parent_of(a).unwrap();
        assert!(tree.reroot_first().is_ok());
        assert_eq!(tree.root(), Some(ab));
    }

    #[test]
    fn test_graft_counts_and_lengths() {
        let mut tree = Tree::from_newick("(A:1,B:2,(C:3,D:4):6);").unwrap();
        let nodes_before = tree.node_count();
        let edges_before = tree.edge_count();

        let c = tree.get_node_by_name("C").unwrap();
        let inner = tree.parent_of(c).unwrap();
        let target = tree.parent_edge_of(inner).unwrap();

        let tip = tree.add_node();
        tree.get_node_mut(tip).unwrap().set_name("X");
        tree.graft_tip_on_edge(tip, target).unwrap();

        // +1 tip node +1 internal node, +2 edges
        assert_eq!(tree.node_count(), nodes_before + 2);
        assert_eq!(tree.edge_count(), edges_before + 2);

        // The split edge halves its length
        assert_eq!(tree.edges()[target].length, Some(3.0));
        let far = tree.edge_count() - 1;
        assert_eq!(tree.edges()[far].length, Some(3.0));

        // Adjacency symmetry holds after the rewiring
        for edge in tree.edges() {
            for &end in &[edge.left, edge.right] {
                let i = tree.edge_index(end, edge.id).unwrap();
                assert_eq!(tree.get_node(end).unwrap().neigh[i], edge.other(end));
            }
        }

        // Untouched tips keep their names
        let mut names = tree.tip_names();
        names.sort();
        assert_eq!(names, vec!["A", "B", "C", "D", "X"]);
    }

    #[test]
    fn test_random_binary_tree_structure() {
        let mut rng = StdRng::seed_from_u64(42);
        let nbtips = 10;
        let tree = random_binary_tree(&mut rng, nbtips).unwrap();

        assert_eq!(tree.tips().len(), nbtips);
        assert_eq!(tree.edge_count(), 2 * nbtips - 3);

        // Proper unrooted binary tree: tips degree 1, internals degree 3
        for node in tree.nodes() {
            let deg = node.neigh.len();
            assert!(deg == 1 || deg == 3, "degree {} at node {}", deg, node.id);
        }

        // Tip1 .. Tip{nbtips-1} appear exactly once
        let names = tree.tip_names();
        for i in 1..nbtips {
            let want = format!("Tip{}", i);
            assert_eq!(names.iter().filter(|n| **n == want).count(), 1);
        }

        // Root is a trifurcation
        let root = tree.root().unwrap();
        assert_eq!(tree.get_node(root).unwrap().neigh.len(), 3);
    }

    #[test]
    fn test_random_binary_tree_too_small() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_binary_tree(&mut rng, 2).is_err());
    }

    #[test]
    fn test_shuffle_tips_permutes_names() {
        let mut tree = Tree::from_newick("((A,B),(C,(D,E)));").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let before = tree.tip_names();
        tree.shuffle_tips(&mut rng);
        let after = tree.tip_names();

        let mut a = before.clone();
        let mut b = after.clone();
        a.sort();
        b.sort();
        assert_eq!(a, b);

        // Topology untouched
        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.edge_count(), 8);
    }
}

use super::Tree;
use crate::libs::phylo::edge::Edge;
use crate::libs::phylo::error::TreeError;
use fixedbitset::FixedBitSet;
use itertools::Itertools;
use std::collections::HashMap;

/// Map tip names to dense indices `0..N`, sorted by name.
///
/// Sorting makes the indices independent of tip order in the input, so
/// maps built from different files over the same taxa agree.
pub fn leaf_map(tree: &Tree) -> Result<HashMap<String, usize>, TreeError> {
    let mut names = Vec::new();
    for node in tree.nodes() {
        if node.is_tip() {
            if node.name.is_empty() {
                return Err(TreeError::UnnamedTip(node.id));
            }
            names.push(node.name.clone());
        }
    }
    names.sort();

    let mut map = HashMap::new();
    for (idx, name) in names.into_iter().dedup().enumerate() {
        map.insert(name, idx);
    }
    Ok(map)
}

/// Compute and store the bipartition bitset of every edge.
///
/// The tip set below `e.right` is accumulated bottom-up over one reverse
/// preorder pass. The stored side is normalized to the one NOT containing
/// tip index 0 (the designated outgroup), so equal bitsets mean equal
/// bipartitions across trees sharing the same leaf map.
pub fn assign_edge_bitsets(
    tree: &mut Tree,
    leaf_map: &HashMap<String, usize>,
) -> Result<(), TreeError> {
    let nbits = leaf_map.len();
    let pairs = tree.preorder_pairs();
    let mut below: Vec<FixedBitSet> =
        vec![FixedBitSet::with_capacity(nbits); tree.node_count()];

    for &(id, parent) in pairs.iter().rev() {
        if tree.is_tip(id) {
            let name = &tree.nodes()[id].name;
            let idx = *leaf_map.get(name).ok_or_else(|| {
                TreeError::LogicError(format!("tip {:?} is absent from the leaf map", name))
            })?;
            below[id].insert(idx);
        }
        if let Some(p) = parent {
            let child_set = below[id].clone();
            below[p].union_with(&child_set);
        }
    }

    for eid in 0..tree.edge_count() {
        let right = tree.edges()[eid].right;
        let mut bs = below[right].clone();
        if bs.contains(0) {
            bs.toggle_range(..);
        }
        tree.edges_mut()[eid].bitset = Some(bs);
    }
    Ok(())
}

/// Topological depth of an edge: the size of the smaller side of its
/// bipartition. Requires `assign_edge_bitsets` to have run.
pub fn topo_depth(edge: &Edge, nb_tips: usize) -> Result<usize, TreeError> {
    let bs = edge.bitset.as_ref().ok_or_else(|| {
        TreeError::LogicError(format!("edge {} has no bipartition bitset", edge.id))
    })?;
    let ones = bs.count_ones(..);
    Ok(ones.min(nb_tips - ones))
}

/// The bitwise complement over the bitset's full length.
pub fn complement(bs: &FixedBitSet) -> FixedBitSet {
    let mut c = bs.clone();
    c.toggle_range(..);
    c
}

/// Two edges over a common tip index space induce the same bipartition
/// iff their bitsets are equal or complementary.
pub fn equal_or_complement(a: &FixedBitSet, b: &FixedBitSet) -> bool {
    a == b || *a == complement(b)
}

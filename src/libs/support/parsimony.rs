use super::{BootVal, SupportContext, Supporter};
use crate::libs::phylo::node::NodeId;
use crate::libs::phylo::tree::Tree;
use anyhow::anyhow;
use crossbeam::channel::{Receiver, Sender};
use fixedbitset::FixedBitSet;
use std::collections::HashMap;

/// Parsimony-step supporter.
///
/// The per-replicate statistic of a reference edge is the Fitch parsimony
/// score of its bipartition, treated as a binary character on the
/// replicate topology, minus one: 0 means the bipartition occurs in the
/// replicate, larger values measure how scattered its minority side is.
///
/// The analytic null models the excess steps of a random edge of depth
/// `d` as one less than the number of runs of a uniformly random
/// `d`-subset in a linear arrangement of the `n` tips:
/// `P(X = v) = C(d-1, v) * C(n-d+1, v+1) / C(n, d)`, with mean
/// `d*(n-d+1)/n - 1`.
pub struct ParsimonySupporter {
    nb_tips: usize,
    expected: Vec<f64>,
    proba: Vec<Vec<f64>>,
}

impl ParsimonySupporter {
    pub fn new() -> Self {
        Self {
            nb_tips: 0,
            expected: Vec::new(),
            proba: Vec::new(),
        }
    }
}

impl Default for ParsimonySupporter {
    fn default() -> Self {
        Self::new()
    }
}

fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = vec![0.0; n + 1];
    for i in 1..=n {
        table[i] = table[i - 1] + (i as f64).ln();
    }
    table
}

fn ln_choose(lnfact: &[f64], n: usize, k: usize) -> f64 {
    lnfact[n] - lnfact[k] - lnfact[n - k]
}

impl Supporter for ParsimonySupporter {
    fn init(&mut self, max_depth: usize, nb_tips: usize) {
        self.nb_tips = nb_tips;
        let lnfact = ln_factorials(nb_tips + 1);

        self.expected = (0..=max_depth)
            .map(|d| {
                if d == 0 {
                    0.0
                } else {
                    let (d, n) = (d as f64, nb_tips as f64);
                    d * (n - d + 1.0) / n - 1.0
                }
            })
            .collect();

        self.proba = (0..=max_depth)
            .map(|d| {
                if d == 0 {
                    return vec![1.0];
                }
                let vmax = (d - 1).min(nb_tips - d);
                (0..=vmax)
                    .map(|v| {
                        (ln_choose(&lnfact, d - 1, v)
                            + ln_choose(&lnfact, nb_tips - d + 1, v + 1)
                            - ln_choose(&lnfact, nb_tips, d))
                        .exp()
                    })
                    .collect()
            })
            .collect();
    }

    fn expected_rand_values(&self, depth: usize) -> f64 {
        self.expected[depth]
    }

    fn proba_depth_value(&self, depth: usize, value: usize) -> f64 {
        self.proba
            .get(depth)
            .and_then(|row| row.get(value))
            .copied()
            .unwrap_or(0.0)
    }

    fn compute_value(
        &self,
        ctx: &SupportContext,
        _worker: usize,
        empirical: bool,
        boot_rcv: &Receiver<Tree>,
        val_snd: &Sender<BootVal>,
        rand_snd: &Sender<BootVal>,
    ) -> anyhow::Result<()> {
        let ref_edges = ctx.ref_tree.edges();
        let mut ref_vals = vec![0usize; ref_edges.len()];

        for boot in boot_rcv.iter() {
            let pairs = boot.preorder_pairs();
            let tip_idx = tip_indices(&boot, ctx.leaf_map)?;
            let mut state = vec![0u8; boot.node_count()];

            for edge in ref_edges {
                let bs = edge.bitset.as_ref().expect("reference edges carry bitsets");
                let steps = fitch_steps(&boot, &pairs, &tip_idx, bs, &mut state);
                let value = steps.saturating_sub(1);
                ref_vals[edge.id] = value;
                val_snd
                    .send(BootVal {
                        edge_id: edge.id,
                        value,
                        rand_gte: false,
                    })
                    .map_err(|_| anyhow!("value channel closed early"))?;
            }

            if empirical {
                for rand_tree in ctx.rand_trees {
                    for edge in rand_tree.edges() {
                        let bs = edge.bitset.as_ref().expect("shuffled edges carry bitsets");
                        let steps = fitch_steps(&boot, &pairs, &tip_idx, bs, &mut state);
                        let value = steps.saturating_sub(1);
                        rand_snd
                            .send(BootVal {
                                edge_id: edge.id,
                                value,
                                rand_gte: value <= ref_vals[edge.id],
                            })
                            .map_err(|_| anyhow!("shuffled-value channel closed early"))?;
                    }
                }
            }
        }

        Ok(())
    }
}

// Tip index per node id for one replicate tree, None on internal nodes.
// A replicate tip missing from the reference leaf map is a hard error.
fn tip_indices(
    tree: &Tree,
    leaf_map: &HashMap<String, usize>,
) -> anyhow::Result<Vec<Option<usize>>> {
    tree.nodes()
        .iter()
        .map(|n| {
            if n.is_tip() {
                leaf_map
                    .get(&n.name)
                    .copied()
                    .map(Some)
                    .ok_or_else(|| anyhow!("replicate tip {:?} is absent from the reference tree", n.name))
            } else {
                Ok(None)
            }
        })
        .collect()
}

// Fitch parsimony score of the binary character `bs` on the replicate
// topology. Tips take state 01 (in the set) or 10; one reverse-preorder
// pass combines children by intersection where possible, otherwise by
// union at the cost of one step. Exact for the binary trees (with one
// trifurcation at the root) that bootstrap files contain.
fn fitch_steps(
    tree: &Tree,
    pairs: &[(NodeId, Option<NodeId>)],
    tip_idx: &[Option<usize>],
    bs: &FixedBitSet,
    state: &mut [u8],
) -> usize {
    let mut steps = 0;

    for &(id, parent) in pairs.iter().rev() {
        if let Some(idx) = tip_idx[id] {
            state[id] = if bs.contains(idx) { 0b01 } else { 0b10 };
        } else {
            let mut acc = 0u8;
            for &child in &tree.nodes()[id].neigh {
                if Some(child) == parent {
                    continue;
                }
                let s = state[child];
                if acc == 0 {
                    acc = s;
                } else if acc & s != 0 {
                    acc &= s;
                } else {
                    acc |= s;
                    steps += 1;
                }
            }
            state[id] = acc;
        }
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::phylo::tree::bipart;
    use approx::assert_abs_diff_eq;

    fn char_of(tree: &Tree, names: &[&str]) -> (Vec<(NodeId, Option<NodeId>)>, Vec<Option<usize>>, FixedBitSet)
    {
        let map = bipart::leaf_map(tree).unwrap();
        let mut bs = FixedBitSet::with_capacity(map.len());
        for name in names {
            bs.insert(map[*name]);
        }
        let tip_idx = tip_indices(tree, &map).unwrap();
        (tree.preorder_pairs(), tip_idx, bs)
    }

    #[test]
    fn test_fitch_present_bipartition() {
        let tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        let (pairs, tip_idx, bs) = char_of(&tree, &["C", "D"]);
        let mut state = vec![0u8; tree.node_count()];
        assert_eq!(fitch_steps(&tree, &pairs, &tip_idx, &bs, &mut state), 1);
    }

    #[test]
    fn test_fitch_absent_bipartition() {
        let tree = Tree::from_newick("(A,D,(C,B));").unwrap();
        let (pairs, tip_idx, bs) = char_of(&tree, &["C", "D"]);
        let mut state = vec![0u8; tree.node_count()];
        assert_eq!(fitch_steps(&tree, &pairs, &tip_idx, &bs, &mut state), 2);
    }

    #[test]
    fn test_fitch_scattered_character() {
        // B, D, F pairwise separated: three independent origins
        let tree = Tree::from_newick("((A,B),((C,D),(E,F)));").unwrap();
        let (pairs, tip_idx, bs) = char_of(&tree, &["B", "D", "F"]);
        let mut state = vec![0u8; tree.node_count()];
        assert_eq!(fitch_steps(&tree, &pairs, &tip_idx, &bs, &mut state), 3);
    }

    #[test]
    fn test_fitch_constant_character() {
        let tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        let (pairs, tip_idx, bs) = char_of(&tree, &["A", "B", "C", "D"]);
        let mut state = vec![0u8; tree.node_count()];
        assert_eq!(fitch_steps(&tree, &pairs, &tip_idx, &bs, &mut state), 0);
    }

    #[test]
    fn test_null_tables_sum_to_one() {
        let mut sup = ParsimonySupporter::new();
        sup.init(8, 16);

        for d in 1..=8 {
            let total: f64 = (0..=d).map(|v| sup.proba_depth_value(d, v)).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);

            // The table mean matches the closed-form expectation
            let mean: f64 = (0..=d)
                .map(|v| v as f64 * sup.proba_depth_value(d, v))
                .sum();
            assert_abs_diff_eq!(mean, sup.expected_rand_values(d), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_null_tables_small_case() {
        // d = 2, n = 4: P(X=0) = C(1,0)C(3,1)/C(4,2) = 3/6,
        //               P(X=1) = C(1,1)C(3,2)/C(4,2) = 3/6
        let mut sup = ParsimonySupporter::new();
        sup.init(2, 4);

        assert_abs_diff_eq!(sup.proba_depth_value(2, 0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sup.proba_depth_value(2, 1), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sup.expected_rand_values(2), 0.5, epsilon = 1e-12);

        // Depth-1 edges can never cost an excess step
        assert_abs_diff_eq!(sup.proba_depth_value(1, 0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sup.expected_rand_values(1), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_range_proba_is_zero() {
        let mut sup = ParsimonySupporter::new();
        sup.init(4, 8);
        assert_eq!(sup.proba_depth_value(2, 5), 0.0);
        assert_eq!(sup.proba_depth_value(4, 4), 0.0);
    }
}

pub mod parsimony;

pub use parsimony::ParsimonySupporter;

use crate::libs::phylo::reader::TreeReader;
use crate::libs::phylo::tree::{bipart, Tree};
use anyhow::Context;
use crossbeam::channel::{bounded, Receiver, Sender};
use rand::Rng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Number of tip-shuffled copies of the reference tree backing the
/// empirical null model.
const NB_EMPIRICAL_TREES: usize = 10;
/// Capacity of the bootstrap tree queue.
const BOOT_QUEUE_CAP: usize = 15;
/// Capacity of the per-edge result channels.
const RESULT_QUEUE_CAP: usize = 1000;

/// One per-edge observation emitted by a worker.
#[derive(Debug, Clone, Copy)]
pub struct BootVal {
    pub edge_id: usize,
    pub value: usize,
    /// Empirical mode only: the shuffled edge's statistic on this
    /// replicate is at least as extreme as the reference edge's.
    pub rand_gte: bool,
}

/// Shared read-only inputs of a running support computation.
pub struct SupportContext<'a> {
    pub ref_tree: &'a Tree,
    pub rand_trees: &'a [Tree],
    pub leaf_map: &'a HashMap<String, usize>,
}

/// Pluggable per-replicate statistic.
///
/// `init` is called once before any worker starts; everything the other
/// three operations read must be immutable afterwards, since workers
/// share the supporter across threads.
pub trait Supporter: Sync {
    /// Precompute depth-conditional tables.
    fn init(&mut self, max_depth: usize, nb_tips: usize);

    /// Mean of the statistic under the null model for an edge of the
    /// given topological depth.
    fn expected_rand_values(&self, depth: usize) -> f64;

    /// P(statistic == value) under the null model for an edge of the
    /// given topological depth.
    fn proba_depth_value(&self, depth: usize, value: usize) -> f64;

    /// Long-running worker body: drain `boot_rcv`, emitting one value per
    /// reference edge per replicate on `val_snd` (and per shuffled edge
    /// on `rand_snd` in empirical mode).
    fn compute_value(
        &self,
        ctx: &SupportContext,
        worker: usize,
        empirical: bool,
        boot_rcv: &Receiver<Tree>,
        val_snd: &Sender<BootVal>,
        rand_snd: &Sender<BootVal>,
    ) -> anyhow::Result<()>;
}

/// Compute per-branch supports of the reference tree against a stream of
/// bootstrap replicates.
///
/// A producer thread streams replicate trees into a bounded queue, `cpus`
/// workers compute per-edge statistics, and two aggregators reduce them
/// into per-edge sums. Once every channel has drained, each internal edge
/// receives its support and its right endpoint is renamed to
/// `"support/pvalue"` (two and four decimals).
pub fn compute_support<R: Rng>(
    ref_file: &str,
    boot_file: &str,
    empirical: bool,
    cpus: usize,
    supporter: &mut dyn Supporter,
    rng: &mut R,
) -> anyhow::Result<Tree> {
    let max_cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let cpus = cpus.clamp(1, max_cpus);

    let ref_text = crate::libs::io::read_to_string(ref_file);
    let mut ref_tree = Tree::from_newick(&ref_text).context("reading the reference tree")?;

    let leaf_map = bipart::leaf_map(&ref_tree)?;
    bipart::assign_edge_bitsets(&mut ref_tree, &leaf_map)?;
    let nb_tips = leaf_map.len();
    let n_edges = ref_tree.edge_count();

    let depths = ref_tree
        .edges()
        .iter()
        .map(|e| bipart::topo_depth(e, nb_tips))
        .collect::<Result<Vec<_>, _>>()?;
    let max_depth = depths.iter().copied().max().unwrap_or(0);

    supporter.init(max_depth, nb_tips);

    // Empirical null: shuffled copies of the reference tree. Re-parsing
    // the same text makes their edge ids line up with the reference ids.
    let mut rand_trees = Vec::new();
    if empirical {
        for _ in 0..NB_EMPIRICAL_TREES {
            let mut t = Tree::from_newick(&ref_text).context("re-reading the reference tree")?;
            t.shuffle_tips(rng);
            rand_trees.push(t);
        }
        rand_trees
            .par_iter_mut()
            .try_for_each(|t| bipart::assign_edge_bitsets(t, &leaf_map))?;
    }

    let supporter: &dyn Supporter = supporter;
    let ctx = SupportContext {
        ref_tree: &ref_tree,
        rand_trees: &rand_trees,
        leaf_map: &leaf_map,
    };
    let stop = AtomicBool::new(false);

    let (boot_snd, boot_rcv) = bounded::<Tree>(BOOT_QUEUE_CAP);
    let (val_snd, val_rcv) = bounded::<BootVal>(RESULT_QUEUE_CAP);
    let (rand_snd, rand_rcv) = bounded::<BootVal>(RESULT_QUEUE_CAP);

    let (nbtrees, sum_val, sum_rand_val, gt_rand) = crossbeam::scope(
        |s| -> anyhow::Result<(usize, Vec<u64>, Vec<u64>, Vec<f64>)> {
            //----------------------------
            // Producer thread
            //----------------------------
            let producer = {
                let stop = &stop;
                s.spawn(move |_| -> anyhow::Result<usize> {
                    let mut nbtrees = 0;
                    for tree in TreeReader::from_file(boot_file) {
                        if stop.load(Ordering::Relaxed) {
                            break;
                        }
                        let tree = tree.context("reading bootstrap trees")?;
                        if boot_snd.send(tree).is_err() {
                            break;
                        }
                        nbtrees += 1;
                    }
                    Ok(nbtrees)
                })
            };

            //----------------------------
            // Worker threads
            //----------------------------
            let mut workers = Vec::with_capacity(cpus);
            for cpu in 0..cpus {
                let boot_rcv = boot_rcv.clone();
                let val_snd = val_snd.clone();
                let rand_snd = rand_snd.clone();
                let (ctx, stop) = (&ctx, &stop);
                workers.push(s.spawn(move |_| {
                    let res =
                        supporter.compute_value(ctx, cpu, empirical, &boot_rcv, &val_snd, &rand_snd);
                    if res.is_err() {
                        // Unblock the producer: raise the flag and drain
                        // whatever is still queued
                        stop.store(true, Ordering::Relaxed);
                        for _ in boot_rcv.iter() {}
                    }
                    res
                }));
            }
            // The result channels close when the last worker drops its
            // clones; without these drops the aggregators would wait on
            // the originals forever
            drop(boot_rcv);
            drop(val_snd);
            drop(rand_snd);

            let mut sum_val = vec![0u64; n_edges];
            let mut gt_rand = vec![0.0f64; n_edges];

            //----------------------------
            // Secondary aggregator (empirical only)
            //----------------------------
            let rand_agg = if empirical {
                Some(s.spawn(move |_| {
                    let mut sum_rand_val = vec![0u64; n_edges];
                    let mut gt_rand = vec![0.0f64; n_edges];
                    for bv in rand_rcv.iter() {
                        sum_rand_val[bv.edge_id] += bv.value as u64;
                        if bv.rand_gte {
                            gt_rand[bv.edge_id] += 1.0;
                        }
                    }
                    (sum_rand_val, gt_rand)
                }))
            } else {
                drop(rand_rcv);
                None
            };

            //----------------------------
            // Primary aggregator
            //----------------------------
            for bv in val_rcv.iter() {
                sum_val[bv.edge_id] += bv.value as u64;
                if !empirical {
                    // Analytic null: accumulate the tail mass P(X <= value)
                    let d = depths[bv.edge_id];
                    for v in 0..=bv.value {
                        gt_rand[bv.edge_id] += supporter.proba_depth_value(d, v);
                    }
                }
            }

            let nbtrees = producer.join().unwrap()?;
            for w in workers {
                w.join().unwrap()?;
            }

            let sum_rand_val = match rand_agg {
                Some(h) => {
                    let (sum_rand_val, gt) = h.join().unwrap();
                    gt_rand = gt;
                    sum_rand_val
                }
                None => vec![0u64; n_edges],
            };

            Ok((nbtrees, sum_val, sum_rand_val, gt_rand))
        },
    )
    .unwrap()?;

    //----------------------------
    // Supports and p-values
    //----------------------------
    let nb_rand_f = NB_EMPIRICAL_TREES as f64;
    let nbtrees_f = nbtrees as f64;

    for i in 0..n_edges {
        let right = ref_tree.edges()[i].right;
        if ref_tree.is_tip(right) {
            continue;
        }
        let d = depths[i];

        let avg_val = if nbtrees == 0 {
            0.0
        } else {
            sum_val[i] as f64 / nbtrees_f
        };
        let (avg_rand, pval) = if empirical {
            if nbtrees == 0 {
                (0.0, 0.0)
            } else {
                (
                    sum_rand_val[i] as f64 / (nb_rand_f * nbtrees_f),
                    gt_rand[i] / (nb_rand_f * nbtrees_f),
                )
            }
        } else {
            let pval = if nbtrees == 0 {
                0.0
            } else {
                gt_rand[i] / nbtrees_f
            };
            (supporter.expected_rand_values(d), pval)
        };

        let support = if avg_val == 0.0 {
            1.0
        } else {
            1.0 - avg_val / avg_rand
        };

        ref_tree.edges_mut()[i].support = Some(support);
        ref_tree
            .get_node_mut(right)
            .unwrap()
            .set_name(format!("{:.2}/{:.4}", support, pval));
    }

    Ok(ref_tree)
}

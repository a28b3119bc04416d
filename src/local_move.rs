use crate::{Partition, WeightedGraph};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

const EPSILON: f64 = 1e-12;

/// How candidate target communities are enumerated for a node during a local move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateStrategy {
    Neighbors,
    All,
    Random,
    RandomNeighbor,
}

/// The quality objective and its parameters, bundled for the move loop's hot path so
/// it doesn't need the full `Options` struct (which also carries CLI/driver-only fields).
#[derive(Debug, Clone, Copy)]
pub enum Objective {
    Modularity,
    Cpm { resolution: f64 },
}

impl Objective {
    fn delta<T>(&self, partition: &Partition, v: usize, c: usize, graph: &WeightedGraph<T>) -> f64
    where
        T: Hash + Eq + Clone,
    {
        match (self, graph.directed) {
            (Objective::Modularity, false) => partition.delta_modularity_undirected(v, c, graph),
            (Objective::Modularity, true) => partition.delta_modularity_directed(v, c, graph),
            (Objective::Cpm { resolution }, _) => partition.delta_cpm(v, c, graph, *resolution),
        }
    }
}

/// Parameters that bound and steer a single local-move pass, shared by the
/// top-level Louvain loop and by Leiden refinement (which adds a macro-community
/// admissibility filter on top of these).
pub struct LocalMoveOptions {
    pub candidate_strategy: CandidateStrategy,
    pub allow_new_community: bool,
    pub max_community_size: Option<f64>,
    pub max_local_passes: usize,
}

/// Runs the local-move loop (§4.4) to convergence (or `max_local_passes`), mutating
/// `partition` in place. `admissible(v, c)` lets Leiden refinement restrict candidates
/// to `v`'s macro community; pass `|_, _| true` for the unconstrained Louvain loop.
/// Returns whether any node moved at all.
#[allow(clippy::too_many_arguments)]
pub fn run_local_move_loop<T>(
    partition: &mut Partition,
    graph: &WeightedGraph<T>,
    objective: Objective,
    options: &LocalMoveOptions,
    fixed_nodes: &HashSet<usize>,
    admissible: impl Fn(usize, usize) -> bool,
    rng: &mut StdRng,
) -> bool
where
    T: Hash + Eq + Clone,
{
    let n = graph.number_of_nodes();
    let mut order: Vec<usize> = (0..n).collect();
    let mut any_improvement = false;
    let mut pass = 0;
    loop {
        order.shuffle(rng);
        let mut improved = false;
        for &v in &order {
            if fixed_nodes.contains(&v) {
                continue;
            }
            partition.accumulate_neighbors(v, graph);
            let old_c = partition.node_community(v);
            let s_v = graph.size(v);

            let mut candidates: Vec<usize> = match options.candidate_strategy {
                CandidateStrategy::Neighbors => partition.candidates().to_vec(),
                CandidateStrategy::All => (0..partition.community_count()).collect(),
                CandidateStrategy::Random => sample_with_replacement(rng, partition.community_count()),
                CandidateStrategy::RandomNeighbor => {
                    sample_from_pool(rng, partition.candidates())
                }
            };
            if options.allow_new_community {
                candidates.push(partition.community_count());
            }

            let mut best_gain = 0.0;
            let mut best_c: Option<usize> = None;
            for c in candidates {
                if c == old_c || !admissible(v, c) {
                    continue;
                }
                if let Some(cap) = options.max_community_size {
                    let existing = if c < partition.community_count() {
                        partition.total_size(c)
                    } else {
                        0.0
                    };
                    if existing + s_v > cap {
                        continue;
                    }
                }
                let gain = objective.delta(partition, v, c, graph);
                if gain > best_gain {
                    best_gain = gain;
                    best_c = Some(c);
                }
            }

            if let Some(c) = best_c {
                if best_gain > EPSILON {
                    partition.move_node_to_community(v, c, graph);
                    improved = true;
                    any_improvement = true;
                }
            }
        }
        pass += 1;
        if !improved || pass >= options.max_local_passes {
            break;
        }
    }
    any_improvement
}

/// Draws `min(10, max(1, range))` samples with replacement from `0..range`
/// (RandomAny strategy's trial budget, per §4.4).
fn sample_with_replacement(rng: &mut StdRng, range: usize) -> Vec<usize> {
    if range == 0 {
        return Vec::new();
    }
    let budget = 10usize.min(range.max(1));
    (0..budget).map(|_| rng.gen_range(0..range)).collect()
}

/// Draws `min(10, max(1, |pool|))` samples with replacement from an explicit
/// candidate pool (RandomNeighbor strategy).
fn sample_from_pool(rng: &mut StdRng, pool: &[usize]) -> Vec<usize> {
    if pool.is_empty() {
        return Vec::new();
    }
    let budget = 10usize.min(pool.len().max(1));
    (0..budget).map(|_| pool[rng.gen_range(0..pool.len())]).collect()
}

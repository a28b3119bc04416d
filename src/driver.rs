use crate::coarsen::coarsen;
use crate::local_move::{run_local_move_loop, CandidateStrategy, LocalMoveOptions, Objective};
use crate::partition::RenumberMode;
use crate::quality::{quality, CpmMode, QualityFunction};
use crate::refine::refine;
use crate::{Error, Partition, WeightedGraph};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// Renumbering policy applied after each local-move phase (§4.2's `compactCommunityIds`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreserveLabels {
    False,
    True,
    Map(HashMap<usize, i64>),
}

/// Tunables for `detect_clusters`, with defaults matching §6's options table.
///
/// `link_weight`/`node_size` from that table aren't fields here: this crate resolves
/// edge weight and node size before construction, at the [`WeightedGraph::build`]
/// call site, so by the time `detect_clusters` runs there's nothing left to hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Options {
    pub quality: QualityFunction,
    pub resolution: f64,
    pub directed: bool,
    pub random_seed: u64,
    pub candidate_strategy: CandidateStrategy,
    pub allow_new_community: bool,
    pub max_community_size: Option<f64>,
    pub refine: bool,
    pub preserve_labels: PreserveLabels,
    pub max_levels: usize,
    pub max_local_passes: usize,
    pub cpm_mode: CpmMode,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            quality: QualityFunction::Modularity,
            resolution: 1.0,
            directed: false,
            random_seed: 42,
            candidate_strategy: CandidateStrategy::Neighbors,
            allow_new_community: false,
            max_community_size: None,
            refine: true,
            preserve_labels: PreserveLabels::False,
            max_levels: 50,
            max_local_passes: 20,
            cpm_mode: CpmMode::Unit,
        }
    }
}

/// The result of `detect_clusters`: a membership for every original node id, plus
/// the quality score and level count that produced it.
pub struct Clusters<T> {
    id_to_index: HashMap<T, usize>,
    index_to_id: Vec<T>,
    membership: Vec<usize>,
    levels: usize,
    quality_value: f64,
    options: Options,
}

impl<T> Clusters<T>
where
    T: Hash + Eq + Clone + fmt::Display,
{
    fn new(
        graph: &WeightedGraph<T>,
        membership: Vec<usize>,
        levels: usize,
        quality_value: f64,
        options: Options,
    ) -> Clusters<T> {
        let index_to_id = graph.index_to_id().to_vec();
        let id_to_index = index_to_id
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        Clusters {
            id_to_index,
            index_to_id,
            membership,
            levels,
            quality_value,
            options,
        }
    }

    /// The final community id for a node, or `None` if `id` isn't in this graph.
    pub fn get_class(&self, id: &T) -> Option<usize> {
        self.id_to_index.get(id).map(|&i| self.membership[i])
    }

    /// Community id -> member node ids.
    pub fn get_communities(&self) -> HashMap<usize, Vec<T>> {
        let mut out: HashMap<usize, Vec<T>> = HashMap::new();
        for (i, &c) in self.membership.iter().enumerate() {
            out.entry(c).or_default().push(self.index_to_id[i].clone());
        }
        out
    }

    pub fn quality(&self) -> f64 {
        self.quality_value
    }

    pub fn to_json(&self) -> serde_json::Value {
        let membership: serde_json::Map<String, serde_json::Value> = self
            .index_to_id
            .iter()
            .zip(self.membership.iter())
            .map(|(id, &c)| (id.to_string(), serde_json::json!(c)))
            .collect();
        serde_json::json!({
            "membership": membership,
            "meta": {
                "levels": self.levels,
                "quality": self.quality_value,
                "options": self.options,
            }
        })
    }
}

/**
Runs the outer multi-level loop (§4.7): local-move, optional refine, renumber,
coarsen, repeat until a level produces no aggregation (community count equals node
count) or `max_levels` is reached. `fixed_nodes` (dense indices into `graph`) are
only honored at the finest level, per §6.
*/
pub fn detect_clusters<T>(
    graph: &WeightedGraph<T>,
    options: &Options,
    fixed_nodes: &HashSet<usize>,
) -> Result<Clusters<T>, Error>
where
    T: Hash + Eq + Clone + fmt::Display,
{
    let n0 = graph.number_of_nodes();
    let mut original_to_current: Vec<usize> = (0..n0).collect();
    let mut current_graph = graph.to_usize_graph();
    let mut rng = StdRng::seed_from_u64(options.random_seed);

    let objective = match options.quality {
        QualityFunction::Modularity => Objective::Modularity,
        QualityFunction::Cpm => Objective::Cpm {
            resolution: options.resolution,
        },
    };
    let renumber_mode = match &options.preserve_labels {
        PreserveLabels::False => RenumberMode::Default,
        PreserveLabels::True => RenumberMode::KeepOldOrder,
        PreserveLabels::Map(m) => RenumberMode::PreserveMap(m.clone()),
    };
    let local_move_options = LocalMoveOptions {
        candidate_strategy: options.candidate_strategy,
        allow_new_community: options.allow_new_community,
        max_community_size: options.max_community_size,
        max_local_passes: options.max_local_passes,
    };

    let mut levels = 0usize;
    let mut final_quality = 0.0;

    for level in 0..options.max_levels.max(1) {
        let level_fixed: HashSet<usize> = if level == 0 {
            fixed_nodes.clone()
        } else {
            HashSet::new()
        };

        let mut partition = Partition::singletons(&current_graph);
        run_local_move_loop(
            &mut partition,
            &current_graph,
            objective,
            &local_move_options,
            &level_fixed,
            |_, _| true,
            &mut rng,
        );
        let (mut partition, _) = partition.compact_community_ids(&current_graph, &renumber_mode);

        if options.refine {
            let refined = refine(
                &partition,
                &current_graph,
                objective,
                options.candidate_strategy,
                options.max_community_size,
                options.max_local_passes,
                &level_fixed,
                &mut rng,
            );
            let (refined, _) = refined.compact_community_ids(&current_graph, &renumber_mode);
            partition = refined;
        }

        levels += 1;
        log::debug!(
            "level {}: {} nodes -> {} communities",
            level,
            current_graph.number_of_nodes(),
            partition.community_count()
        );

        for oc in original_to_current.iter_mut() {
            *oc = partition.node_community(*oc);
        }
        final_quality = quality(
            &partition,
            options.directed,
            options.quality,
            options.resolution,
            options.cpm_mode,
        );

        if partition.community_count() == current_graph.number_of_nodes() {
            break;
        }
        current_graph = coarsen(&current_graph, &partition);
    }

    Ok(Clusters::new(
        graph,
        original_to_current,
        levels,
        final_quality,
        options.clone(),
    ))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::weighted_graph::InputEdge;

    fn two_cliques_bridged() -> WeightedGraph<usize> {
        let mut edges = Vec::new();
        for &(a, b) in &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)] {
            edges.push(InputEdge::new(a, b, 1.0));
        }
        for &(a, b) in &[(4, 5), (4, 6), (4, 7), (5, 6), (5, 7), (6, 7)] {
            edges.push(InputEdge::new(a, b, 1.0));
        }
        edges.push(InputEdge::new(3, 4, 1.0));
        WeightedGraph::build(Some((0..8).collect()), &edges, &HashMap::new(), false).unwrap()
    }

    #[test]
    fn test_detect_clusters_splits_bridged_cliques() {
        let g = two_cliques_bridged();
        let options = Options {
            random_seed: 1,
            ..Options::default()
        };
        let clusters = detect_clusters(&g, &options, &HashSet::new()).unwrap();
        let a = clusters.get_class(&0).unwrap();
        for i in [1, 2, 3] {
            assert_eq!(clusters.get_class(&i).unwrap(), a);
        }
        let b = clusters.get_class(&4).unwrap();
        for i in [5, 6, 7] {
            assert_eq!(clusters.get_class(&i).unwrap(), b);
        }
        assert_ne!(a, b);
        assert_eq!(clusters.get_communities().len(), 2);
    }

    #[test]
    fn test_fixed_nodes_only_bind_at_finest_level() {
        // 3 and 4 can't move during level 0, but 0/1/2 and 5/6/7 still move onto
        // them, so they end up in their clique's community rather than isolated.
        let g = two_cliques_bridged();
        let mut fixed = HashSet::new();
        fixed.insert(3usize);
        fixed.insert(4usize);
        let options = Options {
            random_seed: 1,
            ..Options::default()
        };
        let clusters = detect_clusters(&g, &options, &fixed).unwrap();
        assert_eq!(clusters.get_class(&3), clusters.get_class(&0));
        assert_eq!(clusters.get_class(&4), clusters.get_class(&5));
        assert_ne!(clusters.get_class(&3), clusters.get_class(&4));
    }

    #[test]
    fn test_determinism_same_seed_same_result() {
        let g = two_cliques_bridged();
        let options = Options {
            random_seed: 7,
            ..Options::default()
        };
        let c1 = detect_clusters(&g, &options, &HashSet::new()).unwrap();
        let c2 = detect_clusters(&g, &options, &HashSet::new()).unwrap();
        for i in 0..8 {
            assert_eq!(c1.get_class(&i), c2.get_class(&i));
        }
        assert_eq!(c1.quality(), c2.quality());
    }

    #[test]
    fn test_round_trip_evaluate_quality_matches() {
        use crate::evaluate::{evaluate_quality, CommunityLabel};

        let g = two_cliques_bridged();
        let options = Options {
            random_seed: 1,
            ..Options::default()
        };
        let clusters = detect_clusters(&g, &options, &HashSet::new()).unwrap();
        let mut membership = HashMap::new();
        for i in 0..8usize {
            membership.insert(i, CommunityLabel::Int(clusters.get_class(&i).unwrap() as i64));
        }
        let evaluated = evaluate_quality(
            &g,
            &membership,
            true,
            options.directed,
            options.quality,
            options.resolution,
            options.cpm_mode,
        )
        .unwrap();
        assert!((evaluated - clusters.quality()).abs() < 1e-9);
    }
}

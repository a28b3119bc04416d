use crate::weighted_graph::InputEdge;
use crate::{Partition, WeightedGraph};
use std::collections::HashMap;
use std::hash::Hash;

/**
Coarsens graph `G` under partition `P` (§4.6): each community becomes one node of
the next level's graph, sized by its `totalSize`, and every edge of `G` is folded
into an aggregated edge between its endpoints' communities (self-loops included,
when both endpoints land in the same community).

Emission order of the aggregated edges is the iteration order of a `HashMap`, which
is fine here: `WeightedGraph::build` only cares about the summed weight per
`(source, target)` pair, not the order edges arrive in, so this doesn't affect
determinism of the coarsened graph itself.
*/
pub fn coarsen<T>(graph: &WeightedGraph<T>, partition: &Partition) -> WeightedGraph<usize>
where
    T: Hash + Eq + Clone,
{
    let q = partition.community_count();
    let node_order: Vec<usize> = (0..q).collect();

    let mut sizes = HashMap::with_capacity(q);
    for c in 0..q {
        sizes.insert(c, partition.total_size(c));
    }

    let mut agg: HashMap<(usize, usize), f64> = HashMap::new();
    for i in 0..graph.number_of_nodes() {
        let ci = partition.node_community(i);
        for (j, w) in graph.out_neighbors(i) {
            let cj = partition.node_community(j);
            *agg.entry((ci, cj)).or_insert(0.0) += w;
        }
        let loop_w = graph.self_loop(i);
        if loop_w != 0.0 {
            *agg.entry((ci, ci)).or_insert(0.0) += loop_w;
        }
    }

    let edges: Vec<InputEdge<usize>> = agg
        .into_iter()
        .map(|((s, t), w)| InputEdge::new(s, t, w))
        .collect();

    WeightedGraph::build(Some(node_order), &edges, &sizes, graph.directed)
        .expect("coarsened graph always references only its own community ids")
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::weighted_graph::InputEdge as InEdge;
    use assert_approx_eq::assert_approx_eq;
    use std::collections::HashMap as HMap;

    #[test]
    fn test_coarsen_merges_internal_edges_into_self_loop() {
        let edges = vec![
            InEdge::new(0usize, 1, 1.0),
            InEdge::new(1, 2, 1.0),
            InEdge::new(2, 0, 1.0),
            InEdge::new(2, 3, 0.5),
        ];
        let g = WeightedGraph::build(Some((0..4).collect()), &edges, &HMap::new(), false).unwrap();
        let p = Partition::rebuild(&g, vec![0, 0, 0, 1], 2);
        let coarsened = coarsen(&g, &p);
        assert_eq!(coarsened.number_of_nodes(), 2);
        assert_approx_eq!(coarsened.self_loop(0), 6.0);
        assert_approx_eq!(coarsened.size(0), 3.0);
        assert_approx_eq!(coarsened.size(1), 1.0);
        let cross: f64 = coarsened.out_neighbors(0).map(|(_, w)| w).sum();
        assert_approx_eq!(cross, 0.5);
    }
}

use crate::local_move::{run_local_move_loop, CandidateStrategy, LocalMoveOptions, Objective};
use crate::{Partition, WeightedGraph};
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::hash::Hash;

/**
Leiden refinement (§4.5): breaks overly-merged communities found by the local-move
loop into one or more sub-communities, constrained to never cross the boundary the
local-move pass already drew.

Starts from a fresh singleton partition on the same graph, records each node's macro
community from `coarse`, and runs the local-move loop again with candidates filtered
to refinement communities founded inside the same macro community as the node being
moved. Never creates new singleton slots (`allow_new_community` is forced `false`):
a refinement community's founder already has a macro id, so there's nowhere outside
`coarse`'s partition for a node to go.
*/
#[allow(clippy::too_many_arguments)]
pub fn refine<T>(
    coarse: &Partition,
    graph: &WeightedGraph<T>,
    objective: Objective,
    candidate_strategy: CandidateStrategy,
    max_community_size: Option<f64>,
    max_local_passes: usize,
    fixed_nodes: &HashSet<usize>,
    rng: &mut StdRng,
) -> Partition
where
    T: Hash + Eq + Clone,
{
    let n = graph.number_of_nodes();
    let macro_of: Vec<usize> = (0..n).map(|i| coarse.node_community(i)).collect();
    // Refinement communities start as singletons, so founder node i's refinement
    // community id is i itself: comm_macro[c] == macro_of[c] at this point.
    let comm_macro = macro_of.clone();

    let mut refined = Partition::singletons(graph);
    let options = LocalMoveOptions {
        candidate_strategy,
        allow_new_community: false,
        max_community_size,
        max_local_passes,
    };

    run_local_move_loop(
        &mut refined,
        graph,
        objective,
        &options,
        fixed_nodes,
        |v, c| comm_macro[c] == macro_of[v],
        rng,
    );
    refined
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::weighted_graph::InputEdge;
    use rand::SeedableRng;
    use std::collections::HashMap;

    #[test]
    fn test_refine_never_crosses_macro_boundary() {
        // Two disconnected triangles, already merged by a (pretend) coarse pass into
        // one macro community each; refinement must not move nodes between them.
        let edges = vec![
            InputEdge::new(0usize, 1, 1.0),
            InputEdge::new(1, 2, 1.0),
            InputEdge::new(2, 0, 1.0),
            InputEdge::new(3, 4, 1.0),
            InputEdge::new(4, 5, 1.0),
            InputEdge::new(5, 3, 1.0),
        ];
        let g = WeightedGraph::build(Some((0..6).collect()), &edges, &HashMap::new(), false).unwrap();
        let coarse = Partition::rebuild(&g, vec![0, 0, 0, 1, 1, 1], 2);
        let mut rng = StdRng::seed_from_u64(7);
        let refined = refine(
            &coarse,
            &g,
            Objective::Modularity,
            CandidateStrategy::Neighbors,
            None,
            20,
            &HashSet::new(),
            &mut rng,
        );
        for &v in &[0, 1, 2] {
            assert!([0, 1, 2].contains(&refined.node_community(v)));
        }
        for &v in &[3, 4, 5] {
            assert!([3, 4, 5].contains(&refined.node_community(v)));
        }
    }
}

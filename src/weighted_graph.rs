use crate::Error;
use std::collections::HashMap;
use std::hash::Hash;

/// A raw edge as supplied by a caller, before indexing or symmetrization.
#[derive(Debug, Clone)]
pub struct InputEdge<T> {
    pub source: T,
    pub target: T,
    pub weight: f64,
}

impl<T> InputEdge<T> {
    pub fn new(source: T, target: T, weight: f64) -> InputEdge<T> {
        InputEdge {
            source,
            target,
            weight,
        }
    }
}

/**
Dense-indexed, symmetrized, weighted adjacency over a set of node identifiers.

This is the one place node identities of type `T` are resolved to `0..N` indices;
every downstream component ([Partition](crate::Partition), the local-move loop, the
coarsener) operates purely on `usize` indices. Node identities round-trip through
[`index_to_id`](WeightedGraph::index_to_id).

Construction performs the undirected symmetrization described for `directed: false`
graphs: each unordered pair `{a, b}` is stored once per side with weight equal to the
*average* of whatever directions the caller supplied, not the sum — this keeps total
weight the same whether the caller gave one direction or both.
*/
#[derive(Debug, Clone)]
pub struct WeightedGraph<T> {
    pub directed: bool,
    index_to_id: Vec<T>,
    id_to_index: HashMap<T, usize>,
    size: Vec<f64>,
    self_loop: Vec<f64>,
    k_out: Vec<f64>,
    k_in: Vec<f64>,
    out_adj: Vec<Vec<(usize, f64)>>,
    in_adj: Vec<Vec<(usize, f64)>>,
    total_weight: f64,
}

impl<T> WeightedGraph<T>
where
    T: Hash + Eq + Clone,
{
    /// Builds a graph over exactly `node_order`, failing if any edge references a node
    /// outside that set. Pass `None` to derive the node set from the edges themselves,
    /// in first-seen order.
    pub fn build(
        node_order: Option<Vec<T>>,
        edges: &[InputEdge<T>],
        sizes: &HashMap<T, f64>,
        directed: bool,
    ) -> Result<WeightedGraph<T>, Error> {
        let index_to_id = match node_order {
            Some(order) => order,
            None => {
                let mut seen = HashMap::new();
                let mut order = Vec::new();
                for e in edges {
                    for id in [&e.source, &e.target] {
                        if !seen.contains_key(id) {
                            seen.insert(id.clone(), ());
                            order.push(id.clone());
                        }
                    }
                }
                order
            }
        };
        let id_to_index: HashMap<T, usize> = index_to_id
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, id)| (id, i))
            .collect();
        let n = index_to_id.len();
        for e in edges {
            if !id_to_index.contains_key(&e.source) || !id_to_index.contains_key(&e.target) {
                return Err(Error::input(
                    "edge references a node id not present in the graph's node set",
                ));
            }
        }

        let size: Vec<f64> = index_to_id
            .iter()
            .map(|id| *sizes.get(id).unwrap_or(&1.0))
            .collect();
        let mut self_loop = vec![0.0; n];
        let mut k_out = vec![0.0; n];
        let mut k_in = vec![0.0; n];
        let mut out_adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut in_adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];

        if directed {
            for e in edges {
                let u = id_to_index[&e.source];
                let v = id_to_index[&e.target];
                if u == v {
                    self_loop[u] += e.weight;
                    k_out[u] += e.weight;
                    k_in[u] += e.weight;
                    out_adj[u].push((u, e.weight));
                    in_adj[u].push((u, e.weight));
                } else {
                    k_out[u] += e.weight;
                    k_in[v] += e.weight;
                    out_adj[u].push((v, e.weight));
                    in_adj[v].push((u, e.weight));
                }
            }
        } else {
            #[derive(Default)]
            struct Pair {
                sum: f64,
                seen_fwd: bool,
                seen_bwd: bool,
            }
            let mut pairs: HashMap<(usize, usize), Pair> = HashMap::new();
            for e in edges {
                let u = id_to_index[&e.source];
                let v = id_to_index[&e.target];
                if u == v {
                    self_loop[u] += e.weight;
                    continue;
                }
                let (lo, hi, fwd) = if u < v { (u, v, true) } else { (v, u, false) };
                let pair = pairs.entry((lo, hi)).or_default();
                pair.sum += e.weight;
                if fwd {
                    pair.seen_fwd = true;
                } else {
                    pair.seen_bwd = true;
                }
            }
            for ((lo, hi), pair) in pairs {
                let denom = (pair.seen_fwd as u8 + pair.seen_bwd as u8).max(1) as f64;
                let w = pair.sum / denom;
                out_adj[lo].push((hi, w));
                out_adj[hi].push((lo, w));
                k_out[lo] += w;
                k_out[hi] += w;
            }
            for i in 0..n {
                if self_loop[i] != 0.0 {
                    out_adj[i].push((i, self_loop[i]));
                    k_out[i] += self_loop[i];
                }
            }
            k_in = k_out.clone();
            in_adj = out_adj.clone();
        }

        // Aggregation above goes through HashMaps, whose iteration order varies
        // across runs; sort each adjacency row by target index so neighbor order
        // (and anything downstream that depends on it, like RNG consumption during
        // candidate enumeration) is reproducible for a given seed.
        for adj in out_adj.iter_mut() {
            adj.sort_by_key(|&(j, _)| j);
        }
        for adj in in_adj.iter_mut() {
            adj.sort_by_key(|&(j, _)| j);
        }

        let total_weight = k_out.iter().sum();

        Ok(WeightedGraph {
            directed,
            index_to_id,
            id_to_index,
            size,
            self_loop,
            k_out,
            k_in,
            out_adj,
            in_adj,
            total_weight,
        })
    }

    pub fn number_of_nodes(&self) -> usize {
        self.index_to_id.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn index_to_id(&self) -> &[T] {
        &self.index_to_id
    }

    pub fn id_of(&self, id: &T) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    pub fn size(&self, i: usize) -> f64 {
        self.size[i]
    }

    pub fn self_loop(&self, i: usize) -> f64 {
        self.self_loop[i]
    }

    pub fn k_out(&self, i: usize) -> f64 {
        self.k_out[i]
    }

    pub fn k_in(&self, i: usize) -> f64 {
        self.k_in[i]
    }

    /// Outgoing neighbors, excluding the self-loop (tracked separately via [`self_loop`](Self::self_loop)).
    pub fn out_neighbors(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.out_adj[i]
            .iter()
            .copied()
            .filter(move |(j, _)| *j != i)
    }

    /// Incoming neighbors, excluding the self-loop. Equal to `out_neighbors` when undirected.
    pub fn in_neighbors(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.in_adj[i].iter().copied().filter(move |(j, _)| *j != i)
    }

    /// Rebuilds this graph with its existing dense indices used directly as node ids.
    /// The outer driver uses this to get a `WeightedGraph<usize>` at every level
    /// (including the caller-supplied finest one, whose node ids may be arbitrary
    /// `T`), so the multi-level loop doesn't need to be generic over `T` itself.
    pub fn to_usize_graph(&self) -> WeightedGraph<usize> {
        let n = self.number_of_nodes();
        let mut edges = Vec::new();
        for i in 0..n {
            for (j, w) in self.out_neighbors(i) {
                edges.push(InputEdge::new(i, j, w));
            }
            if self.self_loop[i] != 0.0 {
                edges.push(InputEdge::new(i, i, self.self_loop[i]));
            }
        }
        let sizes: HashMap<usize, f64> = (0..n).map(|i| (i, self.size[i])).collect();
        WeightedGraph::build(Some((0..n).collect()), &edges, &sizes, self.directed)
            .expect("reindexing a graph by its own dense ids never references a foreign id")
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_undirected_average_when_both_directions_given() {
        let edges = vec![
            InputEdge::new("a", "b", 2.0),
            InputEdge::new("b", "a", 4.0),
        ];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let a = g.id_of(&"a").unwrap();
        let b = g.id_of(&"b").unwrap();
        let w: Vec<f64> = g.out_neighbors(a).map(|(_, w)| w).collect();
        assert_eq!(w, vec![3.0]);
        assert_approx_eq!(g.k_out(a), 3.0);
        assert_approx_eq!(g.k_out(b), 3.0);
        assert_approx_eq!(g.total_weight(), 6.0);
    }

    #[test]
    fn test_undirected_single_direction_not_halved() {
        let edges = vec![InputEdge::new("a", "b", 5.0)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let a = g.id_of(&"a").unwrap();
        assert_approx_eq!(g.k_out(a), 5.0);
    }

    #[test]
    fn test_self_loop_counted_once() {
        let edges = vec![InputEdge::new("a", "a", 5.0), InputEdge::new("a", "b", 0.1)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let a = g.id_of(&"a").unwrap();
        assert_approx_eq!(g.self_loop(a), 5.0);
        assert_approx_eq!(g.k_out(a), 5.1);
        let neighbors: Vec<(usize, f64)> = g.out_neighbors(a).collect();
        assert_eq!(neighbors.len(), 1);
    }

    #[test]
    fn test_directed_self_loop_both_adjacency_lists() {
        let edges = vec![InputEdge::new("a", "a", 3.0), InputEdge::new("a", "b", 1.0)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), true).unwrap();
        let a = g.id_of(&"a").unwrap();
        assert_approx_eq!(g.k_out(a), 4.0);
        assert_approx_eq!(g.k_in(a), 3.0);
    }

    #[test]
    fn test_missing_node_in_supplied_order_fails() {
        let edges = vec![InputEdge::new("a", "b", 1.0)];
        let result = WeightedGraph::build(Some(vec!["a"]), &edges, &HashMap::new(), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_node_sizes_default_to_one() {
        let edges = vec![InputEdge::new("a", "b", 1.0)];
        let mut sizes = HashMap::new();
        sizes.insert("a", 3.0);
        let g = WeightedGraph::build(None, &edges, &sizes, false).unwrap();
        let a = g.id_of(&"a").unwrap();
        let b = g.id_of(&"b").unwrap();
        assert_approx_eq!(g.size(a), 3.0);
        assert_approx_eq!(g.size(b), 1.0);
    }

    #[test]
    fn test_to_usize_graph_preserves_weights_and_directedness() {
        let edges = vec![InputEdge::new("a", "b", 2.0), InputEdge::new("b", "a", 4.0)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let reindexed = g.to_usize_graph();
        assert_eq!(reindexed.number_of_nodes(), 2);
        assert!(!reindexed.directed);
        assert_approx_eq!(reindexed.total_weight(), g.total_weight());
    }
}

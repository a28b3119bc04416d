use crate::weighted_graph::InputEdge;
use crate::Error;
use std::collections::HashMap;
use std::hash::Hash;

/// One layer of a multilayer input graph: a weighted edge list over a shared
/// node-id set, plus this layer's overall weight and a per-link weight function.
pub struct Layer<T> {
    pub edges: Vec<InputEdge<T>>,
    pub weight: f64,
}

impl<T> Layer<T> {
    pub fn new(edges: Vec<InputEdge<T>>, weight: f64) -> Layer<T> {
        Layer { edges, weight }
    }
}

/**
Aggregates a non-empty slice of layers into one edge list (§4.8): every layer must
reference the identical node-id set, which is validated against `node_order` rather
than inferred, since an empty layer's edge list alone can't reveal its nodes.
Aggregated weight for (source, target) is `Σ_layer layer.weight * link_weight(link)`;
edges whose aggregated weight is exactly 0.0 are dropped before adaptation. A single
layer bypasses aggregation (its edges pass through, scaled by its own weight).
*/
pub fn aggregate_layers<T>(
    layers: &[Layer<T>],
    node_order: &[T],
    link_weight: impl Fn(&InputEdge<T>) -> f64,
) -> Result<Vec<InputEdge<T>>, Error>
where
    T: Hash + Eq + Clone,
{
    if layers.is_empty() {
        return Err(Error::input("multilayer input requires at least one layer"));
    }

    let node_set: std::collections::HashSet<&T> = node_order.iter().collect();
    for layer in layers {
        for e in &layer.edges {
            if !node_set.contains(&e.source) || !node_set.contains(&e.target) {
                return Err(Error::input(
                    "layer references a node id outside the shared node set",
                ));
            }
        }
    }

    let mut agg: HashMap<(T, T), f64> = HashMap::new();
    for layer in layers {
        for e in &layer.edges {
            let w = layer.weight * link_weight(e);
            *agg.entry((e.source.clone(), e.target.clone())).or_insert(0.0) += w;
        }
    }

    Ok(agg
        .into_iter()
        .filter(|(_, w)| *w != 0.0)
        .map(|((s, t), w)| InputEdge::new(s, t, w))
        .collect())
}

use crate::quality::{quality, CpmMode, QualityFunction};
use crate::{Error, Partition, WeightedGraph};
use std::collections::HashMap;
use std::hash::Hash;

/// A community label as supplied by an external caller: either already numeric, or
/// a string that needs deterministic hashing into a numeric id (§4.9).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommunityLabel {
    Int(i64),
    Str(String),
}

/// FNV-1a, 32-bit, matching the hash the spec requires for non-numeric community
/// labels; widened to `u64` only so it shares a type with `CommunityLabel::Int`.
fn fnv1a_32(s: &str) -> u64 {
    const OFFSET_BASIS: u32 = 0x811c9dc5;
    const PRIME: u32 = 0x01000193;
    let mut hash = OFFSET_BASIS;
    for byte in s.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash as u64
}

fn label_key(label: &CommunityLabel) -> u64 {
    match label {
        CommunityLabel::Int(n) => *n as u64,
        CommunityLabel::Str(s) => fnv1a_32(s),
    }
}

/**
Scores an externally supplied node -> community mapping against `graph` (§4.9),
without going through the local-move loop at all. Builds per-community aggregates
with one O(N+E) edge scan identical in shape to [`Partition::rebuild`], so this and
[`Partition`]'s own `quality()` agree bit-for-bit on the same membership.

In strict mode a node missing from `membership` fails with `MissingMembership`;
otherwise it's assigned its own singleton community, keyed past every id the hash
step already produced so it can't collide with a supplied label.
*/
#[allow(clippy::too_many_arguments)]
pub fn evaluate_quality<T>(
    graph: &WeightedGraph<T>,
    membership: &HashMap<T, CommunityLabel>,
    strict: bool,
    directed: bool,
    quality_function: QualityFunction,
    resolution: f64,
    cpm_mode: CpmMode,
) -> Result<f64, Error>
where
    T: Hash + Eq + Clone,
{
    let n = graph.number_of_nodes();
    let mut key_to_dense: HashMap<u64, usize> = HashMap::new();
    let mut node_community = vec![0usize; n];

    for (i, id) in graph.index_to_id().iter().enumerate() {
        match membership.get(id) {
            Some(label) => {
                let key = label_key(label);
                let next = key_to_dense.len();
                let c = *key_to_dense.entry(key).or_insert(next);
                node_community[i] = c;
            }
            None => {
                if strict {
                    return Err(Error::missing_membership(
                        "node has no entry in the supplied membership map",
                    ));
                }
                let c = key_to_dense.len() + i;
                node_community[i] = c;
            }
        }
    }

    // Renumber into a dense 0..count range (singleton fallback ids use `i` directly,
    // which can exceed `key_to_dense.len()` but never collides with it).
    let mut compact: HashMap<usize, usize> = HashMap::new();
    for c in node_community.iter_mut() {
        let next = compact.len();
        *c = *compact.entry(*c).or_insert(next);
    }
    let community_count = compact.len();

    let partition = Partition::rebuild(graph, node_community, community_count);
    Ok(quality(&partition, directed, quality_function, resolution, cpm_mode))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::weighted_graph::InputEdge;

    #[test]
    fn test_evaluate_matches_partition_quality() {
        let edges = vec![
            InputEdge::new(0usize, 1, 1.0),
            InputEdge::new(1, 2, 1.0),
            InputEdge::new(2, 0, 1.0),
        ];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let mut membership = HashMap::new();
        membership.insert(0usize, CommunityLabel::Int(0));
        membership.insert(1usize, CommunityLabel::Int(0));
        membership.insert(2usize, CommunityLabel::Int(0));
        let q = evaluate_quality(
            &g,
            &membership,
            true,
            false,
            QualityFunction::Modularity,
            1.0,
            CpmMode::Unit,
        )
        .unwrap();
        let p = Partition::rebuild(&g, vec![0, 0, 0], 1);
        let expected = quality(&p, false, QualityFunction::Modularity, 1.0, CpmMode::Unit);
        assert_eq!(q, expected);
    }

    #[test]
    fn test_strict_mode_missing_membership_errors() {
        let edges = vec![InputEdge::new(0usize, 1, 1.0)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let membership = HashMap::new();
        let result = evaluate_quality(
            &g,
            &membership,
            true,
            false,
            QualityFunction::Modularity,
            1.0,
            CpmMode::Unit,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_non_strict_missing_membership_gets_singleton() {
        let edges = vec![InputEdge::new(0usize, 1, 1.0)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let membership = HashMap::new();
        let q = evaluate_quality(
            &g,
            &membership,
            false,
            false,
            QualityFunction::Modularity,
            1.0,
            CpmMode::Unit,
        )
        .unwrap();
        assert!(q.is_finite());
    }

    #[test]
    fn test_string_labels_hash_deterministically() {
        let edges = vec![InputEdge::new(0usize, 1, 1.0)];
        let g = WeightedGraph::build(None, &edges, &HashMap::new(), false).unwrap();
        let mut membership = HashMap::new();
        membership.insert(0usize, CommunityLabel::Str("red".to_string()));
        membership.insert(1usize, CommunityLabel::Str("red".to_string()));
        let q1 = evaluate_quality(
            &g,
            &membership,
            true,
            false,
            QualityFunction::Modularity,
            1.0,
            CpmMode::Unit,
        )
        .unwrap();
        let q2 = evaluate_quality(
            &g,
            &membership,
            true,
            false,
            QualityFunction::Modularity,
            1.0,
            CpmMode::Unit,
        )
        .unwrap();
        assert_eq!(q1, q2);
    }
}

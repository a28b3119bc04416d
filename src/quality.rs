use crate::Partition;
use serde::{Deserialize, Serialize};

/// The objective the local-move loop optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityFunction {
    Modularity,
    Cpm,
}

/// Reporting-only selector for how `quality()` scores a CPM partition; doesn't affect
/// which moves the local-move loop makes (that's governed by `delta_cpm` directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpmMode {
    Unit,
    SizeAware,
}

/// Undirected modularity: Σ_c [ L_c/m2 − (D_c/m2)² ].
pub fn undirected_modularity(partition: &Partition) -> f64 {
    let m2 = (0..partition.community_count())
        .map(|c| partition.total_strength(c))
        .sum::<f64>();
    if m2 == 0.0 {
        return 0.0;
    }
    (0..partition.community_count())
        .map(|c| {
            let l_c = partition.internal_edge_weight(c);
            let d_c = partition.total_strength(c);
            l_c / m2 - (d_c / m2).powi(2)
        })
        .sum()
}

/// Directed (Leicht–Newman) modularity: Σ_c [ L_c/m − (F_c·T_c)/m² ].
pub fn directed_modularity(partition: &Partition) -> f64 {
    let m = (0..partition.community_count())
        .map(|c| partition.total_out_strength(c))
        .sum::<f64>();
    if m == 0.0 {
        return 0.0;
    }
    (0..partition.community_count())
        .map(|c| {
            let l_c = partition.internal_edge_weight(c);
            let f_c = partition.total_out_strength(c);
            let t_c = partition.total_in_strength(c);
            l_c / m - (f_c * t_c) / (m * m)
        })
        .sum()
}

/// CPM (unit): Σ_c [ L_c − γ·n_c(n_c−1)/2 ].
pub fn cpm_unit(partition: &Partition, resolution: f64) -> f64 {
    (0..partition.community_count())
        .map(|c| {
            let n_c = partition.node_count(c) as f64;
            partition.internal_edge_weight(c) - resolution * n_c * (n_c - 1.0) / 2.0
        })
        .sum()
}

/// CPM (size-aware): Σ_c [ L_c − γ·S_c(S_c−1)/2 ].
pub fn cpm_size_aware(partition: &Partition, resolution: f64) -> f64 {
    (0..partition.community_count())
        .map(|c| {
            let s_c = partition.total_size(c);
            partition.internal_edge_weight(c) - resolution * s_c * (s_c - 1.0) / 2.0
        })
        .sum()
}

/// Dispatches to the right formula for reporting a partition's global quality.
pub fn quality(
    partition: &Partition,
    directed: bool,
    quality_function: QualityFunction,
    resolution: f64,
    cpm_mode: CpmMode,
) -> f64 {
    match quality_function {
        QualityFunction::Modularity => {
            if directed {
                directed_modularity(partition)
            } else {
                undirected_modularity(partition)
            }
        }
        QualityFunction::Cpm => match cpm_mode {
            CpmMode::Unit => cpm_unit(partition, resolution),
            CpmMode::SizeAware => cpm_size_aware(partition, resolution),
        },
    }
}

/*!
A community-detection engine for weighted graphs: Louvain multi-level coarsening
with an optional Leiden refinement pass, over undirected or directed modularity and
the Constant Potts Model, plus multilayer edge-weight aggregation and an evaluator
for externally supplied memberships.

The [`weighted_graph`] module builds the dense-indexed adjacency every other
component reads; [`partition`] maintains per-community aggregates and the scratch
state the [`local_move`] loop uses to evaluate quality deltas in O(degree);
[`refine`] and [`coarsen`] implement one level's Leiden pass and graph contraction;
[`driver`] runs the whole multi-level loop behind [`detect_clusters`].
*/

mod coarsen;
mod driver;
mod error;
pub mod evaluate;
pub mod io;
mod local_move;
mod multilayer;
mod partition;
pub mod quality;
mod refine;
pub mod weighted_graph;

pub use driver::{detect_clusters, Clusters, Options, PreserveLabels};
pub use error::{Error, ErrorKind};
pub use local_move::{CandidateStrategy, LocalMoveOptions, Objective};
pub use multilayer::{aggregate_layers, Layer};
pub use partition::{Partition, RenumberMode};
pub use quality::{CpmMode, QualityFunction};
pub use weighted_graph::WeightedGraph;

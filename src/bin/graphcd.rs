use clap::Parser;
use graphcd::evaluate::{evaluate_quality, CommunityLabel};
use graphcd::io::{csv, detect_input_format, dot, json, InputFormat};
use graphcd::weighted_graph::InputEdge;
use graphcd::{detect_clusters, CandidateStrategy, CpmMode, Options, PreserveLabels, QualityFunction, WeightedGraph};
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::io::Read;
use std::process::ExitCode;

/// Detects weighted-graph communities with Louvain coarsening and Leiden refinement.
#[derive(Parser, Debug)]
#[command(name = "graphcd")]
struct Args {
    /// Input path; reads stdin when omitted.
    #[arg(long = "in")]
    input: Option<String>,

    /// Input format override ("json" or "dot"); auto-detected otherwise.
    #[arg(long = "in-format")]
    in_format: Option<String>,

    /// Output format: "json" (default), "csv", or "dot".
    #[arg(long = "out-format", default_value = "json")]
    out_format: String,

    /// Emit only the membership map, dropping the `meta` block.
    #[arg(long)]
    membership_only: bool,

    /// Run evaluate_quality against an externally supplied membership instead of
    /// running detection. Value is a path to a JSON `{nodeId: communityId}` map.
    #[arg(long)]
    evaluate: Option<String>,

    /// Fail evaluate with MissingMembership instead of assigning singletons.
    #[arg(long)]
    strict: bool,

    #[arg(long, default_value = "modularity")]
    quality: String,

    #[arg(long, default_value_t = 1.0)]
    resolution: f64,

    #[arg(long)]
    directed: bool,

    #[arg(long, default_value_t = 42)]
    random_seed: u64,

    #[arg(long, default_value = "neighbors")]
    candidate_strategy: String,

    #[arg(long)]
    allow_new_community: bool,

    #[arg(long)]
    max_community_size: Option<f64>,

    #[arg(long, default_value_t = true)]
    refine: bool,

    #[arg(long, default_value = "unit")]
    cpm_mode: String,

    #[arg(long, default_value_t = 50)]
    max_levels: usize,

    #[arg(long, default_value_t = 20)]
    max_local_passes: usize,
}

impl TryFrom<&Args> for Options {
    type Error = graphcd::Error;

    fn try_from(args: &Args) -> Result<Options, graphcd::Error> {
        let quality = match args.quality.as_str() {
            "modularity" => QualityFunction::Modularity,
            "cpm" => QualityFunction::Cpm,
            other => return Err(graphcd::Error::unknown_option(format!("unknown --quality {other}"))),
        };
        let candidate_strategy = match args.candidate_strategy.as_str() {
            "neighbors" => CandidateStrategy::Neighbors,
            "all" => CandidateStrategy::All,
            "random" => CandidateStrategy::Random,
            "random-neighbor" => CandidateStrategy::RandomNeighbor,
            other => {
                return Err(graphcd::Error::unknown_option(format!(
                    "unknown --candidate-strategy {other}"
                )))
            }
        };
        let cpm_mode = match args.cpm_mode.as_str() {
            "unit" => CpmMode::Unit,
            "size-aware" => CpmMode::SizeAware,
            other => return Err(graphcd::Error::unknown_option(format!("unknown --cpm-mode {other}"))),
        };
        Ok(Options {
            quality,
            resolution: args.resolution,
            directed: args.directed,
            random_seed: args.random_seed,
            candidate_strategy,
            allow_new_community: args.allow_new_community,
            max_community_size: args.max_community_size,
            refine: args.refine,
            preserve_labels: PreserveLabels::False,
            max_levels: args.max_levels,
            max_local_passes: args.max_local_passes,
            cpm_mode,
        })
    }
}

const EXIT_OK: u8 = 0;
const EXIT_UNEXPECTED: u8 = 1;
const EXIT_UNKNOWN_IN_FORMAT: u8 = 2;
const EXIT_MISSING_MEMBERSHIP: u8 = 3;
const EXIT_UNKNOWN_OUT_FORMAT: u8 = 4;
const EXIT_DOT_UNAVAILABLE: u8 = 5;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let code = run(&args).unwrap_or_else(|code| code);
    ExitCode::from(code)
}

fn read_input(args: &Args) -> Result<String, u8> {
    match &args.input {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            eprintln!("error reading {path}: {e}");
            EXIT_UNEXPECTED
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).map_err(|e| {
                eprintln!("error reading stdin: {e}");
                EXIT_UNEXPECTED
            })?;
            Ok(buf)
        }
    }
}

fn run(args: &Args) -> Result<u8, u8> {
    let content = read_input(args)?;

    let format = match args.in_format.as_deref() {
        Some("json") => Some(InputFormat::Json),
        Some("dot") => Some(InputFormat::Dot),
        Some(other) => {
            eprintln!("unknown --in-format {other}");
            return Err(EXIT_UNKNOWN_IN_FORMAT);
        }
        None => detect_input_format(args.input.as_deref(), &content),
    };
    let format = match format {
        Some(f) => f,
        None => {
            eprintln!("could not detect input format");
            return Err(EXIT_UNKNOWN_IN_FORMAT);
        }
    };

    let (node_order, edges, directed_from_dot): (Option<Vec<String>>, Vec<InputEdge<String>>, Option<bool>) =
        match format {
            InputFormat::Json => {
                let (order, edges) = json::parse(&content).map_err(|e| {
                    eprintln!("{e}");
                    EXIT_UNEXPECTED
                })?;
                (order, edges, None)
            }
            InputFormat::Dot => {
                let (directed, edges) = dot::parse(&content).map_err(|e| {
                    eprintln!("{e}");
                    EXIT_UNEXPECTED
                })?;
                (None, edges, Some(directed))
            }
        };

    let mut options = Options::try_from(args).map_err(|e| {
        eprintln!("{e}");
        EXIT_UNEXPECTED
    })?;
    if let Some(directed) = directed_from_dot {
        options.directed = directed;
    }

    let graph = WeightedGraph::build(node_order, &edges, &HashMap::new(), options.directed).map_err(|e| {
        eprintln!("{e}");
        EXIT_UNEXPECTED
    })?;

    if let Some(membership_path) = &args.evaluate {
        return run_evaluate(&graph, membership_path, &options, args.strict);
    }

    let clusters = detect_clusters(&graph, &options, &HashSet::new()).map_err(|e| {
        eprintln!("{e}");
        EXIT_UNEXPECTED
    })?;

    match args.out_format.as_str() {
        "json" => {
            let value = if args.membership_only {
                clusters.to_json()["membership"].clone()
            } else {
                clusters.to_json()
            };
            println!("{}", json::write(&value));
        }
        "csv" => {
            let node_order: Vec<String> = graph.index_to_id().to_vec();
            let membership: Vec<usize> = node_order
                .iter()
                .map(|id| clusters.get_class(id).unwrap())
                .collect();
            print!("{}", csv::write(&node_order, &membership));
        }
        "dot" => {
            if options.directed && has_duplicate_directed_edges(&edges) {
                eprintln!("DOT output unavailable: directed multigraph input");
                return Err(EXIT_DOT_UNAVAILABLE);
            }
            let node_order: Vec<String> = graph.index_to_id().to_vec();
            let mut membership = HashMap::new();
            for id in &node_order {
                membership.insert(id.clone(), clusters.get_class(id).unwrap());
            }
            let edge_list: Vec<(String, String, f64)> = edges
                .into_iter()
                .map(|e| (e.source, e.target, e.weight))
                .collect();
            print!("{}", dot::write(options.directed, &node_order, &membership, &edge_list));
        }
        other => {
            eprintln!("unknown --out-format {other}");
            return Err(EXIT_UNKNOWN_OUT_FORMAT);
        }
    }
    Ok(EXIT_OK)
}

fn has_duplicate_directed_edges(edges: &[InputEdge<String>]) -> bool {
    let mut seen = HashSet::new();
    for e in edges {
        if !seen.insert((e.source.clone(), e.target.clone())) {
            return true;
        }
    }
    false
}

fn run_evaluate(
    graph: &WeightedGraph<String>,
    membership_path: &str,
    options: &Options,
    strict: bool,
) -> Result<u8, u8> {
    let content = std::fs::read_to_string(membership_path).map_err(|e| {
        eprintln!("error reading {membership_path}: {e}");
        EXIT_UNEXPECTED
    })?;
    let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&content).map_err(|e| {
        eprintln!("invalid membership JSON: {e}");
        EXIT_UNEXPECTED
    })?;
    let membership: HashMap<String, CommunityLabel> = raw
        .into_iter()
        .map(|(k, v)| {
            let label = match v {
                serde_json::Value::Number(n) if n.is_i64() => CommunityLabel::Int(n.as_i64().unwrap()),
                other => CommunityLabel::Str(other.to_string()),
            };
            (k, label)
        })
        .collect();

    match evaluate_quality(
        graph,
        &membership,
        strict,
        options.directed,
        options.quality,
        options.resolution,
        options.cpm_mode,
    ) {
        Ok(q) => {
            println!("{}", serde_json::json!({ "quality": q }));
            Ok(EXIT_OK)
        }
        Err(e) if e.kind == graphcd::ErrorKind::MissingMembership => {
            eprintln!("{e}");
            Err(EXIT_MISSING_MEMBERSHIP)
        }
        Err(e) => {
            eprintln!("{e}");
            Err(EXIT_UNEXPECTED)
        }
    }
}

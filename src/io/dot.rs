use crate::weighted_graph::InputEdge;
use crate::Error;
use std::collections::HashMap;

/**
A minimal DOT reader covering the subset this crate needs: `graph`/`digraph`,
optional `strict`, and a body of `a -- b [weight=...]` or `a -> b [weight=...]`
statements, one per line. Not a general DOT grammar — comments, subgraphs, and
multi-statement lines aren't supported; malformed input is an `InputError`.
*/
pub fn parse(content: &str) -> Result<(bool, Vec<InputEdge<String>>), Error> {
    let trimmed = content.trim_start();
    let lower = trimmed.to_ascii_lowercase();
    let lower = lower.strip_prefix("strict").map(str::trim_start).unwrap_or(&lower);
    let directed = if lower.starts_with("digraph") {
        true
    } else if lower.starts_with("graph") {
        false
    } else {
        return Err(Error::input("DOT input must start with graph/digraph"));
    };

    let op = if directed { "->" } else { "--" };
    let mut edges = Vec::new();
    for line in content.lines() {
        let line = line.trim().trim_end_matches(';');
        if !line.contains(op) {
            continue;
        }
        let (lhs, rest) = line.split_once(op).unwrap();
        let target_part = rest.split('[').next().unwrap_or(rest).trim();
        let source = lhs.trim().to_string();
        let target = target_part.trim().to_string();
        if source.is_empty() || target.is_empty() {
            return Err(Error::input("malformed DOT edge statement"));
        }
        let weight = rest
            .find("weight=")
            .map(|i| &rest[i + "weight=".len()..])
            .and_then(|s| s.split([',', ']']).next())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(1.0);
        edges.push(InputEdge::new(source, target, weight));
    }
    Ok((directed, edges))
}

/// Writes the original graph back out with a `community` attribute overlay, one
/// node per line followed by the edge statements, matching the style `parse` reads.
pub fn write(
    directed: bool,
    node_order: &[String],
    membership: &HashMap<String, usize>,
    edges: &[(String, String, f64)],
) -> String {
    let keyword = if directed { "digraph" } else { "graph" };
    let op = if directed { "->" } else { "--" };
    let mut out = format!("{keyword} {{\n");
    for id in node_order {
        let c = membership.get(id).copied().unwrap_or(0);
        out.push_str(&format!("  \"{id}\" [community={c}];\n"));
    }
    for (s, t, w) in edges {
        out.push_str(&format!("  \"{s}\" {op} \"{t}\" [weight={w}];\n"));
    }
    out.push_str("}\n");
    out
}

use crate::weighted_graph::InputEdge;
use crate::Error;
use serde::Deserialize;

/// One entry of the `[{source,target,weight?}]` JSON shape.
#[derive(Debug, Deserialize)]
struct RawEdge {
    source: String,
    target: String,
    #[serde(default = "default_weight")]
    weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
}

/// The `{nodes:[...], links:[...]}` JSON shape.
#[derive(Debug, Deserialize)]
struct NodesLinks {
    nodes: Vec<RawNode>,
    links: Vec<RawEdge>,
}

/// Parses either JSON shape the CLI accepts (§4.10): a bare edge array, or a
/// `{nodes, links}` object carrying an explicit node order.
pub fn parse(content: &str) -> Result<(Option<Vec<String>>, Vec<InputEdge<String>>), Error> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| Error::input(format!("invalid JSON: {e}")))?;

    if value.is_array() {
        let raw: Vec<RawEdge> = serde_json::from_value(value)
            .map_err(|e| Error::input(format!("invalid edge array: {e}")))?;
        let edges = raw
            .into_iter()
            .map(|e| InputEdge::new(e.source, e.target, e.weight))
            .collect();
        return Ok((None, edges));
    }

    let parsed: NodesLinks = serde_json::from_value(value)
        .map_err(|e| Error::input(format!("invalid {{nodes, links}} object: {e}")))?;
    let node_order = parsed.nodes.into_iter().map(|n| n.id).collect();
    let edges = parsed
        .links
        .into_iter()
        .map(|e| InputEdge::new(e.source, e.target, e.weight))
        .collect();
    Ok((Some(node_order), edges))
}

/// Serializes a `Clusters::to_json()` value as a pretty-printed string.
pub fn write(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).expect("serde_json::Value always serializes")
}

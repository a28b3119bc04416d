pub mod csv;
pub mod dot;
pub mod json;

/// Input formats the CLI can auto-detect, by extension then by content sniff
/// (§6/§4.10): `{`/`[` sniffs as JSON, `^(strict\s+)?(di)?graph\b` sniffs as DOT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Dot,
}

/// Output formats the CLI can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Dot,
}

/// Detects format from a file extension (`.json`, `.dot`/`.gv`), falling back to
/// sniffing the content's leading bytes.
pub fn detect_input_format(path: Option<&str>, content: &str) -> Option<InputFormat> {
    if let Some(path) = path {
        if path.ends_with(".json") {
            return Some(InputFormat::Json);
        }
        if path.ends_with(".dot") || path.ends_with(".gv") {
            return Some(InputFormat::Dot);
        }
    }
    sniff_input_format(content)
}

fn sniff_input_format(content: &str) -> Option<InputFormat> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(InputFormat::Json);
    }
    let lower = trimmed.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("strict")
        .map(str::trim_start)
        .unwrap_or(lower.as_str());
    for keyword in ["digraph", "graph"] {
        if let Some(after) = rest.strip_prefix(keyword) {
            if after.is_empty() || after.starts_with(char::is_whitespace) || after.starts_with('{') {
                return Some(InputFormat::Dot);
            }
        }
    }
    None
}

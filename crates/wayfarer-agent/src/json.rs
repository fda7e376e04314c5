use serde::de::DeserializeOwned;
use tracing::warn;

/// Cut the JSON payload out of generation output: fenced block first,
/// then the outermost `{...}` or `[...]` span, else the trimmed text.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    let object = trimmed.find('{').zip(trimmed.rfind('}'));
    let array = trimmed.find('[').zip(trimmed.rfind(']'));
    let span = match (object, array) {
        (Some(o), Some(a)) => Some(if a.0 < o.0 { a } else { o }),
        (o, a) => o.or(a),
    };
    match span {
        Some((start, end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse generation output into `T`, substituting `default` on any failure.
pub fn safe_parse<T: DeserializeOwned>(text: &str, default: T) -> T {
    try_parse(text).unwrap_or_else(|| {
        warn!(preview = %preview(text), "Unparseable generation output, using default");
        default
    })
}

/// Parse generation output into `T`, `None` on failure.
pub fn try_parse<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(extract_json(text)).ok()
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}

//! Markdown formatting for web search tool results.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Placeholder shown when a search returned no hits.
pub const NO_RESULTS: &str = "_No results found._";

/// A single search hit as returned by the search tool.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "link", alias = "source")]
    pub url: Option<String>,
    #[serde(default, alias = "snippet")]
    pub content: Option<String>,
}

impl SearchHit {
    fn display_title(&self) -> &str {
        non_empty(self.title.as_deref())
            .or_else(|| non_empty(self.url.as_deref()))
            .unwrap_or("Untitled")
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Turn a structured search response into a markdown list.
///
/// Accepts a bare array of hits, an object with a `results` array, or a
/// JSON-encoded string of either. Anything else is dumped literally; this
/// function never fails.
pub fn format_search_result(result: &Value) -> String {
    match parse_hits(result) {
        Some(hits) => format_hits(&hits),
        None => {
            warn!("Search result has an unexpected shape, rendering it verbatim");
            literal_dump(result)
        }
    }
}

/// Format an already-parsed list of hits.
pub fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| format_hit(i + 1, hit))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_hit(number: usize, hit: &SearchHit) -> String {
    let title = hit.display_title();
    let mut out = match non_empty(hit.url.as_deref()) {
        Some(url) => format!("{}. **[{}]({})**", number, title, url),
        None => format!("{}. **{}**", number, title),
    };

    if let Some(snippet) = non_empty(hit.content.as_deref()) {
        // Keep multi-line snippets inside the list item.
        let snippet = snippet.lines().collect::<Vec<_>>().join(" ");
        out.push_str("\n   ");
        out.push_str(&snippet);
    }

    out
}

fn parse_hits(result: &Value) -> Option<Vec<SearchHit>> {
    match result {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) => serde_json::from_value(item.clone()).ok(),
                _ => None,
            })
            .collect(),
        Value::Object(map) => map.get("results").and_then(|r| match r {
            Value::Array(_) => parse_hits(r),
            _ => None,
        }),
        Value::String(s) => serde_json::from_str::<Value>(s)
            .ok()
            .filter(|v| !v.is_string())
            .and_then(|v| parse_hits(&v)),
        _ => None,
    }
}

fn literal_dump(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => {
            let pretty = serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string());
            format!("```json\n{}\n```", pretty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // =========================================================================
    // Well-formed input
    // =========================================================================

    #[test]
    fn test_formats_single_hit() {
        let result = json!([{"title": "X", "url": "https://x.com", "content": "Y"}]);
        assert_eq!(
            format_search_result(&result),
            "1. **[X](https://x.com)**\n   Y"
        );
    }

    #[test]
    fn test_hit_without_url() {
        let result = json!([{"title": "X", "snippet": "Y"}]);
        assert_eq!(format_search_result(&result), "1. **X**\n   Y");
    }

    #[test]
    fn test_numbering_and_separator() {
        let result = json!([
            {"title": "A", "url": "https://a.com", "content": "first"},
            {"title": "B", "url": "https://b.com", "content": "second"}
        ]);
        let md = format_search_result(&result);
        assert_eq!(
            md,
            "1. **[A](https://a.com)**\n   first\n\n2. **[B](https://b.com)**\n   second"
        );
    }

    #[test]
    fn test_results_object_shape() {
        let result = json!({
            "query": "capital of France",
            "results": [{"title": "Paris", "url": "https://p.fr", "content": "Capital."}]
        });
        assert_eq!(
            format_search_result(&result),
            "1. **[Paris](https://p.fr)**\n   Capital."
        );
    }

    #[test]
    fn test_json_encoded_string() {
        let result = Value::String(r#"[{"title":"T","link":"https://t.io"}]"#.to_string());
        assert_eq!(format_search_result(&result), "1. **[T](https://t.io)**");
    }

    #[test]
    fn test_title_falls_back_to_url() {
        let result = json!([{"url": "https://only-url.com"}]);
        assert_eq!(
            format_search_result(&result),
            "1. **[https://only-url.com](https://only-url.com)**"
        );
    }

    #[test]
    fn test_multiline_snippet_is_joined() {
        let result = json!([{"title": "T", "content": "line one\nline two"}]);
        assert_eq!(format_search_result(&result), "1. **T**\n   line one line two");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(format_search_result(&json!([])), NO_RESULTS);
        assert_eq!(format_search_result(&json!({"results": []})), NO_RESULTS);
    }

    #[test]
    fn test_is_deterministic() {
        let result = json!([
            {"title": "A", "url": "https://a.com", "content": "x"},
            {"title": "B", "url": "https://b.com", "content": "y"}
        ]);
        let first = format_search_result(&result);
        for _ in 0..10 {
            assert_eq!(format_search_result(&result), first);
        }
    }

    // =========================================================================
    // Malformed input degrades to a literal dump
    // =========================================================================

    #[test]
    fn test_plain_string_is_verbatim() {
        let result = Value::String("search failed: quota exceeded".to_string());
        assert_eq!(format_search_result(&result), "search failed: quota exceeded");
    }

    #[test]
    fn test_object_without_results_is_fenced_json() {
        let result = json!({"error": "boom"});
        let md = format_search_result(&result);
        assert!(md.starts_with("```json\n"));
        assert!(md.contains("\"error\": \"boom\""));
        assert!(md.ends_with("\n```"));
    }

    #[test]
    fn test_array_with_non_objects_is_dumped() {
        let result = json!(["a", 1]);
        let md = format_search_result(&result);
        assert!(md.starts_with("```json"));
    }

    #[test]
    fn test_number_is_dumped() {
        assert_eq!(format_search_result(&json!(42)), "```json\n42\n```");
    }
}

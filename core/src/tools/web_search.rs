use crate::markdown::decode_entities;
use crate::tools::{extract_string_arg, extract_usize_arg_opt, web_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_MAX_RESULTS: usize = 5;

/// Web search against the DuckDuckGo HTML endpoint. No API key required.
pub struct WebSearchTool {
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self {
            client: web_client(),
        }
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns result titles, snippets and URLs."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let query = extract_string_arg(&args, "query")?;
        let max_results = extract_usize_arg_opt(&args, "max_results", DEFAULT_MAX_RESULTS);

        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(&query)
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => return Ok(ToolResult::error(format!("Search request failed: {}", e))),
        };

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => return Ok(ToolResult::error(format!("Search request failed: {}", e))),
        };

        let results = extract_results(&html, max_results);

        if results.is_empty() {
            Ok(ToolResult::success(format!(
                "No results found for: {}",
                query
            )))
        } else {
            Ok(ToolResult::success(results.join("\n\n")))
        }
    }
}

/// Pulls titles, snippets and URLs out of the DuckDuckGo HTML result page.
fn extract_results(html: &str, max_results: usize) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html.split("class=\"result__body\"").skip(1) {
        if results.len() >= max_results {
            break;
        }

        let title = chunk
            .split("class=\"result__a\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .unwrap_or("");

        let snippet = chunk
            .split("class=\"result__snippet\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .unwrap_or("");

        let url = chunk
            .split("class=\"result__url\"")
            .nth(1)
            .and_then(|s| s.split('>').nth(1))
            .and_then(|s| s.split('<').next())
            .map(|s| s.trim())
            .unwrap_or("");

        if !title.is_empty() {
            results.push(format!(
                "**{}**\n{}\nURL: {}",
                decode_entities(title),
                decode_entities(snippet),
                url
            ));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <div class="result__body">
      <a rel="nofollow" class="result__a" href="https://one.example">First &amp; Best</a>
      <a class="result__snippet" href="https://one.example">Snippet one</a>
      <a class="result__url" href="https://one.example"> one.example </a>
    </div>
    <div class="result__body">
      <a rel="nofollow" class="result__a" href="https://two.example">Second</a>
      <a class="result__snippet" href="https://two.example">Snippet two</a>
      <a class="result__url" href="https://two.example"> two.example </a>
    </div>
    "#;

    #[test]
    fn extracts_title_snippet_and_url() {
        let results = extract_results(FIXTURE, 5);
        assert_eq!(results.len(), 2);
        assert!(results[0].contains("**First & Best**"));
        assert!(results[0].contains("Snippet one"));
        assert!(results[0].contains("URL: one.example"));
    }

    #[test]
    fn respects_max_results() {
        let results = extract_results(FIXTURE, 1);
        assert_eq!(results.len(), 1);
        assert!(results[0].contains("First"));
    }

    #[test]
    fn empty_page_yields_no_results() {
        assert!(extract_results("<html><body>nothing here</body></html>", 5).is_empty());
    }
}

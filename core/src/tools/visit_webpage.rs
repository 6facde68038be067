use crate::markdown::html_to_markdown;
use crate::tools::{extract_string_arg, web_client};
use crate::traits::{Tool, ToolResult};
use async_trait::async_trait;
use serde_json::json;

const FETCH_ERROR_PREFIX: &str = "Error fetching webpage:";
const GENERIC_ERROR_PREFIX: &str = "An error occurred:";
const MAX_CONTENT_CHARS: usize = 20_000;

/// Fetches a webpage and returns its content as markdown. Failures are
/// returned as descriptive strings, never raised: network-level problems
/// are prefixed `Error fetching webpage:`, anything that goes wrong during
/// conversion is prefixed `An error occurred:`.
pub struct VisitWebpageTool {
    client: reqwest::Client,
}

impl VisitWebpageTool {
    pub fn new() -> Self {
        Self {
            client: web_client(),
        }
    }

    pub async fn fetch(&self, url: &str) -> String {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return format!("{} {}", FETCH_ERROR_PREFIX, e),
        };

        if let Err(e) = response.error_for_status_ref() {
            return format!("{} {}", FETCH_ERROR_PREFIX, e);
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return format!("{} {}", FETCH_ERROR_PREFIX, e),
        };

        render_page(&bytes)
    }
}

impl Default for VisitWebpageTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes and converts a fetched body. Errors at this stage are not
/// network failures and get the generic prefix.
fn render_page(bytes: &[u8]) -> String {
    let html = match std::str::from_utf8(bytes) {
        Ok(html) => html,
        Err(e) => return format!("{} {}", GENERIC_ERROR_PREFIX, e),
    };

    truncate_content(html_to_markdown(html))
}

fn truncate_content(content: String) -> String {
    if content.chars().count() <= MAX_CONTENT_CHARS {
        return content;
    }
    let truncated: String = content.chars().take(MAX_CONTENT_CHARS).collect();
    format!("{}... [content truncated]", truncated)
}

#[async_trait]
impl Tool for VisitWebpageTool {
    fn name(&self) -> &str {
        "visit_webpage"
    }

    fn description(&self) -> &str {
        "Visit a webpage at a given URL and return its content as markdown."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL of the webpage to visit"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let url = extract_string_arg(&args, "url")?;
        let content = self.fetch(&url).await;

        if content.starts_with(FETCH_ERROR_PREFIX) || content.starts_with(GENERIC_ERROR_PREFIX) {
            Ok(ToolResult::error(content))
        } else {
            Ok(ToolResult::success(content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_html_converts_to_markdown() {
        let rendered = render_page(b"<h1>Title</h1><p>Para one.</p>");
        assert_eq!(rendered, "# Title\n\nPara one.");
    }

    #[test]
    fn invalid_utf8_gets_the_generic_prefix() {
        let rendered = render_page(&[0xff, 0xfe, 0x80]);
        assert!(rendered.starts_with(GENERIC_ERROR_PREFIX));
    }

    #[test]
    fn rendered_output_has_no_newline_runs() {
        let rendered = render_page(b"<p>A</p>\n\n\n\n<p>B</p>");
        assert_eq!(rendered, "A\n\nB");
        assert!(!rendered.contains("\n\n\n"));
    }

    #[test]
    fn long_content_is_truncated_with_a_marker() {
        let body = format!("<p>{}</p>", "x".repeat(MAX_CONTENT_CHARS + 100));
        let rendered = render_page(body.as_bytes());
        assert!(rendered.ends_with("[content truncated]"));
        assert!(rendered.chars().count() < MAX_CONTENT_CHARS + 100);
    }

    #[tokio::test]
    async fn unreachable_host_gets_the_fetch_prefix() {
        let tool = VisitWebpageTool::new();
        let content = tool
            .fetch("http://nonexistent.invalid./nothing-here")
            .await;
        assert!(content.starts_with(FETCH_ERROR_PREFIX), "got: {}", content);
    }
}
